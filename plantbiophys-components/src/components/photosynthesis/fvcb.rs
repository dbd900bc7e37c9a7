//! Farquhar, von Caemmerer and Berry (1980) C3 photosynthesis
//!
//! Net assimilation is the minimum of three limiting rates, minus the dark respiration:
//!
//! $$ A = \min(W_c, W_j, W_p) - R_d $$
//!
//! - $W_c$ is limited by the Rubisco activity,
//! - $W_j$ by the regeneration of RuBP through electron transport,
//! - $W_p$ by the export of triose phosphates (TPU).
//!
//! Every rate is given at a reference temperature and corrected to the leaf temperature
//! with Arrhenius functions (peaked for $V_{cmax}$ and $J_{max}$), following Medlyn et al.
//! (2002) and Bernacchi et al. (2001).
//!
//! [`FvcbRaw`] takes the intercellular CO2 as an input. [`Fvcb`] couples the rates with a
//! stomatal conductance model and solves the system analytically (Duursma, 2015).

use crate::components::stomatal_conductance::StomatalClosure;
use crate::model_list::ProcessModels;
use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{Process, ProcessModel, RequirementDefinition};
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::BiophysResult;
use plantbiophys_core::numerics::max_root;
use plantbiophys_core::standard_variables::{VAR_A, VAR_CI, VAR_CS, VAR_GS, VAR_PPFD, VAR_TL};
use plantbiophys_core::status::Status;
use plantbiophys_core::FloatValue;
use serde::{Deserialize, Serialize};

use super::stomatal_model;

/// Parameters of the FvCB model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FvcbParameters {
    /// Reference temperature of the rates
    /// unit: °C
    /// default: 25.0
    pub tr: FloatValue,

    /// Maximum rate of Rubisco activity at the reference temperature
    /// unit: umol m-2 s-1
    /// default: 200.0
    pub vcmax_ref: FloatValue,

    /// Potential rate of electron transport at the reference temperature
    /// unit: umol m-2 s-1
    /// default: 250.0
    pub jmax_ref: FloatValue,

    /// Dark respiration at the reference temperature
    /// unit: umol m-2 s-1
    /// default: 0.6
    pub rd_ref: FloatValue,

    /// Triose phosphate utilisation rate at the reference temperature
    ///
    /// The default is large enough that TPU never limits assimilation.
    /// unit: umol m-2 s-1
    /// default: 9999.0
    pub tpu_ref: FloatValue,

    /// Intercellular O2 concentration
    /// unit: mmol mol-1
    /// default: 210.0
    pub o2: FloatValue,

    /// Activation energy of the dark respiration
    /// unit: J mol-1
    /// default: 46390.0
    pub e_ar: FloatValue,

    /// Activation energy of Jmax
    /// unit: J mol-1
    /// default: 29680.0
    pub e_aj: FloatValue,

    /// Deactivation energy of Jmax
    /// unit: J mol-1
    /// default: 200000.0
    pub hd_j: FloatValue,

    /// Entropy term of Jmax
    /// unit: J mol-1 K-1
    /// default: 631.88
    pub delta_sj: FloatValue,

    /// Activation energy of Vcmax
    /// unit: J mol-1
    /// default: 58550.0
    pub e_av: FloatValue,

    /// Deactivation energy of Vcmax
    /// unit: J mol-1
    /// default: 200000.0
    pub hd_v: FloatValue,

    /// Entropy term of Vcmax
    /// unit: J mol-1 K-1
    /// default: 629.26
    pub delta_sv: FloatValue,

    /// Activation energy of TPU
    /// unit: J mol-1
    /// default: 53100.0
    pub e_ap: FloatValue,

    /// Quantum yield of electron transport
    /// unit: mol e- mol-1 photon
    /// default: 0.425
    pub alpha: FloatValue,

    /// Curvature of the light response of electron transport
    /// unit: -
    /// default: 0.7
    pub theta: FloatValue,
}

impl Default for FvcbParameters {
    fn default() -> Self {
        Self {
            tr: 25.0,
            vcmax_ref: 200.0,
            jmax_ref: 250.0,
            rd_ref: 0.6,
            tpu_ref: 9999.0,
            o2: 210.0,
            e_ar: 46390.0,
            e_aj: 29680.0,
            hd_j: 200000.0,
            delta_sj: 631.88,
            e_av: 58550.0,
            hd_v: 200000.0,
            delta_sv: 629.26,
            e_ap: 53100.0,
            alpha: 0.425,
            theta: 0.7,
        }
    }
}

/// Arrhenius temperature correction of a rate given at `tref_k`
///
/// Temperatures are in K.
pub fn arrhenius(
    a_ref: FloatValue,
    ea: FloatValue,
    tk: FloatValue,
    tref_k: FloatValue,
    r: FloatValue,
) -> FloatValue {
    a_ref * (ea * (tk - tref_k) / (r * tk * tref_k)).exp()
}

/// Arrhenius correction with a decline at high temperature (Medlyn et al., 2002)
///
/// Temperatures are in K.
pub fn arrhenius_peaked(
    a_ref: FloatValue,
    ea: FloatValue,
    tk: FloatValue,
    tref_k: FloatValue,
    hd: FloatValue,
    delta_s: FloatValue,
    r: FloatValue,
) -> FloatValue {
    let rise = arrhenius(a_ref, ea, tk, tref_k, r);
    rise * (1.0 + ((tref_k * delta_s - hd) / (r * tref_k)).exp())
        / (1.0 + ((tk * delta_s - hd) / (r * tk)).exp())
}

/// Rate of electron transport for an absorbed PPFD (non-rectangular hyperbola)
pub fn electron_transport(
    ppfd: FloatValue,
    jmax: FloatValue,
    alpha: FloatValue,
    theta: FloatValue,
) -> FloatValue {
    let light = alpha * ppfd;
    (light + jmax - ((light + jmax).powi(2) - 4.0 * theta * light * jmax).sqrt()) / (2.0 * theta)
}

/// FvCB rates corrected to a leaf temperature and light level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FvcbRates {
    /// CO2 compensation point without dark respiration (ppm)
    pub gamma_star: FloatValue,
    /// Effective Michaelis-Menten coefficient of Rubisco (ppm)
    pub km: FloatValue,
    pub vcmax: FloatValue,
    pub jmax: FloatValue,
    /// RuBP regeneration rate, `J / 4`
    pub vj: FloatValue,
    pub rd: FloatValue,
    pub tpu: FloatValue,
}

impl FvcbRates {
    /// Rubisco-limited rate
    pub fn wc(&self, ci: FloatValue) -> FloatValue {
        self.vcmax * (ci - self.gamma_star) / (ci + self.km)
    }

    /// Electron-transport-limited rate
    pub fn wj(&self, ci: FloatValue) -> FloatValue {
        self.vj * (ci - self.gamma_star) / (ci + 2.0 * self.gamma_star)
    }

    /// TPU-limited rate
    pub fn wp(&self) -> FloatValue {
        3.0 * self.tpu
    }

    /// Net assimilation for an intercellular CO2 concentration (umol m-2 s-1)
    pub fn net_assimilation(&self, ci: FloatValue) -> FloatValue {
        self.wc(ci).min(self.wj(ci)).min(self.wp()) - self.rd
    }

    /// Net assimilation when `Gs = g0 + closure * A` and `A = Gs (Cs - Ci)`
    ///
    /// Each limiting rate, written as a function of $C_i$, gives a quadratic once the
    /// conductance is substituted in. Its largest root is the operating $C_i$ for that
    /// limitation. A root outside of $(0, C_s]$ switches the limitation off.
    ///
    /// Only valid while the assimilation is positive and the conductance above its
    /// floor, see [`FvcbRates::operating_point`].
    pub fn coupled_assimilation(
        &self,
        cs: FloatValue,
        g0: FloatValue,
        closure: FloatValue,
    ) -> FloatValue {
        let m = closure;
        let rd = self.rd;
        let g_star = self.gamma_star;
        let km = self.km;
        let in_range = |ci: FloatValue| ci > 0.0 && ci <= cs;

        let cij = {
            let vj = self.vj;
            let a = g0 + m * (vj - rd);
            let b = (1.0 - cs * m) * (vj - rd) + g0 * (2.0 * g_star - cs)
                - m * (vj * g_star + 2.0 * g_star * rd);
            let c = -(1.0 - cs * m) * g_star * (vj + 2.0 * rd) - 2.0 * g0 * g_star * cs;
            max_root(a, b, c)
        };
        let wj = if in_range(cij) {
            self.wj(cij)
        } else {
            FloatValue::INFINITY
        };

        let civ = {
            let vc = self.vcmax;
            let a = g0 + m * (vc - rd);
            let b = (1.0 - cs * m) * (vc - rd) + g0 * (km - cs) - m * (vc * g_star + km * rd);
            let c = -(1.0 - cs * m) * (vc * g_star + km * rd) - g0 * km * cs;
            max_root(a, b, c)
        };
        let wc = if in_range(civ) {
            self.wc(civ)
        } else {
            FloatValue::INFINITY
        };

        wc.min(wj).min(self.wp()) - rd
    }

    /// Assimilation, stomatal conductance and intercellular CO2 of a leaf whose
    /// conductance follows `stomatal`
    ///
    /// Solves $A = f(C_i)$, $G_s = \max(g_{s,min}, g_0 + c A)$ and
    /// $C_i = \min(C_s, C_s - A / G_s)$ together:
    ///
    /// - if the leaf does not assimilate even at $C_i = C_s$, the stomata do not draw
    ///   down the CO2 and $C_i = C_s$,
    /// - else the coupled quadratics give the operating point, solved again with
    ///   $G_s = g_{s,min}$ if the conductance falls below its floor.
    pub fn operating_point(
        &self,
        cs: FloatValue,
        closure: FloatValue,
        stomatal: &impl StomatalClosure,
    ) -> (FloatValue, FloatValue, FloatValue) {
        let a_cs = self.net_assimilation(cs);
        if a_cs <= 0.0 {
            return (a_cs, stomatal.gs(closure, a_cs), cs);
        }

        let g0 = stomatal.g0();
        let gs_min = stomatal.gs_min();
        let a = self.coupled_assimilation(cs, g0, closure);
        let (a, gs) = if g0 + closure * a < gs_min {
            (self.coupled_assimilation(cs, gs_min, 0.0), gs_min)
        } else {
            (a, g0 + closure * a)
        };
        (a, gs, (cs - a / gs).min(cs))
    }
}

impl FvcbParameters {
    /// Rates at leaf temperature `tl` (°C) and absorbed light `ppfd` (umol m-2 s-1)
    pub fn rates(&self, tl: FloatValue, ppfd: FloatValue, constants: &Constants) -> FvcbRates {
        let tk = constants.to_kelvin(tl);
        let trk = constants.to_kelvin(self.tr);
        let r = constants.r;

        let gamma_star = arrhenius(42.75, 37830.0, tk, trk, r);
        let kc = arrhenius(404.9, 79430.0, tk, trk, r);
        let ko = arrhenius(278.4, 36380.0, tk, trk, r);
        let km = kc * (1.0 + self.o2 / ko);

        let vcmax = arrhenius_peaked(
            self.vcmax_ref,
            self.e_av,
            tk,
            trk,
            self.hd_v,
            self.delta_sv,
            r,
        );
        let jmax = arrhenius_peaked(
            self.jmax_ref,
            self.e_aj,
            tk,
            trk,
            self.hd_j,
            self.delta_sj,
            r,
        );

        FvcbRates {
            gamma_star,
            km,
            vcmax,
            jmax,
            vj: electron_transport(ppfd, jmax, self.alpha, self.theta) / 4.0,
            rd: arrhenius(self.rd_ref, self.e_ar, tk, trk, r),
            tpu: arrhenius(self.tpu_ref, self.e_ap, tk, trk, r),
        }
    }
}

/// FvCB photosynthesis driven by the intercellular CO2
///
/// Closed form, no coupling with the stomatal conductance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FvcbRaw {
    #[serde(flatten)]
    pub parameters: FvcbParameters,
}

impl FvcbRaw {
    pub fn from_parameters(parameters: FvcbParameters) -> Self {
        Self { parameters }
    }

    pub(crate) fn run(&self, status: &mut Status, constants: &Constants) -> BiophysResult<()> {
        let rates = self.parameters.rates(
            status.get(VAR_TL.name)?,
            status.get(VAR_PPFD.name)?,
            constants,
        );
        status.set(VAR_A.name, rates.net_assimilation(status.get(VAR_CI.name)?))
    }
}

impl ProcessModel for FvcbRaw {
    fn name(&self) -> &'static str {
        "FvcbRaw"
    }

    fn process(&self) -> Process {
        Process::Photosynthesis
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_PPFD),
            RequirementDefinition::input(&VAR_TL),
            RequirementDefinition::input(&VAR_CI),
            RequirementDefinition::output(&VAR_A),
        ]
    }
}

/// FvCB photosynthesis coupled with stomatal conductance, solved analytically
///
/// Needs a stomatal conductance model bound to the same object. Writes the assimilation,
/// the stomatal conductance and the intercellular CO2 $C_i = C_s - A / G_s$ (capped at
/// $C_s$).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fvcb {
    #[serde(flatten)]
    pub parameters: FvcbParameters,
}

impl Fvcb {
    pub fn from_parameters(parameters: FvcbParameters) -> Self {
        Self { parameters }
    }

    pub(crate) fn run(
        &self,
        models: &ProcessModels,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<()> {
        let stomatal = stomatal_model(models, self.name())?;
        let cs = status.get(VAR_CS.name)?;
        let rates = self.parameters.rates(
            status.get(VAR_TL.name)?,
            status.get(VAR_PPFD.name)?,
            constants,
        );

        let closure = stomatal.gs_closure(status, meteo)?;
        let (a, gs, ci) = rates.operating_point(cs, closure, stomatal);

        status.set(VAR_A.name, a)?;
        status.set(VAR_GS.name, gs)?;
        status.set(VAR_CI.name, ci)
    }
}

impl ProcessModel for Fvcb {
    fn name(&self) -> &'static str {
        "Fvcb"
    }

    fn process(&self) -> Process {
        Process::Photosynthesis
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_PPFD),
            RequirementDefinition::input(&VAR_TL),
            RequirementDefinition::input(&VAR_CS),
            RequirementDefinition::output(&VAR_A),
            RequirementDefinition::output(&VAR_GS),
            RequirementDefinition::output(&VAR_CI),
        ]
    }

    fn nested_processes(&self) -> Vec<Process> {
        vec![Process::StomatalConductance]
    }
}
