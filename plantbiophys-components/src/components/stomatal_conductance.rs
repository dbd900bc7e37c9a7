//! Stomatal conductance models
//!
//! All models share the same conductance formula
//!
//! $$ G_s = \max(g_{s,min}, g_0 + c \cdot A) $$
//!
//! and only differ by the closure term $c$, returned by [`StomatalClosure::gs_closure`].
//! The floor and intercept are applied once, in [`StomatalClosure::gs`], so that a new
//! model only has to provide its closure.
//!
//! The closure is also what the coupled photosynthesis models need to solve the
//! assimilation and conductance together.

use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{Process, ProcessModel, RequirementDefinition};
use plantbiophys_core::errors::BiophysResult;
use plantbiophys_core::standard_variables::{VAR_A, VAR_CS, VAR_DL, VAR_GS, VAR_PSIL};
use plantbiophys_core::status::Status;
use plantbiophys_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Smallest leaf-to-air vapour pressure deficit used by [`Medlyn`] (kPa)
pub const MIN_DL: FloatValue = 1e-9;

/// Closure term of a stomatal conductance model
pub trait StomatalClosure {
    /// Residual conductance when assimilation is null (mol m-2 s-1)
    fn g0(&self) -> FloatValue;

    /// Minimum conductance (mol m-2 s-1)
    fn gs_min(&self) -> FloatValue;

    /// Slope of the conductance response to assimilation
    ///
    /// Reads the status but never modifies it.
    fn gs_closure(&self, status: &Status, meteo: &Atmosphere) -> BiophysResult<FloatValue>;

    /// Stomatal conductance for CO2 given the closure and the assimilation `a`
    fn gs(&self, closure: FloatValue, a: FloatValue) -> FloatValue {
        (self.g0() + closure * a).max(self.gs_min())
    }
}

/// Medlyn et al. (2011) optimal stomatal conductance
///
/// $$ c = \frac{1 + g_1 / \sqrt{D_l}}{C_s} $$
///
/// $D_l$ is floored at [`MIN_DL`] so that a negative deficit (a rehydrating leaf) does not
/// produce a NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medlyn {
    /// Residual conductance
    /// unit: mol m-2 s-1
    /// default: 0.0
    pub g0: FloatValue,

    /// Slope parameter
    /// unit: kPa^0.5
    /// default: 4.0
    pub g1: FloatValue,

    /// Minimum conductance
    /// unit: mol m-2 s-1
    /// default: 0.001
    pub gs_min: FloatValue,
}

impl Default for Medlyn {
    fn default() -> Self {
        Self {
            g0: 0.0,
            g1: 4.0,
            gs_min: 0.001,
        }
    }
}

impl Medlyn {
    pub fn new(g0: FloatValue, g1: FloatValue) -> Self {
        Self {
            g0,
            g1,
            ..Self::default()
        }
    }

    pub fn calculate_closure(&self, dl: FloatValue, cs: FloatValue) -> FloatValue {
        (1.0 + self.g1 / dl.max(MIN_DL).sqrt()) / cs
    }
}

impl StomatalClosure for Medlyn {
    fn g0(&self) -> FloatValue {
        self.g0
    }

    fn gs_min(&self) -> FloatValue {
        self.gs_min
    }

    fn gs_closure(&self, status: &Status, _meteo: &Atmosphere) -> BiophysResult<FloatValue> {
        Ok(self.calculate_closure(status.get(VAR_DL.name)?, status.get(VAR_CS.name)?))
    }
}

impl ProcessModel for Medlyn {
    fn name(&self) -> &'static str {
        "Medlyn"
    }

    fn process(&self) -> Process {
        Process::StomatalConductance
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_DL),
            RequirementDefinition::input(&VAR_CS),
            RequirementDefinition::input(&VAR_A),
            RequirementDefinition::output(&VAR_GS),
        ]
    }
}

/// Ball, Woodrow and Berry (1987) stomatal conductance
///
/// $$ c = \frac{g_1 \cdot Rh}{C_s} $$
///
/// The relative humidity is read from the atmosphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallBerry {
    /// Residual conductance
    /// unit: mol m-2 s-1
    /// default: 0.01
    pub g0: FloatValue,

    /// Slope parameter
    /// unit: -
    /// default: 9.0
    pub g1: FloatValue,

    /// Minimum conductance
    /// unit: mol m-2 s-1
    /// default: 0.001
    pub gs_min: FloatValue,
}

impl Default for BallBerry {
    fn default() -> Self {
        Self {
            g0: 0.01,
            g1: 9.0,
            gs_min: 0.001,
        }
    }
}

impl BallBerry {
    pub fn new(g0: FloatValue, g1: FloatValue) -> Self {
        Self {
            g0,
            g1,
            ..Self::default()
        }
    }
}

impl StomatalClosure for BallBerry {
    fn g0(&self) -> FloatValue {
        self.g0
    }

    fn gs_min(&self) -> FloatValue {
        self.gs_min
    }

    fn gs_closure(&self, status: &Status, meteo: &Atmosphere) -> BiophysResult<FloatValue> {
        Ok(self.g1 * meteo.rh / status.get(VAR_CS.name)?)
    }
}

impl ProcessModel for BallBerry {
    fn name(&self) -> &'static str {
        "BallBerry"
    }

    fn process(&self) -> Process {
        Process::StomatalConductance
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_CS),
            RequirementDefinition::input(&VAR_A),
            RequirementDefinition::output(&VAR_GS),
        ]
    }
}

/// Tuzet et al. (2003) stomatal conductance with leaf water potential regulation
///
/// $$ c = \frac{g_1}{C_s - \Gamma} \cdot f_{\Psi} $$
/// $$ f_{\Psi} = \frac{1 + e^{s_f \Psi_v}}{1 + e^{s_f (\Psi_v - \Psi_l)}} $$
///
/// $f_{\Psi}$ closes the stomata as the leaf water potential $\Psi_l$ drops below the
/// reference potential $\Psi_v$.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuzet {
    /// Residual conductance
    /// unit: mol m-2 s-1
    /// default: 0.0
    pub g0: FloatValue,

    /// Slope parameter
    /// unit: -
    /// default: 8.0
    pub g1: FloatValue,

    /// Sensitivity of the stomata to the leaf water potential
    /// unit: MPa-1
    /// default: 3.0
    pub sf: FloatValue,

    /// Leaf water potential at which the conductance is halved
    /// unit: MPa
    /// default: -1.9
    pub psi_v: FloatValue,

    /// CO2 compensation point
    /// unit: ppm
    /// default: 30.0
    pub gamma: FloatValue,

    /// Minimum conductance
    /// unit: mol m-2 s-1
    /// default: 0.001
    pub gs_min: FloatValue,
}

impl Default for Tuzet {
    fn default() -> Self {
        Self {
            g0: 0.0,
            g1: 8.0,
            sf: 3.0,
            psi_v: -1.9,
            gamma: 30.0,
            gs_min: 0.001,
        }
    }
}

impl Tuzet {
    /// Reduction of the conductance by the leaf water potential (0-1)
    pub fn water_potential_factor(&self, psi_l: FloatValue) -> FloatValue {
        (1.0 + (self.sf * self.psi_v).exp()) / (1.0 + (self.sf * (self.psi_v - psi_l)).exp())
    }
}

impl StomatalClosure for Tuzet {
    fn g0(&self) -> FloatValue {
        self.g0
    }

    fn gs_min(&self) -> FloatValue {
        self.gs_min
    }

    fn gs_closure(&self, status: &Status, _meteo: &Atmosphere) -> BiophysResult<FloatValue> {
        let cs = status.get(VAR_CS.name)?;
        let psi_l = status.get(VAR_PSIL.name)?;
        Ok(self.g1 / (cs - self.gamma) * self.water_potential_factor(psi_l))
    }
}

impl ProcessModel for Tuzet {
    fn name(&self) -> &'static str {
        "Tuzet"
    }

    fn process(&self) -> Process {
        Process::StomatalConductance
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_PSIL),
            RequirementDefinition::input(&VAR_CS),
            RequirementDefinition::input(&VAR_A),
            RequirementDefinition::output(&VAR_GS),
        ]
    }
}

/// Constant stomatal conductance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantGs {
    /// Stomatal conductance for CO2
    /// unit: mol m-2 s-1
    /// default: 0.2
    pub gs: FloatValue,
}

impl Default for ConstantGs {
    fn default() -> Self {
        Self { gs: 0.2 }
    }
}

impl ConstantGs {
    pub fn new(gs: FloatValue) -> Self {
        Self { gs }
    }
}

impl StomatalClosure for ConstantGs {
    fn g0(&self) -> FloatValue {
        self.gs
    }

    fn gs_min(&self) -> FloatValue {
        0.0
    }

    fn gs_closure(&self, _status: &Status, _meteo: &Atmosphere) -> BiophysResult<FloatValue> {
        Ok(0.0)
    }
}

impl ProcessModel for ConstantGs {
    fn name(&self) -> &'static str {
        "ConstantGs"
    }

    fn process(&self) -> Process {
        Process::StomatalConductance
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![RequirementDefinition::output(&VAR_GS)]
    }
}

process_model_enum!(
    /// Models available for the stomatal conductance process
    StomatalConductanceModel,
    Process::StomatalConductance,
    { Medlyn, BallBerry, Tuzet, ConstantGs }
);

impl StomatalClosure for StomatalConductanceModel {
    fn g0(&self) -> FloatValue {
        match self {
            StomatalConductanceModel::Medlyn(model) => model.g0(),
            StomatalConductanceModel::BallBerry(model) => model.g0(),
            StomatalConductanceModel::Tuzet(model) => model.g0(),
            StomatalConductanceModel::ConstantGs(model) => model.g0(),
        }
    }

    fn gs_min(&self) -> FloatValue {
        match self {
            StomatalConductanceModel::Medlyn(model) => model.gs_min(),
            StomatalConductanceModel::BallBerry(model) => model.gs_min(),
            StomatalConductanceModel::Tuzet(model) => model.gs_min(),
            StomatalConductanceModel::ConstantGs(model) => model.gs_min(),
        }
    }

    fn gs_closure(&self, status: &Status, meteo: &Atmosphere) -> BiophysResult<FloatValue> {
        match self {
            StomatalConductanceModel::Medlyn(model) => model.gs_closure(status, meteo),
            StomatalConductanceModel::BallBerry(model) => model.gs_closure(status, meteo),
            StomatalConductanceModel::Tuzet(model) => model.gs_closure(status, meteo),
            StomatalConductanceModel::ConstantGs(model) => model.gs_closure(status, meteo),
        }
    }
}

impl StomatalConductanceModel {
    /// Compute the stomatal conductance from the assimilation in the status
    pub fn run(&self, status: &mut Status, meteo: &Atmosphere) -> BiophysResult<()> {
        let closure = self.gs_closure(status, meteo)?;
        // With a null closure Gs does not depend on A, which the status may not hold
        let a = if closure == 0.0 {
            0.0
        } else {
            status.get(VAR_A.name)?
        };
        status.set(VAR_GS.name, self.gs(closure, a))
    }
}
