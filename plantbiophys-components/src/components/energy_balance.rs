//! Leaf energy balance
//!
//! Solves the leaf temperature that closes the balance between net radiation, sensible
//! heat and latent heat (Monteith & Unsworth, 2013). Transpiration depends on the
//! stomatal conductance, itself depending on the assimilation at the current leaf
//! temperature, so the balance and the photosynthesis are solved together by fixed-point
//! iteration on the leaf temperature.
//!
//! # Inputs
//!
//! - `Rs` (W m-2) - Net shortwave radiation
//! - `sky_fraction` (-) - Fraction of the sky seen by the leaf
//! - `d` (m) - Characteristic dimension of the leaf
//! - `A`, `Gs` - From the photosynthesis model, which must compute both
//!
//! # Outputs
//!
//! - `Tl` (°C) - Leaf temperature
//! - `Rn`, `Rll`, `H`, `lambdaE` (W m-2) - Net, longwave, sensible and latent fluxes
//! - `Gbh` (m s-1), `Gbc` (mol m-2 s-1) - Boundary-layer conductances
//! - `Cs` (ppm), `Dl` (kPa) - Conditions at the leaf surface
//! - `iter` (-) - Number of iterations used

use crate::model_list::ProcessModels;
use log::{debug, warn};
use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{Process, ProcessModel, RequirementDefinition};
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::{BiophysError, BiophysResult};
use plantbiophys_core::numerics::{Convergence, ConvergenceReport};
use plantbiophys_core::physics::{e_sat, ms_to_mol, mol_to_ms, net_longwave_radiation};
use plantbiophys_core::standard_variables::{
    VAR_A, VAR_CS, VAR_D, VAR_DL, VAR_GBC, VAR_GBH, VAR_GS, VAR_H, VAR_ITER,
    VAR_LAMBDA_E, VAR_RLL, VAR_RN, VAR_RS, VAR_SKY_FRACTION, VAR_TL,
};
use plantbiophys_core::status::Status;
use plantbiophys_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Boundary-layer conductance for heat under free convection (m s-1)
///
/// Buoyancy driven, from the Grashof number (Monteith & Unsworth, 2013, eq. 10.41). Null
/// when the leaf and the air are at the same temperature.
pub fn gbh_free(
    t_air: FloatValue,
    t_leaf: FloatValue,
    d: FloatValue,
    constants: &Constants,
) -> FloatValue {
    let delta_t = (t_leaf - t_air).abs();
    if delta_t == 0.0 {
        return 0.0;
    }
    let grashof = 1.58e8 * d.powi(3) * delta_t;
    let dh = constants.dh0 * (1.0 + 0.007 * t_air);
    0.5 * dh * grashof.powf(0.25) / d
}

/// Boundary-layer conductance for heat under forced convection (m s-1)
///
/// Wind driven (Monteith & Unsworth, 2013, eq. 10.39).
pub fn gbh_forced(wind: FloatValue, d: FloatValue) -> FloatValue {
    0.003 * (wind / d).sqrt()
}

/// Parameters of the Monteith energy balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteithParameters {
    /// Number of faces exchanging sensible heat
    /// unit: -
    /// default: 2.0
    pub a_sh: FloatValue,

    /// Number of faces exchanging water vapour, i.e. 1 for hypostomatous leaves
    /// unit: -
    /// default: 1.0
    pub a_sv: FloatValue,

    /// Emissivity of the leaf
    /// unit: -
    /// default: 0.955
    pub epsilon: FloatValue,

    /// Maximum number of iterations
    /// default: 10
    pub maxiter: usize,

    /// Convergence threshold on the leaf temperature
    /// unit: °C
    /// default: 0.01
    pub delta_t: FloatValue,

    /// Start from the leaf temperature, surface CO2 and deficit already in the status
    ///
    /// Falls back to the air conditions when any of them is not initialised.
    /// default: false
    pub warm_start: bool,
}

impl Default for MonteithParameters {
    fn default() -> Self {
        Self {
            a_sh: 2.0,
            a_sv: 1.0,
            epsilon: 0.955,
            maxiter: 10,
            delta_t: 0.01,
            warm_start: false,
        }
    }
}

/// Outcome of one energy balance solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyBalanceConvergence {
    /// Iteration on the leaf temperature
    pub leaf_temperature: Convergence,
    /// Photosynthesis solve of the last iteration, for the iterative models
    pub photosynthesis: Option<Convergence>,
}

impl EnergyBalanceConvergence {
    pub fn is_converged(&self) -> bool {
        self.leaf_temperature.is_converged()
            && self.photosynthesis.map_or(true, |c| c.is_converged())
    }
}

impl From<EnergyBalanceConvergence> for ConvergenceReport {
    fn from(convergence: EnergyBalanceConvergence) -> Self {
        let mut report = ConvergenceReport::from(convergence.leaf_temperature);
        if let Some(photosynthesis) = convergence.photosynthesis {
            report.record(photosynthesis);
        }
        report
    }
}

/// Fluxes of one iteration of the energy balance
#[derive(Debug, Clone, Copy, PartialEq)]
struct EnergyFluxes {
    tl: FloatValue,
    rn: FloatValue,
    rll: FloatValue,
    h: FloatValue,
    lambda_e: FloatValue,
    gbh: FloatValue,
    gbc: FloatValue,
}

/// Monteith leaf energy balance coupled with photosynthesis
///
/// Starting from $T_l = T - 0.2$, $C_s = C_a$ and $D_l = VPD$, each iteration
///
/// 1. runs the photosynthesis model (and through it the stomatal conductance),
/// 2. computes the net longwave radiation $R_{ll}$ and net radiation $R_n = R_s + R_{ll}$,
/// 3. computes the boundary-layer conductance for heat (free + forced convection),
/// 4. derives the boundary-layer and stomatal resistances,
/// 5. updates $C_s = \min(C_a, C_a - A / (G_{bc} a_{sv}))$,
/// 6. computes the apparent psychrometric constant
///    $\gamma^* = \gamma \frac{a_{sh}}{a_{sv}} \frac{R_{bv} + R_{sv}}{R_{bh}}$,
/// 7. computes $\lambda E$ with the Penman-Monteith equation and the new leaf temperature,
/// 8. stops if the leaf temperature moved by less than `delta_t`, else updates $D_l$.
///
/// The steps depend on each other and run in this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monteith {
    #[serde(flatten)]
    pub parameters: MonteithParameters,
}

impl Monteith {
    pub fn from_parameters(parameters: MonteithParameters) -> Self {
        Self { parameters }
    }

    /// Fluxes and new leaf temperature for the current state of the leaf (steps 2 to 7)
    #[allow(clippy::too_many_arguments)]
    fn fluxes(
        &self,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
        tl: FloatValue,
        rs: FloatValue,
        sky_fraction: FloatValue,
        d: FloatValue,
    ) -> BiophysResult<EnergyFluxes> {
        let p = &self.parameters;
        let a = status.get(VAR_A.name)?;
        let gs = status.get(VAR_GS.name)?;

        let rll = net_longwave_radiation(
            tl,
            meteo.t,
            p.epsilon,
            meteo.epsilon,
            sky_fraction,
            constants,
        );
        let rn = rs + rll;

        let gbh = gbh_free(meteo.t, tl, d, constants) + gbh_forced(meteo.wind, d);

        let rbh = 1.0 / gbh;
        let rbv = 1.0 / (gbh * constants.gbh_to_gbw);
        let rsv = 1.0 / (constants.gsc_to_gsw * mol_to_ms(gs, meteo.t, meteo.p, constants));
        let gbc = ms_to_mol(gbh, meteo.t, meteo.p, constants) / constants.gbc_to_gbh;

        status.set(VAR_CS.name, (meteo.ca - a / (gbc * p.a_sv)).min(meteo.ca))?;

        let gamma_star = meteo.gamma * p.a_sh / p.a_sv * (rbv + rsv) / rbh;

        let heat_capacity = meteo.rho * constants.cp * (p.a_sh / rbh);
        let lambda_e =
            (meteo.delta * rn + heat_capacity * meteo.vpd) / (meteo.delta + gamma_star);
        let h = (gamma_star * rn - heat_capacity * meteo.vpd) / (meteo.delta + gamma_star);

        Ok(EnergyFluxes {
            tl: meteo.t + (rn - lambda_e) / heat_capacity,
            rn,
            rll,
            h,
            lambda_e,
            gbh,
            gbc,
        })
    }

    /// Solve the energy balance of one leaf for one time step
    pub fn solve(
        &self,
        models: &ProcessModels,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<EnergyBalanceConvergence> {
        let photosynthesis = models.photosynthesis.as_ref().ok_or_else(|| {
            BiophysError::MissingProcess {
                model: self.name().to_string(),
                process: Process::Photosynthesis,
            }
        })?;
        let computed = photosynthesis.output_names();
        if let Some(variable) = [VAR_A.name, VAR_GS.name]
            .into_iter()
            .find(|name| !computed.iter().any(|output| output == name))
        {
            return Err(BiophysError::MissingOutput {
                model: self.name().to_string(),
                process: Process::Photosynthesis,
                provider: photosynthesis.name().to_string(),
                variable: variable.to_string(),
            });
        }
        let p = &self.parameters;
        let rs = status.get(VAR_RS.name)?;
        let sky_fraction = status.get(VAR_SKY_FRACTION.name)?;
        let d = status.get(VAR_D.name)?;

        let warm = p.warm_start
            && [VAR_TL.name, VAR_CS.name, VAR_DL.name]
                .iter()
                .all(|name| !status.is_uninitialized(name));
        if !warm {
            status.set(VAR_TL.name, meteo.t - 0.2)?;
            status.set(VAR_CS.name, meteo.ca)?;
            status.set(VAR_DL.name, meteo.vpd)?;
        }

        let maxiter = p.maxiter.max(1);
        let mut tl = status.get(VAR_TL.name)?;
        let mut iterations = 0;
        let (fluxes, convergence, nested) = loop {
            iterations += 1;
            let nested = photosynthesis.run(models, status, meteo, constants)?;
            let fluxes = self.fluxes(status, meteo, constants, tl, rs, sky_fraction, d)?;

            let converged = (fluxes.tl - tl).abs() <= p.delta_t;
            tl = fluxes.tl;
            status.set(VAR_TL.name, tl)?;
            if converged {
                break (fluxes, Convergence::Converged { iterations }, nested);
            }

            status.set(VAR_DL.name, e_sat(tl) - meteo.e)?;
            if iterations >= maxiter {
                break (fluxes, Convergence::MaxIterExceeded { iterations }, nested);
            }
        };

        match convergence {
            Convergence::Converged { .. } => {
                debug!("Monteith: converged in {iterations} iterations (Tl = {tl})")
            }
            Convergence::MaxIterExceeded { .. } => warn!(
                "Monteith: no convergence after {iterations} iterations, \
                 keeping the last leaf temperature (Tl = {tl})"
            ),
        }

        status.set(VAR_RN.name, fluxes.rn)?;
        status.set(VAR_RLL.name, fluxes.rll)?;
        status.set(VAR_H.name, fluxes.h)?;
        status.set(VAR_LAMBDA_E.name, fluxes.lambda_e)?;
        status.set(VAR_GBH.name, fluxes.gbh)?;
        status.set(VAR_GBC.name, fluxes.gbc)?;
        status.set(VAR_ITER.name, iterations as FloatValue)?;
        Ok(EnergyBalanceConvergence {
            leaf_temperature: convergence,
            photosynthesis: nested,
        })
    }
}

impl ProcessModel for Monteith {
    fn name(&self) -> &'static str {
        "Monteith"
    }

    fn process(&self) -> Process {
        Process::EnergyBalance
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_RS),
            RequirementDefinition::input(&VAR_SKY_FRACTION),
            RequirementDefinition::input(&VAR_D),
            RequirementDefinition::input(&VAR_A),
            RequirementDefinition::input(&VAR_GS),
            RequirementDefinition::output(&VAR_TL),
            RequirementDefinition::output(&VAR_RN),
            RequirementDefinition::output(&VAR_RLL),
            RequirementDefinition::output(&VAR_H),
            RequirementDefinition::output(&VAR_LAMBDA_E),
            RequirementDefinition::output(&VAR_CS),
            RequirementDefinition::output(&VAR_GBH),
            RequirementDefinition::output(&VAR_DL),
            RequirementDefinition::output(&VAR_GBC),
            RequirementDefinition::output(&VAR_ITER),
        ]
    }

    fn nested_processes(&self) -> Vec<Process> {
        vec![Process::Photosynthesis]
    }
}

process_model_enum!(
    /// Models available for the energy balance process
    EnergyBalanceModel,
    Process::EnergyBalance,
    { Monteith }
);

impl EnergyBalanceModel {
    /// Solve the energy balance for one time step
    pub fn run(
        &self,
        models: &ProcessModels,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<EnergyBalanceConvergence> {
        match self {
            EnergyBalanceModel::Monteith(model) => model.solve(models, status, meteo, constants),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::photosynthesis::{ConstantA, ConstantAGs, Fvcb, FvcbIter, FvcbRaw};
    use crate::components::stomatal_conductance::{ConstantGs, Medlyn};
    use approx::assert_relative_eq;
    use plantbiophys_core::component::to_initialize;
    use plantbiophys_core::status::init_status;
    use std::collections::BTreeSet;

    fn leaf_models() -> ProcessModels {
        ProcessModels {
            energy_balance: Some(Monteith::default().into()),
            photosynthesis: Some(Fvcb::default().into()),
            stomatal_conductance: Some(Medlyn::new(0.03, 12.0).into()),
            ..ProcessModels::default()
        }
    }

    fn leaf_status(models: &ProcessModels) -> Status {
        init_status(
            &models.bound(),
            [("Rs", 13.747), ("sky_fraction", 1.0), ("PPFD", 1500.0), ("d", 0.03)],
        )
        .unwrap()
    }

    fn meteo() -> Atmosphere {
        Atmosphere::new(22.0, 0.8333, 101.325, 0.4490995)
    }

    fn try_solve(
        models: &ProcessModels,
        status: &mut Status,
    ) -> BiophysResult<EnergyBalanceConvergence> {
        models
            .energy_balance
            .as_ref()
            .unwrap()
            .run(models, status, &meteo(), &Constants::default())
    }

    fn solve(models: &ProcessModels, status: &mut Status) -> Convergence {
        let convergence = try_solve(models, status).unwrap();
        assert_eq!(convergence.photosynthesis, None);
        convergence.leaf_temperature
    }

    #[test]
    fn test_gbh_free() {
        let constants = Constants::default();
        assert_eq!(gbh_free(20.0, 20.0, 0.03, &constants), 0.0);

        let warm = gbh_free(20.0, 25.0, 0.03, &constants);
        let cold = gbh_free(20.0, 15.0, 0.03, &constants);
        assert!(warm > 0.0);
        assert_relative_eq!(warm, cold);
        assert!(gbh_free(20.0, 30.0, 0.03, &constants) > warm);
    }

    #[test]
    fn test_gbh_forced() {
        assert_relative_eq!(gbh_forced(1.2, 0.03), 0.003 * 40.0_f64.sqrt());
        assert!(gbh_forced(2.0, 0.03) > gbh_forced(1.0, 0.03));
        assert!(gbh_forced(1.0, 0.01) > gbh_forced(1.0, 0.03));
    }

    #[test]
    fn test_required_variables() {
        let models = leaf_models();
        assert_eq!(
            to_initialize(&models.bound()),
            BTreeSet::from(["PPFD", "Rs", "d", "sky_fraction"].map(String::from))
        );
    }

    #[test]
    fn test_monteith_converges() {
        let models = leaf_models();
        let mut status = leaf_status(&models);

        let convergence = solve(&models, &mut status);

        assert!(convergence.is_converged());
        assert_eq!(status["iter"], convergence.iterations() as FloatValue);
        assert!(convergence.iterations() < MonteithParameters::default().maxiter);
        // A transpiring leaf with little radiation is cooled below the air
        assert!(status["Tl"] < 22.0 && status["Tl"] > 14.0);
        assert!(status["A"] > 0.0);
        assert!(status["Gs"] > 0.0);
        assert!(status["Cs"] < 400.0);
        assert!(status["lambdaE"] > 0.0);
    }

    #[test]
    fn test_energy_is_conserved() {
        let models = leaf_models();
        let mut status = leaf_status(&models);
        solve(&models, &mut status);

        assert_relative_eq!(status["H"] + status["lambdaE"], status["Rn"], max_relative = 1e-9);
        assert_relative_eq!(status["Rn"], 13.747 + status["Rll"], max_relative = 1e-12);
    }

    #[test]
    fn test_warm_start_is_a_fixed_point() {
        let models = leaf_models();
        let mut status = leaf_status(&models);
        solve(&models, &mut status);
        let tl = status["Tl"];

        let warm_models = ProcessModels {
            energy_balance: Some(
                Monteith::from_parameters(MonteithParameters {
                    warm_start: true,
                    ..MonteithParameters::default()
                })
                .into(),
            ),
            ..leaf_models()
        };
        let convergence = solve(&warm_models, &mut status);

        assert_eq!(convergence, Convergence::Converged { iterations: 1 });
        assert_relative_eq!(status["Tl"], tl, epsilon = 0.01);
    }

    #[test]
    fn test_maxiter_exhaustion_is_reported() {
        let models = ProcessModels {
            energy_balance: Some(
                Monteith::from_parameters(MonteithParameters {
                    maxiter: 1,
                    ..MonteithParameters::default()
                })
                .into(),
            ),
            ..leaf_models()
        };
        let mut status = leaf_status(&models);

        let convergence = solve(&models, &mut status);

        assert_eq!(convergence, Convergence::MaxIterExceeded { iterations: 1 });
        assert_eq!(status["iter"], 1.0);
        assert!(status["Tl"].is_finite());
    }

    #[test]
    fn test_missing_photosynthesis() {
        let models = ProcessModels {
            energy_balance: Some(Monteith::default().into()),
            ..ProcessModels::default()
        };
        let mut status = init_status(
            &models.bound(),
            [("Rs", 13.747), ("sky_fraction", 1.0), ("d", 0.03)],
        )
        .unwrap();

        let err = try_solve(&models, &mut status).unwrap_err();
        assert_eq!(
            err,
            BiophysError::MissingProcess {
                model: "Monteith".to_string(),
                process: Process::Photosynthesis
            }
        );
    }

    #[test]
    fn test_closed_stomata_warm_the_leaf() {
        let models = ProcessModels {
            energy_balance: Some(Monteith::default().into()),
            photosynthesis: Some(ConstantAGs::new(0.0).into()),
            stomatal_conductance: Some(ConstantGs::new(1e-6).into()),
            ..ProcessModels::default()
        };
        let mut status = init_status(
            &models.bound(),
            [("Rs", 300.0), ("sky_fraction", 1.0), ("d", 0.03)],
        )
        .unwrap();

        solve(&models, &mut status);

        assert!(status["Tl"] > 22.0);
        assert!(status["lambdaE"] < 1.0);
    }

    #[test]
    fn test_photosynthesis_must_compute_assimilation_and_conductance() {
        let raw = ProcessModels {
            energy_balance: Some(Monteith::default().into()),
            photosynthesis: Some(FvcbRaw::default().into()),
            ..ProcessModels::default()
        };
        // Nothing in the subtree computes Gs, so it must be supplied
        let required = to_initialize(&raw.bound());
        assert!(required.contains("Gs") && required.contains("Ci"));

        let mut status = init_status(
            &raw.bound(),
            [
                ("Rs", 13.747),
                ("sky_fraction", 1.0),
                ("PPFD", 1500.0),
                ("d", 0.03),
                ("Ci", 300.0),
                ("Gs", 0.3),
            ],
        )
        .unwrap();
        let before = status.clone();
        assert_eq!(
            try_solve(&raw, &mut status).unwrap_err(),
            BiophysError::MissingOutput {
                model: "Monteith".to_string(),
                process: Process::Photosynthesis,
                provider: "FvcbRaw".to_string(),
                variable: "Gs".to_string(),
            }
        );
        assert_eq!(status, before);

        let constant = ProcessModels {
            energy_balance: Some(Monteith::default().into()),
            photosynthesis: Some(ConstantA::new(10.0).into()),
            ..ProcessModels::default()
        };
        assert!(to_initialize(&constant.bound()).contains("Gs"));
        let mut status = init_status(
            &constant.bound(),
            [("Rs", 13.747), ("sky_fraction", 1.0), ("d", 0.03)],
        )
        .unwrap();
        assert!(matches!(
            try_solve(&constant, &mut status),
            Err(BiophysError::MissingOutput { variable, .. }) if variable == "Gs"
        ));
    }

    #[test]
    fn test_nested_photosynthesis_convergence_is_reported() {
        let models = ProcessModels {
            photosynthesis: Some(
                FvcbIter {
                    max_iter: 1,
                    ..FvcbIter::default()
                }
                .into(),
            ),
            ..leaf_models()
        };
        let mut status = leaf_status(&models);

        let convergence = try_solve(&models, &mut status).unwrap();

        assert_eq!(
            convergence.photosynthesis,
            Some(Convergence::MaxIterExceeded { iterations: 1 })
        );
        assert!(!convergence.is_converged());
        let report = ConvergenceReport::from(convergence);
        assert_eq!(report.steps, 2);
        assert!(report.exhausted >= 1);
    }
}
