//! FvCB photosynthesis coupled with stomatal conductance, solved by fixed-point iteration.
//!
//! Slower than the analytical [`Fvcb`](super::Fvcb) but easier to follow, and a useful
//! cross-check of it: both find the same operating point.

use super::fvcb::FvcbParameters;
use super::stomatal_model;
use crate::components::stomatal_conductance::StomatalClosure;
use crate::model_list::ProcessModels;
use log::debug;
use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{Process, ProcessModel, RequirementDefinition};
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::BiophysResult;
use plantbiophys_core::numerics::Convergence;
use plantbiophys_core::standard_variables::{VAR_A, VAR_CI, VAR_CS, VAR_GS, VAR_PPFD, VAR_TL};
use plantbiophys_core::status::Status;
use plantbiophys_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Iterative FvCB photosynthesis
///
/// Starting from $C_i = C_s$, each iteration computes
///
/// 1. $A$ from the FvCB rates at the current $C_i$,
/// 2. $G_s$ from the stomatal conductance model,
/// 3. the new $C_i = \min(C_s, C_s - A / G_s)$,
///
/// until $C_i$ moves by less than `ci_tolerance` or `max_iter` iterations were done. In
/// the latter case the last iterate is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FvcbIter {
    #[serde(flatten)]
    pub parameters: FvcbParameters,

    /// Convergence threshold on the intercellular CO2
    /// unit: ppm
    /// default: 1e-6
    pub ci_tolerance: FloatValue,

    /// Maximum number of iterations
    /// default: 100
    pub max_iter: usize,
}

impl Default for FvcbIter {
    fn default() -> Self {
        Self {
            parameters: FvcbParameters::default(),
            ci_tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

impl FvcbIter {
    pub fn from_parameters(parameters: FvcbParameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub(crate) fn run(
        &self,
        models: &ProcessModels,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<Convergence> {
        let stomatal = stomatal_model(models, self.name())?;
        let cs = status.get(VAR_CS.name)?;
        let rates = self.parameters.rates(
            status.get(VAR_TL.name)?,
            status.get(VAR_PPFD.name)?,
            constants,
        );
        let closure = stomatal.gs_closure(status, meteo)?;
        let max_iter = self.max_iter.max(1);

        let mut ci = cs;
        let mut iterations = 0;
        let (a, gs, convergence) = loop {
            iterations += 1;
            let a = rates.net_assimilation(ci);
            let gs = stomatal.gs(closure, a);
            let ci_new = (cs - a / gs).min(cs);
            let delta = (ci_new - ci).abs();
            ci = ci_new;

            if delta <= self.ci_tolerance {
                break (a, gs, Convergence::Converged { iterations });
            }
            if iterations >= max_iter {
                break (a, gs, Convergence::MaxIterExceeded { iterations });
            }
        };
        debug!("FvcbIter: {convergence:?} (Ci = {ci})");

        status.set(VAR_A.name, a)?;
        status.set(VAR_GS.name, gs)?;
        status.set(VAR_CI.name, ci)?;
        Ok(convergence)
    }
}

impl ProcessModel for FvcbIter {
    fn name(&self) -> &'static str {
        "FvcbIter"
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
