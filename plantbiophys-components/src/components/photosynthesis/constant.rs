//! Constant assimilation, for tests and for decoupling photosynthesis from the rest.

use super::stomatal_model;
use crate::components::stomatal_conductance::StomatalClosure;
use crate::model_list::ProcessModels;
use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{Process, ProcessModel, RequirementDefinition};
use plantbiophys_core::errors::BiophysResult;
use plantbiophys_core::standard_variables::{VAR_A, VAR_CI, VAR_CS, VAR_GS};
use plantbiophys_core::status::Status;
use plantbiophys_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Constant net assimilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantA {
    /// Net CO2 assimilation
    /// unit: umol m-2 s-1
    /// default: 15.0
    pub a: FloatValue,
}

impl Default for ConstantA {
    fn default() -> Self {
        Self { a: 15.0 }
    }
}

impl ConstantA {
    pub fn new(a: FloatValue) -> Self {
        Self { a }
    }

    pub(crate) fn run(&self, status: &mut Status) -> BiophysResult<()> {
        status.set(VAR_A.name, self.a)
    }
}

impl ProcessModel for ConstantA {
    fn name(&self) -> &'static str {
        "ConstantA"
    }

    fn process(&self) -> Process {
        Process::Photosynthesis
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![RequirementDefinition::output(&VAR_A)]
    }
}

/// Constant net assimilation, with the stomatal conductance and intercellular CO2 it
/// implies
///
/// Needs a stomatal conductance model bound to the same object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantAGs {
    /// Net CO2 assimilation
    /// unit: umol m-2 s-1
    /// default: 15.0
    pub a: FloatValue,
}

impl Default for ConstantAGs {
    fn default() -> Self {
        Self { a: 15.0 }
    }
}

impl ConstantAGs {
    pub fn new(a: FloatValue) -> Self {
        Self { a }
    }

    pub(crate) fn run(
        &self,
        models: &ProcessModels,
        status: &mut Status,
        meteo: &Atmosphere,
    ) -> BiophysResult<()> {
        let stomatal = stomatal_model(models, self.name())?;
        let cs = status.get(VAR_CS.name)?;
        let gs = stomatal.gs(stomatal.gs_closure(status, meteo)?, self.a);

        status.set(VAR_A.name, self.a)?;
        status.set(VAR_GS.name, gs)?;
        status.set(VAR_CI.name, (cs - self.a / gs).min(cs))
    }
}

impl ProcessModel for ConstantAGs {
    fn name(&self) -> &'static str {
        "ConstantAGs"
    }

    fn process(&self) -> Process {
        Process::Photosynthesis
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
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
