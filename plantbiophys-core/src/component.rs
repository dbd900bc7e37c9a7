//! Input/output contracts of process models.
//!
//! Every process model declares the status variables it reads ([`RequirementType::Input`])
//! and writes ([`RequirementType::Output`]). Coupling several models on one object is
//! then a matter of set algebra: a variable only has to be supplied by the user if some
//! model reads it and no model on the same object writes it.
//!
//! ```rust
//! use plantbiophys_core::component::{to_initialize, Process, ProcessModel, RequirementDefinition};
//! use plantbiophys_core::standard_variables::{VAR_A, VAR_TL};
//!
//! #[derive(Debug)]
//! struct Producer;
//!
//! impl ProcessModel for Producer {
//!     fn name(&self) -> &'static str { "Producer" }
//!     fn process(&self) -> Process { Process::EnergyBalance }
//!     fn definitions(&self) -> Vec<RequirementDefinition> {
//!         vec![RequirementDefinition::output(&VAR_TL)]
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Consumer;
//!
//! impl ProcessModel for Consumer {
//!     fn name(&self) -> &'static str { "Consumer" }
//!     fn process(&self) -> Process { Process::Photosynthesis }
//!     fn definitions(&self) -> Vec<RequirementDefinition> {
//!         vec![RequirementDefinition::input(&VAR_TL), RequirementDefinition::output(&VAR_A)]
//!     }
//! }
//!
//! assert!(to_initialize(&[&Consumer]).contains("Tl"));
//! assert!(!to_initialize(&[&Producer, &Consumer]).contains("Tl"));
//! ```

use crate::variable::StaticVariableDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

/// The biophysical processes an object can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    LightInterception,
    EnergyBalance,
    Photosynthesis,
    StomatalConductance,
}

impl Process {
    /// All processes, in the order they are usually simulated
    pub const ALL: [Process; 4] = [
        Process::LightInterception,
        Process::EnergyBalance,
        Process::Photosynthesis,
        Process::StomatalConductance,
    ];
}

impl Display for Process {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Process::LightInterception => write!(f, "light_interception"),
            Process::EnergyBalance => write!(f, "energy_balance"),
            Process::Photosynthesis => write!(f, "photosynthesis"),
            Process::StomatalConductance => write!(f, "stomatal_conductance"),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum RequirementType {
    /// Read from the status
    Input,
    /// Written to the status
    Output,
}

/// A status variable that a model reads or writes
#[derive(Debug, Eq, PartialEq, Clone, Hash, Serialize, Deserialize)]
pub struct RequirementDefinition {
    pub name: String,
    pub unit: String,
    pub requirement_type: RequirementType,
}

impl RequirementDefinition {
    pub fn new(name: &str, unit: &str, requirement_type: RequirementType) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            requirement_type,
        }
    }

    pub fn input(variable: &StaticVariableDefinition) -> Self {
        Self::new(variable.name, variable.unit, RequirementType::Input)
    }

    pub fn output(variable: &StaticVariableDefinition) -> Self {
        Self::new(variable.name, variable.unit, RequirementType::Output)
    }
}

/// A model of one biophysical process
///
/// Implementors are parameter holders: they are immutable once built and can be shared
/// between threads. All per-object state lives in the [`Status`](crate::status::Status).
pub trait ProcessModel: Debug + Send + Sync {
    /// Name of the concrete model, e.g. `"Monteith"`
    fn name(&self) -> &'static str;

    /// Process simulated by this model
    fn process(&self) -> Process;

    /// Variables read and written by this model alone
    fn definitions(&self) -> Vec<RequirementDefinition>;

    /// Processes this model calls itself while it runs
    ///
    /// For example an energy balance that iterates on leaf temperature calls the
    /// photosynthesis model at each iteration. Nested processes are never run on their
    /// own when the whole object is simulated.
    fn nested_processes(&self) -> Vec<Process> {
        vec![]
    }

    fn input_names(&self) -> Vec<String> {
        self.definitions()
            .into_iter()
            .filter(|d| d.requirement_type == RequirementType::Input)
            .map(|d| d.name)
            .collect()
    }

    fn output_names(&self) -> Vec<String> {
        self.definitions()
            .into_iter()
            .filter(|d| d.requirement_type == RequirementType::Output)
            .map(|d| d.name)
            .collect()
    }
}

/// Union of the inputs of all the models
pub fn inputs(models: &[&dyn ProcessModel]) -> BTreeSet<String> {
    models.iter().flat_map(|m| m.input_names()).collect()
}

/// Union of the outputs of all the models
pub fn outputs(models: &[&dyn ProcessModel]) -> BTreeSet<String> {
    models.iter().flat_map(|m| m.output_names()).collect()
}

/// Union of every variable read or written by the models
pub fn variables(models: &[&dyn ProcessModel]) -> BTreeSet<String> {
    inputs(models).union(&outputs(models)).cloned().collect()
}

/// Variables that must be supplied before simulating the models together
///
/// This is `inputs − outputs`: a variable read by one model is not required if any other
/// model in the set computes it, regardless of declaration order.
pub fn to_initialize(models: &[&dyn ProcessModel]) -> BTreeSet<String> {
    let outputs = outputs(models);
    inputs(models)
        .into_iter()
        .filter(|name| !outputs.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard_variables::{VAR_A, VAR_CS, VAR_GS, VAR_PPFD, VAR_RS, VAR_TL};

    #[derive(Debug)]
    struct LeafTemperature;

    impl ProcessModel for LeafTemperature {
        fn name(&self) -> &'static str {
            "LeafTemperature"
        }

        fn process(&self) -> Process {
            Process::EnergyBalance
        }

        fn definitions(&self) -> Vec<RequirementDefinition> {
            vec![
                RequirementDefinition::input(&VAR_RS),
                RequirementDefinition::input(&VAR_A),
                RequirementDefinition::output(&VAR_TL),
            ]
        }
    }

    #[derive(Debug)]
    struct Assimilation;

    impl ProcessModel for Assimilation {
        fn name(&self) -> &'static str {
            "Assimilation"
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
            ]
        }
    }

    #[test]
    fn test_input_output_names() {
        let model = Assimilation;
        assert_eq!(model.input_names(), vec!["PPFD", "Tl", "Cs"]);
        assert_eq!(model.output_names(), vec!["A", "Gs"]);
    }

    #[test]
    fn test_to_initialize_drops_coupled_variables() {
        let alone = to_initialize(&[&Assimilation]);
        assert!(alone.contains(VAR_TL.name));

        let coupled = to_initialize(&[&LeafTemperature, &Assimilation]);
        assert!(!coupled.contains(VAR_TL.name));
        assert!(!coupled.contains(VAR_A.name));
        assert_eq!(
            coupled,
            BTreeSet::from(["Cs".to_string(), "PPFD".to_string(), "Rs".to_string()])
        );
    }

    #[test]
    fn test_to_initialize_is_order_independent() {
        assert_eq!(
            to_initialize(&[&LeafTemperature, &Assimilation]),
            to_initialize(&[&Assimilation, &LeafTemperature])
        );
    }

    #[test]
    fn test_variables_is_union() {
        let all = variables(&[&LeafTemperature, &Assimilation]);
        assert_eq!(all.len(), 6);
        assert!(all.contains(VAR_TL.name));
    }

    #[test]
    fn test_empty_set() {
        assert!(to_initialize(&[]).is_empty());
    }

    #[test]
    fn test_process_display() {
        assert_eq!(Process::EnergyBalance.to_string(), "energy_balance");
        assert_eq!(
            serde_json::to_string(&Process::StomatalConductance).unwrap(),
            "\"stomatal_conductance\""
        );
    }
}
