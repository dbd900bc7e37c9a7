//! Process models, grouped by the process they simulate.
//!
//! Each process has a closed sum type listing its model variants
//! ([`LightInterceptionModel`], [`PhotosynthesisModel`], [`StomatalConductanceModel`],
//! [`EnergyBalanceModel`]). The sum types are what a [`ModelList`](crate::model_list::ModelList)
//! binds and what configuration files deserialize into, using the `model` key as the tag:
//!
//! ```rust
//! use plantbiophys_components::components::StomatalConductanceModel;
//!
//! let model: StomatalConductanceModel =
//!     serde_json::from_str(r#"{"model": "Medlyn", "g0": 0.03, "g1": 12.0}"#).unwrap();
//! assert!(matches!(model, StomatalConductanceModel::Medlyn(_)));
//! ```

/// Declare the sum type of the models of one process
///
/// Generates the internally tagged enum, a `From` conversion for every variant and a
/// [`ProcessModel`](plantbiophys_core::component::ProcessModel) implementation that
/// forwards to the bound variant.
macro_rules! process_model_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $process:expr, { $($variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(tag = "model")]
        pub enum $name {
            $($variant($variant),)+
        }

        $(
            impl From<$variant> for $name {
                fn from(model: $variant) -> Self {
                    $name::$variant(model)
                }
            }
        )+

        impl plantbiophys_core::component::ProcessModel for $name {
            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant(model) => {
                        plantbiophys_core::component::ProcessModel::name(model)
                    })+
                }
            }

            fn process(&self) -> plantbiophys_core::component::Process {
                $process
            }

            fn definitions(&self) -> Vec<plantbiophys_core::component::RequirementDefinition> {
                match self {
                    $($name::$variant(model) => {
                        plantbiophys_core::component::ProcessModel::definitions(model)
                    })+
                }
            }

            fn nested_processes(&self) -> Vec<plantbiophys_core::component::Process> {
                match self {
                    $($name::$variant(model) => {
                        plantbiophys_core::component::ProcessModel::nested_processes(model)
                    })+
                }
            }
        }
    };
}

pub mod energy_balance;
pub mod light_interception;
pub mod photosynthesis;
pub mod stomatal_conductance;

pub use energy_balance::{
    EnergyBalanceConvergence, EnergyBalanceModel, Monteith, MonteithParameters,
};
pub use light_interception::{Beer, BeerShortwave, Ignore, LightInterceptionModel};
pub use photosynthesis::{
    ConstantA, ConstantAGs, Fvcb, FvcbIter, FvcbParameters, FvcbRaw, PhotosynthesisModel,
};
pub use stomatal_conductance::{
    BallBerry, ConstantGs, Medlyn, StomatalClosure, StomatalConductanceModel, Tuzet,
};
