//! Coupled leaf biophysics.
//!
//! Re-exports the framework ([`core`]) and the process models with their dispatch
//! ([`components`]) under one crate.
pub use plantbiophys_components as components;
pub use plantbiophys_core as core;

pub use plantbiophys_components::model_list::{InitPolicy, ModelList, ProcessModels};
pub use plantbiophys_components::processes::{
    energy_balance, energy_balance_mut, light_interception, light_interception_mut,
    photosynthesis, photosynthesis_mut, simulate, simulate_mut, stomatal_conductance,
    stomatal_conductance_mut, Meteo,
};
pub use plantbiophys_core::atmosphere::Atmosphere;
pub use plantbiophys_core::constants::Constants;
pub use plantbiophys_core::errors::{BiophysError, BiophysResult};
pub use plantbiophys_core::weather::Weather;
