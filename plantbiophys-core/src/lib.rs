//! Core types for coupling leaf-scale biophysical process models.
//!
//! This crate holds everything a process model needs to plug into a simulation: the
//! meteorological drivers ([`atmosphere`], [`weather`]), the variable registry and model
//! contracts ([`variable`], [`component`]), and the per-object state ([`status`],
//! [`timestep_table`]). The models themselves live in `plantbiophys-components`.

pub mod atmosphere;
pub mod component;
pub mod constants;
pub mod errors;
pub mod numerics;
pub mod physics;
pub mod standard_variables;
pub mod status;
pub mod timestep_table;
pub mod variable;
pub mod weather;

/// Floating point type used for every simulated quantity
pub type FloatValue = f64;
