//! Leaf-scale process models and their coupling.
//!
//! - [`components`]: the models of each process (light interception, energy balance,
//!   photosynthesis, stomatal conductance)
//! - [`model_list`]: the models bound to one simulated object, with its status
//! - [`processes`]: the entry points that run the models on objects
pub mod components;
pub mod model_list;
pub mod processes;
