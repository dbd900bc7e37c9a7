//! Photosynthesis models
//!
//! # Inputs
//!
//! - `PPFD` (umol m-2 s-1) - Absorbed photon flux
//! - `Tl` (°C) - Leaf temperature
//! - `Cs` (ppm) - CO2 at the leaf surface, for the coupled models
//! - `Ci` (ppm) - Intercellular CO2, for [`FvcbRaw`]
//!
//! # Outputs
//!
//! - `A` (umol m-2 s-1) - Net assimilation
//! - `Gs` (mol m-2 s-1) - Stomatal conductance, for the coupled models
//! - `Ci` (ppm) - Intercellular CO2, for the coupled models
//!
//! The coupled models ([`Fvcb`], [`FvcbIter`], [`ConstantAGs`]) call the stomatal
//! conductance model bound to the same object themselves.

mod constant;
mod fvcb;
mod fvcb_iter;

pub use constant::{ConstantA, ConstantAGs};
pub use fvcb::{
    arrhenius, arrhenius_peaked, electron_transport, Fvcb, FvcbParameters, FvcbRates, FvcbRaw,
};
pub use fvcb_iter::FvcbIter;

use super::stomatal_conductance::StomatalConductanceModel;
use crate::model_list::ProcessModels;
use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::Process;
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::{BiophysError, BiophysResult};
use plantbiophys_core::numerics::Convergence;
use plantbiophys_core::status::Status;

/// Stomatal conductance model a coupled photosynthesis model relies on
fn stomatal_model<'a>(
    models: &'a ProcessModels,
    model: &str,
) -> BiophysResult<&'a StomatalConductanceModel> {
    models
        .stomatal_conductance
        .as_ref()
        .ok_or_else(|| BiophysError::MissingProcess {
            model: model.to_string(),
            process: Process::StomatalConductance,
        })
}

process_model_enum!(
    /// Models available for the photosynthesis process
    PhotosynthesisModel,
    Process::Photosynthesis,
    { FvcbRaw, Fvcb, FvcbIter, ConstantA, ConstantAGs }
);

impl PhotosynthesisModel {
    /// Compute the assimilation for one time step
    ///
    /// Returns the convergence of the iterative models, `None` for the closed-form ones.
    pub fn run(
        &self,
        models: &ProcessModels,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<Option<Convergence>> {
        match self {
            PhotosynthesisModel::FvcbRaw(model) => model.run(status, constants).map(|_| None),
            PhotosynthesisModel::Fvcb(model) => {
                model.run(models, status, meteo, constants).map(|_| None)
            }
            PhotosynthesisModel::FvcbIter(model) => {
                model.run(models, status, meteo, constants).map(Some)
            }
            PhotosynthesisModel::ConstantA(model) => model.run(status).map(|_| None),
            PhotosynthesisModel::ConstantAGs(model) => {
                model.run(models, status, meteo).map(|_| None)
            }
        }
    }
}
