//! Process dispatch: run the models bound to objects against meteorological conditions.
//!
//! Every process has two entry points:
//!
//! - `<process>_mut` updates the status of the objects in place and returns a
//!   [`ConvergenceReport`] of the iterative solves it ran,
//! - `<process>` clones the objects first and returns their updated status, leaving the
//!   inputs untouched. Convenient interactively, but it copies every status table.
//!
//! [`simulate_mut`] and [`simulate`] run all the root processes of the objects, in
//! dependency order.
//!
//! The targets are a single [`ModelList`], a `Vec` of them or a `BTreeMap` of named ones.
//! The conditions are one [`Atmosphere`] shared by every time step, or a [`Weather`] with
//! one atmosphere per time step. A one-step status is repeated to the length of the
//! weather first.
//!
//! Objects and time steps are independent of each other and are run in parallel with
//! rayon. A process without a model bound on an object does nothing for that object.
//!
//! ```rust
//! use plantbiophys_components::components::{Fvcb, Medlyn, Monteith};
//! use plantbiophys_components::model_list::ModelList;
//! use plantbiophys_components::processes::energy_balance_mut;
//! use plantbiophys_core::atmosphere::Atmosphere;
//! use plantbiophys_core::constants::Constants;
//!
//! let mut leaf = ModelList::builder()
//!     .with_energy_balance(Monteith::default())
//!     .with_photosynthesis(Fvcb::default())
//!     .with_stomatal_conductance(Medlyn::new(0.03, 12.0))
//!     .with_status([("Rs", 13.747), ("sky_fraction", 1.0), ("PPFD", 1500.0), ("d", 0.03)])
//!     .build()
//!     .unwrap();
//! let meteo = Atmosphere::new(22.0, 0.8333, 101.325, 0.4490995);
//!
//! let report = energy_balance_mut(&mut leaf, &meteo, &Constants::default()).unwrap();
//! assert!(report.all_converged());
//! assert!(leaf.status()[0]["A"] > 0.0);
//! ```

use crate::model_list::{ModelList, ProcessModels};
use log::debug;
use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{to_initialize, Process};
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::{BiophysError, BiophysResult};
use plantbiophys_core::numerics::ConvergenceReport;
use plantbiophys_core::status::Status;
use plantbiophys_core::timestep_table::TimeStepTable;
use plantbiophys_core::weather::Weather;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Meteorological conditions driving a simulation
#[derive(Debug, Clone, Copy)]
pub enum Meteo<'a> {
    /// The same conditions at every time step
    Single(&'a Atmosphere),
    /// One atmosphere per time step
    Series(&'a Weather),
}

impl<'a> Meteo<'a> {
    /// Number of time steps imposed by the conditions, if any
    pub fn time_steps(&self) -> Option<usize> {
        match self {
            Meteo::Single(_) => None,
            Meteo::Series(weather) => Some(weather.len()),
        }
    }

    /// Conditions at a time step
    pub fn at(&self, step: usize) -> BiophysResult<&'a Atmosphere> {
        match *self {
            Meteo::Single(atmosphere) => Ok(atmosphere),
            Meteo::Series(weather) => weather.get(step).ok_or_else(|| {
                BiophysError::Error(format!(
                    "No meteorological conditions for time step {step}, the weather has {} steps",
                    weather.len()
                ))
            }),
        }
    }
}

impl<'a> From<&'a Atmosphere> for Meteo<'a> {
    fn from(atmosphere: &'a Atmosphere) -> Self {
        Meteo::Single(atmosphere)
    }
}

impl<'a> From<&'a Weather> for Meteo<'a> {
    fn from(weather: &'a Weather) -> Self {
        Meteo::Series(weather)
    }
}

/// Something the process entry points can run on: one object or a collection of them
pub trait SimulationTarget: Clone {
    /// Updated status returned by the non-mutating entry points
    type Output;

    /// Run one process, or all the root processes if `process` is `None`
    fn run(
        &mut self,
        process: Option<Process>,
        meteo: Meteo<'_>,
        constants: &Constants,
    ) -> BiophysResult<ConvergenceReport>;

    fn into_output(self) -> Self::Output;
}

impl SimulationTarget for ModelList {
    type Output = TimeStepTable;

    fn run(
        &mut self,
        process: Option<Process>,
        meteo: Meteo<'_>,
        constants: &Constants,
    ) -> BiophysResult<ConvergenceReport> {
        let (order, to_init) = match process {
            Some(process) => {
                let subtree = self.models().subtree(process);
                if subtree.is_empty() {
                    return Ok(ConvergenceReport::default());
                }
                (vec![process], to_initialize(&subtree))
            }
            None => (self.execution_order()?, self.to_initialize()),
        };
        if order.is_empty() {
            return Ok(ConvergenceReport::default());
        }
        self.check_initialized(&to_init)?;

        if let Some(time_steps) = meteo.time_steps() {
            if time_steps == 0 {
                return Err(BiophysError::Error(
                    "The weather has no time step to simulate".to_string(),
                ));
            }
            self.status_mut().broadcast(time_steps)?;
        }

        let (models, status) = self.split_mut();
        let report = status
            .rows_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(step, status)| -> BiophysResult<ConvergenceReport> {
                let atmosphere = meteo.at(step)?;
                let mut report = ConvergenceReport::default();
                for process in &order {
                    let solved = run_process(models, *process, status, atmosphere, constants)?;
                    report = report.merge(solved);
                }
                Ok(report)
            })
            .try_reduce(ConvergenceReport::default, |a, b| Ok(a.merge(b)))?;

        debug!(
            "Ran {order:?} over {} time steps ({} of {} iterative solves hit their cap)",
            status.len(),
            report.exhausted,
            report.steps
        );
        Ok(report)
    }

    fn into_output(self) -> Self::Output {
        self.into_status()
    }
}

impl SimulationTarget for Vec<ModelList> {
    type Output = Vec<TimeStepTable>;

    fn run(
        &mut self,
        process: Option<Process>,
        meteo: Meteo<'_>,
        constants: &Constants,
    ) -> BiophysResult<ConvergenceReport> {
        self.par_iter_mut()
            .map(|object| object.run(process, meteo, constants))
            .try_reduce(ConvergenceReport::default, |a, b| Ok(a.merge(b)))
    }

    fn into_output(self) -> Self::Output {
        self.into_iter().map(ModelList::into_status).collect()
    }
}

impl SimulationTarget for BTreeMap<String, ModelList> {
    type Output = BTreeMap<String, TimeStepTable>;

    fn run(
        &mut self,
        process: Option<Process>,
        meteo: Meteo<'_>,
        constants: &Constants,
    ) -> BiophysResult<ConvergenceReport> {
        self.par_iter_mut()
            .map(|(_, object)| object.run(process, meteo, constants))
            .try_reduce(ConvergenceReport::default, |a, b| Ok(a.merge(b)))
    }

    fn into_output(self) -> Self::Output {
        self.into_iter()
            .map(|(name, object)| (name, object.into_status()))
            .collect()
    }
}

/// Run the model bound to `process`, if any, for one status
///
/// Reports the iterative solves it ran, including the photosynthesis nested in the
/// energy balance.
fn run_process(
    models: &ProcessModels,
    process: Process,
    status: &mut Status,
    meteo: &Atmosphere,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    let none = ConvergenceReport::default();
    match process {
        Process::LightInterception => match &models.light_interception {
            Some(model) => model.run(status, meteo, constants).map(|_| none),
            None => Ok(none),
        },
        Process::EnergyBalance => match &models.energy_balance {
            Some(model) => model
                .run(models, status, meteo, constants)
                .map(ConvergenceReport::from),
            None => Ok(none),
        },
        Process::Photosynthesis => match &models.photosynthesis {
            Some(model) => model
                .run(models, status, meteo, constants)
                .map(|convergence| convergence.map_or(none, ConvergenceReport::from)),
            None => Ok(none),
        },
        Process::StomatalConductance => match &models.stomatal_conductance {
            Some(model) => model.run(status, meteo).map(|_| none),
            None => Ok(none),
        },
    }
}

fn run_mut<'a, T: SimulationTarget>(
    target: &mut T,
    process: Option<Process>,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    target.run(process, meteo.into(), constants)
}

fn run_copy<'a, T: SimulationTarget>(
    target: &T,
    process: Option<Process>,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<T::Output> {
    let mut target = target.clone();
    target.run(process, meteo.into(), constants)?;
    Ok(target.into_output())
}

/// Compute the light intercepted by the objects, in place
pub fn light_interception_mut<'a, T: SimulationTarget>(
    target: &mut T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    run_mut(target, Some(Process::LightInterception), meteo, constants)
}

/// Compute the light intercepted by copies of the objects
pub fn light_interception<'a, T: SimulationTarget>(
    target: &T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<T::Output> {
    run_copy(target, Some(Process::LightInterception), meteo, constants)
}

/// Solve the energy balance of the objects, in place
///
/// The energy balance runs the photosynthesis and stomatal conductance models it
/// depends on at each of its iterations.
pub fn energy_balance_mut<'a, T: SimulationTarget>(
    target: &mut T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    run_mut(target, Some(Process::EnergyBalance), meteo, constants)
}

/// Solve the energy balance of copies of the objects
pub fn energy_balance<'a, T: SimulationTarget>(
    target: &T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<T::Output> {
    run_copy(target, Some(Process::EnergyBalance), meteo, constants)
}

/// Compute the photosynthesis of the objects, in place
pub fn photosynthesis_mut<'a, T: SimulationTarget>(
    target: &mut T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    run_mut(target, Some(Process::Photosynthesis), meteo, constants)
}

/// Compute the photosynthesis of copies of the objects
pub fn photosynthesis<'a, T: SimulationTarget>(
    target: &T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<T::Output> {
    run_copy(target, Some(Process::Photosynthesis), meteo, constants)
}

/// Compute the stomatal conductance of the objects, in place
pub fn stomatal_conductance_mut<'a, T: SimulationTarget>(
    target: &mut T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    run_mut(target, Some(Process::StomatalConductance), meteo, constants)
}

/// Compute the stomatal conductance of copies of the objects
pub fn stomatal_conductance<'a, T: SimulationTarget>(
    target: &T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<T::Output> {
    run_copy(target, Some(Process::StomatalConductance), meteo, constants)
}

/// Run every root process of the objects in dependency order, in place
pub fn simulate_mut<'a, T: SimulationTarget>(
    target: &mut T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<ConvergenceReport> {
    run_mut(target, None, meteo, constants)
}

/// Run every root process of copies of the objects in dependency order
pub fn simulate<'a, T: SimulationTarget>(
    target: &T,
    meteo: impl Into<Meteo<'a>>,
    constants: &Constants,
) -> BiophysResult<T::Output> {
    run_copy(target, None, meteo, constants)
}
