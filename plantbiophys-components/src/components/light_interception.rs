//! Light interception models
//!
//! These turn the incident radiation of the [`Atmosphere`] into the radiation absorbed by
//! an object. They are closed-form and carry no state between time steps.
//!
//! # Inputs
//!
//! - `LAI` (m2 m-2) - Leaf area index
//!
//! # Outputs
//!
//! - `PPFD` (umol m-2 s-1) - Photosynthetic photon flux density
//! - `Ra_PAR_f`, `Ra_NIR_f`, `Rs` (W m-2) - Absorbed fluxes, [`BeerShortwave`] only

use plantbiophys_core::atmosphere::Atmosphere;
use plantbiophys_core::component::{Process, ProcessModel, RequirementDefinition};
use plantbiophys_core::constants::Constants;
use plantbiophys_core::errors::{BiophysError, BiophysResult};
use plantbiophys_core::standard_variables::{VAR_LAI, VAR_PPFD, VAR_RA_NIR_F, VAR_RA_PAR_F, VAR_RS};
use plantbiophys_core::status::Status;
use plantbiophys_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Incident PAR (W m-2), falling back on a fixed fraction of the shortwave flux
fn incident_par(
    model: &str,
    meteo: &Atmosphere,
    constants: &Constants,
) -> BiophysResult<FloatValue> {
    meteo
        .ri_par_f
        .or_else(|| meteo.ri_sw_f.map(|sw| sw * constants.par_fraction))
        .ok_or_else(|| BiophysError::MissingMeteo {
            model: model.to_string(),
            variable: "Ri_PAR_f".to_string(),
        })
}

/// Incident NIR (W m-2), falling back on `Ri_SW_f - Ri_PAR_f`
fn incident_nir(model: &str, meteo: &Atmosphere, par: FloatValue) -> BiophysResult<FloatValue> {
    meteo
        .ri_nir_f
        .or_else(|| meteo.ri_sw_f.map(|sw| sw - par))
        .ok_or_else(|| BiophysError::MissingMeteo {
            model: model.to_string(),
            variable: "Ri_NIR_f".to_string(),
        })
}

/// Beer-Lambert extinction of PAR through the foliage
///
/// $$ PPFD = R_{i,PAR} \cdot e^{-k \cdot LAI} \cdot J_{to\_umol} $$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Beer {
    /// Extinction coefficient
    /// unit: -
    /// default: 0.5
    pub k: FloatValue,
}

impl Default for Beer {
    fn default() -> Self {
        Self { k: 0.5 }
    }
}

impl Beer {
    pub fn new(k: FloatValue) -> Self {
        Self { k }
    }

    pub fn calculate_ppfd(
        &self,
        ri_par_f: FloatValue,
        lai: FloatValue,
        constants: &Constants,
    ) -> FloatValue {
        ri_par_f * (-self.k * lai).exp() * constants.j_to_umol
    }

    fn run(
        &self,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<()> {
        let par = incident_par(self.name(), meteo, constants)?;
        let lai = status.get(VAR_LAI.name)?;
        status.set(VAR_PPFD.name, self.calculate_ppfd(par, lai, constants))
    }
}

impl ProcessModel for Beer {
    fn name(&self) -> &'static str {
        "Beer"
    }

    fn process(&self) -> Process {
        Process::LightInterception
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_LAI),
            RequirementDefinition::output(&VAR_PPFD),
        ]
    }
}

/// Beer-Lambert absorption of PAR and NIR with separate extinction coefficients
///
/// Absorbed fluxes are $R_a = R_i (1 - e^{-k \cdot LAI})$ for each waveband, the net
/// shortwave radiation is their sum and the PPFD is the absorbed PAR in photons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeerShortwave {
    /// Extinction coefficient for PAR
    /// unit: -
    /// default: 0.5
    pub k_par: FloatValue,

    /// Extinction coefficient for NIR
    /// unit: -
    /// default: 0.4
    pub k_nir: FloatValue,
}

impl Default for BeerShortwave {
    fn default() -> Self {
        Self {
            k_par: 0.5,
            k_nir: 0.4,
        }
    }
}

impl BeerShortwave {
    pub fn new(k_par: FloatValue, k_nir: FloatValue) -> Self {
        Self { k_par, k_nir }
    }

    fn run(
        &self,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<()> {
        let par = incident_par(self.name(), meteo, constants)?;
        let nir = incident_nir(self.name(), meteo, par)?;
        let lai = status.get(VAR_LAI.name)?;

        let ra_par = par * (1.0 - (-self.k_par * lai).exp());
        let ra_nir = nir * (1.0 - (-self.k_nir * lai).exp());

        status.set(VAR_RA_PAR_F.name, ra_par)?;
        status.set(VAR_RA_NIR_F.name, ra_nir)?;
        status.set(VAR_RS.name, ra_par + ra_nir)?;
        status.set(VAR_PPFD.name, ra_par * constants.j_to_umol)
    }
}

impl ProcessModel for BeerShortwave {
    fn name(&self) -> &'static str {
        "BeerShortwave"
    }

    fn process(&self) -> Process {
        Process::LightInterception
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::input(&VAR_LAI),
            RequirementDefinition::output(&VAR_PPFD),
            RequirementDefinition::output(&VAR_RA_PAR_F),
            RequirementDefinition::output(&VAR_RA_NIR_F),
            RequirementDefinition::output(&VAR_RS),
        ]
    }
}

/// No light interception at all
///
/// Used for objects that do not see any light, so that simulating them is free.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ignore {}

impl ProcessModel for Ignore {
    fn name(&self) -> &'static str {
        "Ignore"
    }

    fn process(&self) -> Process {
        Process::LightInterception
    }

    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![]
    }
}

process_model_enum!(
    /// Models available for the light interception process
    LightInterceptionModel,
    Process::LightInterception,
    { Beer, BeerShortwave, Ignore }
);

impl LightInterceptionModel {
    /// Compute the light intercepted during one time step
    pub fn run(
        &self,
        status: &mut Status,
        meteo: &Atmosphere,
        constants: &Constants,
    ) -> BiophysResult<()> {
        match self {
            LightInterceptionModel::Beer(model) => model.run(status, meteo, constants),
            LightInterceptionModel::BeerShortwave(model) => model.run(status, meteo, constants),
            LightInterceptionModel::Ignore(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use plantbiophys_core::status::init_status;

    fn sunny() -> Atmosphere {
        Atmosphere::new(25.0, 1.0, 101.325, 0.6).with_radiation(Some(300.0), Some(250.0), None)
    }

    #[test]
    fn test_beer_ppfd() {
        let constants = Constants::default();
        let model = LightInterceptionModel::from(Beer::new(0.6));
        let mut status = init_status(&[&model], [("LAI", 2.0)]).unwrap();

        model.run(&mut status, &sunny(), &constants).unwrap();

        assert_relative_eq!(
            status["PPFD"],
            300.0 * (-1.2_f64).exp() * 4.57,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_beer_without_leaves_transmits_everything() {
        let constants = Constants::default();
        let ppfd = Beer::new(0.6).calculate_ppfd(300.0, 0.0, &constants);
        assert_relative_eq!(ppfd, 300.0 * constants.j_to_umol);
    }

    #[test]
    fn test_beer_missing_par() {
        let model = LightInterceptionModel::from(Beer::default());
        let mut status = init_status(&[&model], [("LAI", 2.0)]).unwrap();
        let err = model
            .run(&mut status, &Atmosphere::new(25.0, 1.0, 101.325, 0.6), &Constants::default())
            .unwrap_err();

        assert_eq!(
            err,
            BiophysError::MissingMeteo {
                model: "Beer".to_string(),
                variable: "Ri_PAR_f".to_string()
            }
        );
    }

    #[test]
    fn test_beer_par_from_shortwave() {
        let constants = Constants::default();
        let model = LightInterceptionModel::from(Beer::new(0.5));
        let mut status = init_status(&[&model], [("LAI", 0.0)]).unwrap();
        let meteo =
            Atmosphere::new(25.0, 1.0, 101.325, 0.6).with_radiation(None, None, Some(500.0));

        model.run(&mut status, &meteo, &constants).unwrap();
        assert_relative_eq!(status["PPFD"], 500.0 * 0.48 * 4.57, max_relative = 1e-12);
    }

    #[test]
    fn test_beer_shortwave_partitioning() {
        let constants = Constants::default();
        let model = LightInterceptionModel::from(BeerShortwave::new(0.5, 0.4));
        let mut status = init_status(&[&model], [("LAI", 3.0)]).unwrap();

        model.run(&mut status, &sunny(), &constants).unwrap();

        let ra_par = 300.0 * (1.0 - (-1.5_f64).exp());
        let ra_nir = 250.0 * (1.0 - (-1.2_f64).exp());
        assert_relative_eq!(status["Ra_PAR_f"], ra_par, max_relative = 1e-12);
        assert_relative_eq!(status["Ra_NIR_f"], ra_nir, max_relative = 1e-12);
        assert_relative_eq!(status["Rs"], ra_par + ra_nir, max_relative = 1e-12);
        assert_relative_eq!(status["PPFD"], ra_par * 4.57, max_relative = 1e-12);
    }

    #[test]
    fn test_beer_shortwave_nir_from_shortwave() {
        let constants = Constants::default();
        let model = LightInterceptionModel::from(BeerShortwave::new(0.5, 0.5));
        let mut status = init_status(&[&model], [("LAI", 1.0)]).unwrap();
        let meteo = Atmosphere::new(25.0, 1.0, 101.325, 0.6).with_radiation(
            Some(200.0),
            None,
            Some(450.0),
        );

        model.run(&mut status, &meteo, &constants).unwrap();
        assert_relative_eq!(
            status["Ra_NIR_f"],
            250.0 * (1.0 - (-0.5_f64).exp()),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_ignore_declares_nothing() {
        let model = LightInterceptionModel::from(Ignore::default());
        assert!(model.input_names().is_empty());
        assert!(model.output_names().is_empty());

        let mut status = Status::new();
        model
            .run(&mut status, &sunny(), &Constants::default())
            .unwrap();
        assert!(status.is_empty());
    }

    #[test]
    fn test_config_deserialization() {
        let model: LightInterceptionModel =
            serde_json::from_str(r#"{"model": "Beer", "k": 0.7}"#).unwrap();
        assert_eq!(model, LightInterceptionModel::Beer(Beer::new(0.7)));

        let model: LightInterceptionModel = serde_json::from_str(r#"{"model": "Ignore"}"#).unwrap();
        assert_eq!(model.name(), "Ignore");
    }
}
