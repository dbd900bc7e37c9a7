//! Meteorological driving conditions for one time step.
//!
//! An [`Atmosphere`] is built once per time step from a handful of measured variables
//! (air temperature, wind, pressure, humidity, CO2) and derives everything the process
//! models need from them at construction. It is read-only afterwards.
//!
//! Out-of-range wind speed and relative humidity are coerced rather than rejected,
//! with a warning, because weather files routinely contain zero wind or humidity in %.

use crate::constants::Constants;
use crate::physics::{
    air_density, atmosphere_emissivity, e_sat, e_sat_slope, latent_heat_vaporization,
    psychrometer_constant, vapor_pressure,
};
use crate::FloatValue;
use log::warn;
use serde::{Deserialize, Serialize};

/// Default atmospheric pressure (kPa)
pub const DEFAULT_PRESSURE: FloatValue = 101.325;
/// Default atmospheric CO2 concentration (ppm)
pub const DEFAULT_CA: FloatValue = 400.0;
/// Smallest wind speed used when a record reports calm conditions (m s-1)
pub const MIN_WIND: FloatValue = 1e-6;
/// Smallest relative humidity used when a record reports dry air (0-1)
pub const MIN_RH: FloatValue = 1e-4;

fn default_pressure() -> FloatValue {
    DEFAULT_PRESSURE
}

fn default_ca() -> FloatValue {
    DEFAULT_CA
}

fn default_duration() -> FloatValue {
    1.0
}

/// Raw meteorological record for one time step
///
/// This is the shape external weather readers produce. Field names match the usual
/// column names of meteorological files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoRecord {
    /// Air temperature (°C)
    #[serde(rename = "T")]
    pub t: FloatValue,
    /// Wind speed (m s-1)
    #[serde(rename = "Wind")]
    pub wind: FloatValue,
    /// Air pressure (kPa)
    #[serde(rename = "P", default = "default_pressure")]
    pub p: FloatValue,
    /// Relative humidity (0-1)
    #[serde(rename = "Rh")]
    pub rh: FloatValue,
    /// Atmospheric CO2 concentration (ppm)
    #[serde(rename = "Ca", default = "default_ca")]
    pub ca: FloatValue,
    /// Incident photosynthetically active radiation flux (W m-2)
    #[serde(rename = "Ri_PAR_f", default)]
    pub ri_par_f: Option<FloatValue>,
    /// Incident near infra-red radiation flux (W m-2)
    #[serde(rename = "Ri_NIR_f", default)]
    pub ri_nir_f: Option<FloatValue>,
    /// Incident shortwave radiation flux (W m-2)
    #[serde(rename = "Ri_SW_f", default)]
    pub ri_sw_f: Option<FloatValue>,
    /// Duration of the time step (s)
    #[serde(default = "default_duration")]
    pub duration: FloatValue,
}

impl MeteoRecord {
    pub fn new(t: FloatValue, wind: FloatValue, p: FloatValue, rh: FloatValue) -> Self {
        Self {
            t,
            wind,
            p,
            rh,
            ca: DEFAULT_CA,
            ri_par_f: None,
            ri_nir_f: None,
            ri_sw_f: None,
            duration: default_duration(),
        }
    }
}

/// Atmospheric conditions for one time step, including derived quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    /// Air temperature (°C)
    pub t: FloatValue,
    /// Wind speed (m s-1)
    pub wind: FloatValue,
    /// Air pressure (kPa)
    pub p: FloatValue,
    /// Relative humidity (0-1)
    pub rh: FloatValue,
    /// Atmospheric CO2 concentration (ppm)
    pub ca: FloatValue,
    /// Duration of the time step (s)
    pub duration: FloatValue,
    /// Vapour pressure (kPa)
    pub e: FloatValue,
    /// Saturated vapour pressure (kPa)
    pub e_sat: FloatValue,
    /// Vapour pressure deficit (kPa)
    pub vpd: FloatValue,
    /// Air density (kg m-3)
    pub rho: FloatValue,
    /// Latent heat of vaporization (J kg-1)
    pub lambda: FloatValue,
    /// Psychrometric constant (kPa K-1)
    pub gamma: FloatValue,
    /// Atmospheric emissivity (-)
    pub epsilon: FloatValue,
    /// Slope of the saturation vapour pressure curve (kPa K-1)
    pub delta: FloatValue,
    /// Incident PAR flux (W m-2)
    pub ri_par_f: Option<FloatValue>,
    /// Incident NIR flux (W m-2)
    pub ri_nir_f: Option<FloatValue>,
    /// Incident shortwave flux (W m-2)
    pub ri_sw_f: Option<FloatValue>,
}

impl Atmosphere {
    /// Build an atmosphere with `Ca = 400 ppm`, no radiation and a 1 s time step
    pub fn new(t: FloatValue, wind: FloatValue, p: FloatValue, rh: FloatValue) -> Self {
        Self::from_record(MeteoRecord::new(t, wind, p, rh), &Constants::default())
    }

    /// Build an atmosphere from a raw record, computing all derived variables
    pub fn from_record(record: MeteoRecord, constants: &Constants) -> Self {
        let wind = coerce_wind(record.wind);
        let rh = coerce_rh(record.rh);
        let t = record.t;
        let p = record.p;

        let e_sat = e_sat(t);
        let e = vapor_pressure(t, rh);
        let lambda = latent_heat_vaporization(t, constants);

        Self {
            t,
            wind,
            p,
            rh,
            ca: record.ca,
            duration: record.duration,
            e,
            e_sat,
            vpd: e_sat - e,
            rho: air_density(t, p, constants),
            lambda,
            gamma: psychrometer_constant(p, lambda, constants),
            epsilon: atmosphere_emissivity(t, e, constants),
            delta: e_sat_slope(t),
            ri_par_f: record.ri_par_f,
            ri_nir_f: record.ri_nir_f,
            ri_sw_f: record.ri_sw_f,
        }
    }

    /// Copy of this atmosphere with a different CO2 concentration
    pub fn with_ca(self, ca: FloatValue) -> Self {
        Self { ca, ..self }
    }

    /// Copy of this atmosphere with incident radiation fluxes (W m-2)
    pub fn with_radiation(
        self,
        ri_par_f: Option<FloatValue>,
        ri_nir_f: Option<FloatValue>,
        ri_sw_f: Option<FloatValue>,
    ) -> Self {
        Self {
            ri_par_f,
            ri_nir_f,
            ri_sw_f,
            ..self
        }
    }
}

fn coerce_wind(wind: FloatValue) -> FloatValue {
    if wind <= 0.0 {
        warn!("Wind should always be > 0, forcing it to {MIN_WIND} (was {wind})");
        MIN_WIND
    } else {
        wind
    }
}

fn coerce_rh(rh: FloatValue) -> FloatValue {
    if rh > 0.0 && rh <= 1.0 {
        rh
    } else if rh > 1.0 && rh <= 100.0 {
        warn!("Rh should be 0 < Rh <= 1, assuming it is given in % and dividing by 100 (was {rh})");
        rh / 100.0
    } else if rh > 100.0 {
        warn!("Rh should be 0 < Rh <= 1, forcing it to 1 (was {rh})");
        1.0
    } else {
        warn!("Rh should be 0 < Rh <= 1, forcing it to {MIN_RH} (was {rh})");
        MIN_RH
    }
}
