//! Physical constants shared by all process models.
//!
//! Constants are passed explicitly to every computation rather than read from globals,
//! so a simulation can be rerun with e.g. a different specific heat without recompiling.

use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Physical constants used by the atmosphere and the process models.
///
/// # Default Values
///
/// Values follow Monteith & Unsworth (2013) and Jones (1992).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    /// Absolute zero
    /// unit: °C
    /// default: -273.15
    pub k0: FloatValue,

    /// Stefan-Boltzmann constant
    /// unit: W m-2 K-4
    /// default: 5.670373e-8
    pub sigma: FloatValue,

    /// Specific heat of air at constant pressure
    /// unit: J K-1 kg-1
    /// default: 1013.0
    pub cp: FloatValue,

    /// Ratio of molecular weights of water vapour and dry air
    /// unit: -
    /// default: 0.622
    pub epsilon: FloatValue,

    /// Latent heat of vaporization of water at 0 °C
    /// unit: J kg-1
    /// default: 2.501e6
    pub lambda0: FloatValue,

    /// Universal gas constant
    /// unit: J mol-1 K-1
    /// default: 8.314
    pub r: FloatValue,

    /// Gas constant of dry air
    /// unit: J kg-1 K-1
    /// default: 287.0586
    pub rd: FloatValue,

    /// Molecular diffusivity of heat at 0 °C
    /// unit: m2 s-1
    /// default: 21.5e-6
    pub dh0: FloatValue,

    /// Ratio of boundary-layer conductance for water vapour over heat
    /// default: 1.075
    pub gbh_to_gbw: FloatValue,

    /// Ratio of stomatal conductance for water vapour over CO2
    /// default: 1.57
    pub gsc_to_gsw: FloatValue,

    /// Ratio of boundary-layer conductance for heat over CO2
    /// default: 1.32
    pub gbc_to_gbh: FloatValue,

    /// Conversion from PAR energy to photon flux
    /// unit: umol J-1
    /// default: 4.57
    pub j_to_umol: FloatValue,

    /// Fraction of shortwave radiation that is photosynthetically active
    /// default: 0.48
    pub par_fraction: FloatValue,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            k0: -273.15,
            sigma: 5.670373e-8,
            cp: 1013.0,
            epsilon: 0.622,
            lambda0: 2.501e6,
            r: 8.314,
            rd: 287.0586,
            dh0: 21.5e-6,
            gbh_to_gbw: 1.075,
            gsc_to_gsw: 1.57,
            gbc_to_gbh: 1.32,
            j_to_umol: 4.57,
            par_fraction: 0.48,
        }
    }
}

impl Constants {
    /// Convert a temperature from °C to K
    pub fn to_kelvin(&self, t: FloatValue) -> FloatValue {
        t - self.k0
    }
}
