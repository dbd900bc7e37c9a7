//! Thermodynamic and unit-conversion relationships.
//!
//! These are pure functions of their arguments. Temperatures are in °C and pressures in kPa
//! unless stated otherwise.

use crate::constants::Constants;
use crate::FloatValue;

/// Saturated vapour pressure (kPa) at air temperature `t` (°C)
///
/// Uses the Buck (1981) formulation:
/// $$ e_s = 0.61121 \exp\left(\frac{(18.678 - T/234.5) T}{257.14 + T}\right) $$
pub fn e_sat(t: FloatValue) -> FloatValue {
    0.61121 * ((18.678 - t / 234.5) * t / (257.14 + t)).exp()
}

/// Slope of the saturated vapour pressure curve (kPa K-1)
///
/// Forward difference over 0.1 °C.
pub fn e_sat_slope(t: FloatValue) -> FloatValue {
    (e_sat(t + 0.1) - e_sat(t)) / 0.1
}

/// Vapour pressure (kPa) from temperature (°C) and relative humidity (0-1)
pub fn vapor_pressure(t: FloatValue, rh: FloatValue) -> FloatValue {
    rh * e_sat(t)
}

/// Density of dry air (kg m-3)
pub fn air_density(t: FloatValue, p: FloatValue, constants: &Constants) -> FloatValue {
    p * 1000.0 / (constants.rd * constants.to_kelvin(t))
}

/// Latent heat of vaporization of water (J kg-1)
pub fn latent_heat_vaporization(t: FloatValue, constants: &Constants) -> FloatValue {
    constants.lambda0 - 2.365e3 * t
}

/// Psychrometric constant (kPa K-1)
pub fn psychrometer_constant(
    p: FloatValue,
    lambda: FloatValue,
    constants: &Constants,
) -> FloatValue {
    constants.cp * p / (constants.epsilon * lambda)
}

/// Clear-sky emissivity of the atmosphere (Brutsaert, 1975)
///
/// `e` is the vapour pressure in kPa.
pub fn atmosphere_emissivity(t: FloatValue, e: FloatValue, constants: &Constants) -> FloatValue {
    0.642 * (e * 1000.0 / constants.to_kelvin(t)).powf(1.0 / 7.0)
}

/// Net longwave radiation (W m-2) exchanged between an object at `t_object` and its
/// surroundings at `t_surroundings`
///
/// Both bodies are treated as grey parallel planes. `view_fraction` is the fraction of
/// the object's view occupied by the surroundings (e.g. the sky fraction of a leaf).
/// Positive when the object gains energy.
pub fn net_longwave_radiation(
    t_object: FloatValue,
    t_surroundings: FloatValue,
    emissivity_object: FloatValue,
    emissivity_surroundings: FloatValue,
    view_fraction: FloatValue,
    constants: &Constants,
) -> FloatValue {
    let t_object = constants.to_kelvin(t_object);
    let t_surroundings = constants.to_kelvin(t_surroundings);
    constants.sigma * view_fraction * (t_surroundings.powi(4) - t_object.powi(4))
        / (1.0 / emissivity_object + 1.0 / emissivity_surroundings - 1.0)
}

/// Convert a conductance from m s-1 to mol m-2 s-1
pub fn ms_to_mol(g: FloatValue, t: FloatValue, p: FloatValue, constants: &Constants) -> FloatValue {
    g * p * 1000.0 / (constants.r * constants.to_kelvin(t))
}

/// Convert a conductance from mol m-2 s-1 to m s-1
pub fn mol_to_ms(g: FloatValue, t: FloatValue, p: FloatValue, constants: &Constants) -> FloatValue {
    g * constants.r * constants.to_kelvin(t) / (p * 1000.0)
}
