//! Standard variable definitions.
//!
//! This module defines the status variables read and written by the leaf-scale process
//! models. They are registered at compile time using the [`define_static_variable!`] macro
//! and can be looked up with [`lookup`](crate::variable::lookup).
//!
//! # Available Variables
//!
//! ## Radiation
//! - `VAR_LAI` - Leaf area index
//! - `VAR_PPFD` - Absorbed photosynthetic photon flux density
//! - `VAR_RA_PAR_F`, `VAR_RA_NIR_F` - Absorbed PAR and NIR fluxes
//! - `VAR_RS` - Net shortwave radiation
//! - `VAR_RLL` - Net longwave radiation
//! - `VAR_RN` - Net radiation
//! - `VAR_SKY_FRACTION` - Fraction of the sky seen by the object
//!
//! ## Energy balance
//! - `VAR_D` - Characteristic dimension of the object
//! - `VAR_TL` - Leaf temperature
//! - `VAR_H`, `VAR_LAMBDA_E` - Sensible and latent heat fluxes
//! - `VAR_GBH`, `VAR_GBC` - Boundary-layer conductances for heat and CO2
//! - `VAR_DL` - Leaf-to-air vapour pressure deficit
//! - `VAR_ITER` - Number of iterations of the energy balance
//!
//! ## Gas exchange
//! - `VAR_A` - Net CO2 assimilation
//! - `VAR_GS` - Stomatal conductance for CO2
//! - `VAR_CI`, `VAR_CS` - Intercellular and surface CO2 concentrations
//! - `VAR_PSIL` - Leaf water potential

use crate::define_static_variable;

// ============================================================================
// Radiation
// ============================================================================

define_static_variable!(
    VAR_LAI,
    name = "LAI",
    unit = "m2 m-2",
    description = "Leaf area index",
);

define_static_variable!(
    VAR_PPFD,
    name = "PPFD",
    unit = "umol m-2 s-1",
    description = "Absorbed photosynthetic photon flux density",
);

define_static_variable!(
    VAR_RA_PAR_F,
    name = "Ra_PAR_f",
    unit = "W m-2",
    description = "Absorbed photosynthetically active radiation flux",
);

define_static_variable!(
    VAR_RA_NIR_F,
    name = "Ra_NIR_f",
    unit = "W m-2",
    description = "Absorbed near infra-red radiation flux",
);

define_static_variable!(
    VAR_RS,
    name = "Rs",
    unit = "W m-2",
    description = "Net shortwave radiation (PAR + NIR)",
);

define_static_variable!(
    VAR_RLL,
    name = "Rll",
    unit = "W m-2",
    description = "Net longwave radiation exchanged with the sky",
);

define_static_variable!(
    VAR_RN,
    name = "Rn",
    unit = "W m-2",
    description = "Net radiation (shortwave + longwave)",
);

define_static_variable!(
    VAR_SKY_FRACTION,
    name = "sky_fraction",
    unit = "-",
    description = "Fraction of the sky viewed by the object",
);

// ============================================================================
// Energy balance
// ============================================================================

define_static_variable!(
    VAR_D,
    name = "d",
    unit = "m",
    description = "Characteristic dimension of the object, e.g. leaf width",
);

define_static_variable!(
    VAR_TL,
    name = "Tl",
    unit = "°C",
    description = "Leaf temperature",
);

define_static_variable!(
    VAR_H,
    name = "H",
    unit = "W m-2",
    description = "Sensible heat flux",
);

define_static_variable!(
    VAR_LAMBDA_E,
    name = "lambdaE",
    unit = "W m-2",
    description = "Latent heat flux",
);

define_static_variable!(
    VAR_GBH,
    name = "Gbh",
    unit = "m s-1",
    description = "Boundary-layer conductance for heat, one side",
);

define_static_variable!(
    VAR_GBC,
    name = "Gbc",
    unit = "mol m-2 s-1",
    description = "Boundary-layer conductance for CO2",
);

define_static_variable!(
    VAR_DL,
    name = "Dl",
    unit = "kPa",
    description = "Leaf-to-air vapour pressure deficit",
);

define_static_variable!(
    VAR_ITER,
    name = "iter",
    unit = "-",
    description = "Number of iterations used by the energy balance",
);

// ============================================================================
// Gas exchange
// ============================================================================

define_static_variable!(
    VAR_A,
    name = "A",
    unit = "umol m-2 s-1",
    description = "Net CO2 assimilation rate",
);

define_static_variable!(
    VAR_GS,
    name = "Gs",
    unit = "mol m-2 s-1",
    description = "Stomatal conductance for CO2",
);

define_static_variable!(
    VAR_CI,
    name = "Ci",
    unit = "ppm",
    description = "Intercellular CO2 concentration",
);

define_static_variable!(
    VAR_CS,
    name = "Cs",
    unit = "ppm",
    description = "CO2 concentration at the leaf surface",
);

define_static_variable!(
    VAR_PSIL,
    name = "Psil",
    unit = "MPa",
    description = "Leaf water potential",
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::lookup;

    #[test]
    fn test_standard_variables_are_registered() {
        for var in [&VAR_TL, &VAR_A, &VAR_GS, &VAR_CS, &VAR_PPFD, &VAR_RS] {
            let found = lookup(var.name).expect("standard variable should be registered");
            assert_eq!(found.unit, var.unit);
        }
    }
}
