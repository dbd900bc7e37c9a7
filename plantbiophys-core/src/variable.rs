//! Variable registration system.
//!
//! Every variable a process model can read from or write to a [`Status`](crate::status::Status)
//! is defined once, with its unit and a description, using [`define_static_variable!`].
//! Definitions are collected at link time with `inventory`, so the registry can be queried
//! (e.g. to document a status table) without any runtime registration step.
//!
//! # Usage
//!
//! ```rust
//! use plantbiophys_core::variable;
//! use plantbiophys_core::standard_variables::VAR_TL;
//!
//! assert_eq!(VAR_TL.name, "Tl");
//!
//! let var = variable::lookup("Tl").unwrap();
//! assert_eq!(var.unit, "°C");
//! ```

use serde::{Deserialize, Serialize};

/// Definition of a status variable with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Unique identifier used as the key in a status (e.g. "Tl")
    pub name: String,
    /// Unit of the variable (e.g. "°C", "umol m-2 s-1")
    pub unit: String,
    /// Human-readable description
    pub description: String,
}

impl VariableDefinition {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            description: description.into(),
        }
    }
}

/// Static variable definition holder for compile-time registration.
///
/// This struct holds `&'static str` references that can be used in const contexts,
/// and provides conversion to [`VariableDefinition`] at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticVariableDefinition {
    /// Variable name
    pub name: &'static str,
    /// Unit
    pub unit: &'static str,
    /// Description
    pub description: &'static str,
}

impl StaticVariableDefinition {
    pub const fn new(name: &'static str, unit: &'static str, description: &'static str) -> Self {
        Self {
            name,
            unit,
            description,
        }
    }

    /// Convert to a [`VariableDefinition`].
    pub fn to_variable_definition(&self) -> VariableDefinition {
        VariableDefinition::new(self.name, self.unit, self.description)
    }
}

inventory::collect!(StaticVariableDefinition);

/// Macro for defining variables at compile time using static strings.
///
/// Variables defined with this macro are registered automatically and can be found
/// with [`lookup`].
///
/// # Usage
///
/// ```rust
/// use plantbiophys_core::define_static_variable;
///
/// define_static_variable!(
///     VAR_LEAF_WATER_CONTENT,
///     name = "LWC",
///     unit = "g m-2",
///     description = "Leaf water content per unit area",
/// );
/// ```
#[macro_export]
macro_rules! define_static_variable {
    (
        $var_name:ident,
        name = $name:expr,
        unit = $unit:expr,
        description = $desc:expr $(,)?
    ) => {
        #[doc = concat!("Static variable definition for ", $name)]
        pub static $var_name: $crate::variable::StaticVariableDefinition =
            $crate::variable::StaticVariableDefinition::new($name, $unit, $desc);

        ::inventory::submit! {
            $crate::variable::StaticVariableDefinition::new($name, $unit, $desc)
        }
    };
}

pub use crate::define_static_variable;

/// Get a variable definition by name
pub fn lookup(name: &str) -> Option<VariableDefinition> {
    inventory::iter::<StaticVariableDefinition>
        .into_iter()
        .find(|var| var.name == name)
        .map(|var| var.to_variable_definition())
}

/// Check if a variable is registered
pub fn is_registered(name: &str) -> bool {
    lookup(name).is_some()
}

/// List all registered variables, sorted by name
pub fn list() -> Vec<VariableDefinition> {
    let mut result: Vec<VariableDefinition> = inventory::iter::<StaticVariableDefinition>
        .into_iter()
        .map(|var| var.to_variable_definition())
        .collect();
    result.sort_by(|a, b| a.name.cmp(&b.name));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    define_static_variable!(
        VAR_TEST_ONLY,
        name = "Test|Only",
        unit = "kg",
        description = "Variable registered by the unit tests",
    );

    #[test]
    fn test_static_definition() {
        assert_eq!(VAR_TEST_ONLY.name, "Test|Only");
        assert_eq!(VAR_TEST_ONLY.unit, "kg");
    }

    #[test]
    fn test_lookup_registered_variable() {
        let var = lookup("Test|Only").expect("variable should be registered");
        assert_eq!(var, VAR_TEST_ONLY.to_variable_definition());
        assert!(is_registered("Test|Only"));
        assert!(!is_registered("Not a variable"));
    }

    #[test]
    fn test_list_is_sorted() {
        let vars = list();
        assert!(vars.len() > 1);
        assert!(vars.windows(2).all(|w| w[0].name <= w[1].name));
    }
}
