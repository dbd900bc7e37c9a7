//! Variable values of one simulated object at one instant.
//!
//! A [`Status`] holds every variable read or written by the models bound to an object.
//! Variables nobody has set yet hold the [`UNINITIALIZED`] sentinel, which lets a
//! simulation check up front that everything it needs was supplied.
//!
//! Process models receive the status as `&mut Status` and write their outputs in place,
//! so models called one after the other within a step see each other's writes.
//! Cloning a status gives an independent copy.

use crate::component::{variables, ProcessModel};
use crate::errors::{BiophysError, BiophysResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

/// Sentinel marking a variable that has not been initialised
pub const UNINITIALIZED: FloatValue = FloatValue::NEG_INFINITY;

/// Mutable record of variable values for one object at one time step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    values: BTreeMap<String, FloatValue>,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a status with every variable set to [`UNINITIALIZED`]
    pub fn with_variables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: names
                .into_iter()
                .map(|name| (name.into(), UNINITIALIZED))
                .collect(),
        }
    }

    /// Get the value of a variable
    ///
    /// Returns an error if the variable is not part of this status.
    pub fn get(&self, name: &str) -> BiophysResult<FloatValue> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| self.unknown_variable(name))
    }

    /// Set the value of an existing variable
    ///
    /// The set of variables is fixed when the status is built, so writing to an
    /// unknown name is an error rather than an insertion.
    pub fn set(&mut self, name: &str, value: FloatValue) -> BiophysResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.unknown_variable(name)),
        }
    }

    /// Add a variable, or overwrite it if it already exists
    pub fn insert(&mut self, name: &str, value: FloatValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True if the variable is absent or still holds the sentinel
    pub fn is_uninitialized(&self, name: &str) -> bool {
        self.values
            .get(name)
            .map_or(true, |value| *value == UNINITIALIZED)
    }

    /// Names among `names` that are still uninitialised, in order
    pub fn uninitialized<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .filter(|name| self.is_uninitialized(name))
            .cloned()
            .collect()
    }

    /// Variable names, sorted
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FloatValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same variable names as `other`
    pub fn has_same_variables(&self, other: &Status) -> bool {
        self.values.len() == other.values.len() && self.names().eq(other.names())
    }

    fn unknown_variable(&self, name: &str) -> BiophysError {
        BiophysError::UnknownVariable {
            variable: name.to_string(),
            known: self.names().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

impl Index<&str> for Status {
    type Output = FloatValue;

    /// # Panics
    /// Panics if the variable is not found in the status.
    fn index(&self, name: &str) -> &Self::Output {
        self.values
            .get(name)
            .unwrap_or_else(|| panic!("No variable '{}' in status", name))
    }
}

impl FromIterator<(String, FloatValue)> for Status {
    fn from_iter<I: IntoIterator<Item = (String, FloatValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Build a status for a set of models
///
/// Every input and output of the models is present and set to [`UNINITIALIZED`], then
/// `overrides` are applied. Overriding a variable that none of the models declares is an
/// error: it is almost always a typo in the configuration.
pub fn init_status<I, S>(models: &[&dyn ProcessModel], overrides: I) -> BiophysResult<Status>
where
    I: IntoIterator<Item = (S, FloatValue)>,
    S: AsRef<str>,
{
    let mut status = Status::with_variables(variables(models));
    for (name, value) in overrides {
        status.set(name.as_ref(), value)?;
    }
    Ok(status)
}

/// True if none of `to_init` still holds the sentinel in `status`
pub fn is_initialized(status: &Status, to_init: &BTreeSet<String>) -> bool {
    to_init.iter().all(|name| !status.is_uninitialized(name))
}
