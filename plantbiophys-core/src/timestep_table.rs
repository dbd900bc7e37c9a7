//! Status records over several time steps.
//!
//! A [`TimeStepTable`] is an ordered list of [`Status`] rows sharing the same variable
//! names. Rows are independent from each other: a model simulating step `i` only ever
//! touches row `i`.
//!
//! Tables are usually built from user values with [`homogeneous_time_steps`], which
//! broadcasts scalars over the steps given by the longest series.

use crate::errors::{BiophysError, BiophysResult};
use crate::status::Status;
use crate::FloatValue;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// User-supplied value of a variable: one value for all steps, or one per step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Scalar(FloatValue),
    Series(Vec<FloatValue>),
}

impl StatusValue {
    /// Number of time steps this value defines
    pub fn len(&self) -> usize {
        match self {
            StatusValue::Scalar(_) => 1,
            StatusValue::Series(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at time step `step`, broadcasting scalars and single-valued series
    pub fn at(&self, step: usize) -> Option<FloatValue> {
        match self {
            StatusValue::Scalar(value) => Some(*value),
            StatusValue::Series(values) if values.len() == 1 => Some(values[0]),
            StatusValue::Series(values) => values.get(step).copied(),
        }
    }
}

impl From<FloatValue> for StatusValue {
    fn from(value: FloatValue) -> Self {
        StatusValue::Scalar(value)
    }
}

impl From<Vec<FloatValue>> for StatusValue {
    fn from(values: Vec<FloatValue>) -> Self {
        StatusValue::Series(values)
    }
}

impl<const N: usize> From<[FloatValue; N]> for StatusValue {
    fn from(values: [FloatValue; N]) -> Self {
        StatusValue::Series(values.to_vec())
    }
}

/// Ordered sequence of [`Status`] records, one per time step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStepTable {
    rows: Vec<Status>,
}

impl Default for TimeStepTable {
    fn default() -> Self {
        Self::from_status(Status::new())
    }
}

impl TimeStepTable {
    /// Build a table from rows
    ///
    /// All rows must hold the same variables and there must be at least one row.
    pub fn new(rows: Vec<Status>) -> BiophysResult<Self> {
        let first = rows
            .first()
            .ok_or_else(|| BiophysError::Error("A table needs at least one time step".into()))?;
        if let Some(bad) = rows.iter().position(|row| !row.has_same_variables(first)) {
            return Err(BiophysError::Error(format!(
                "Time step {bad} does not hold the same variables as time step 0"
            )));
        }
        Ok(Self { rows })
    }

    /// Single-step table
    pub fn from_status(status: Status) -> Self {
        Self { rows: vec![status] }
    }

    /// Table with `n` copies of `status`
    pub fn repeat(status: &Status, n: usize) -> Self {
        Self {
            rows: vec![status.clone(); n.max(1)],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, step: usize) -> Option<&Status> {
        self.rows.get(step)
    }

    pub fn row_mut(&mut self, step: usize) -> Option<&mut Status> {
        self.rows.get_mut(step)
    }

    pub fn rows(&self) -> &[Status] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Status] {
        &mut self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Status> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Status> {
        self.rows.iter_mut()
    }

    /// Variable names, sorted
    pub fn variables(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.names().cloned().collect())
            .unwrap_or_default()
    }

    /// All the time steps of one variable
    pub fn column(&self, name: &str) -> BiophysResult<Array1<FloatValue>> {
        self.rows
            .iter()
            .map(|row| row.get(name))
            .collect::<BiophysResult<Vec<_>>>()
            .map(Array1::from_vec)
    }

    /// Set one variable at every time step
    pub fn set_column(&mut self, name: &str, value: &StatusValue) -> BiophysResult<()> {
        let n_steps = self.len();
        if value.len() != 1 && value.len() != n_steps {
            return Err(BiophysError::MismatchedLength {
                variable: name.to_string(),
                length: value.len(),
                expected: n_steps,
            });
        }
        for (step, row) in self.rows.iter_mut().enumerate() {
            if let Some(v) = value.at(step) {
                row.set(name, v)?;
            }
        }
        Ok(())
    }

    /// Two-dimensional view with one row per time step and one column per variable
    ///
    /// Columns follow the order of [`TimeStepTable::variables`]. Fails if a time step
    /// lacks one of the variables of the first.
    pub fn to_array(&self) -> BiophysResult<Array2<FloatValue>> {
        let variables = self.variables();
        let values = self
            .rows
            .iter()
            .flat_map(|row| variables.iter().map(move |name| row.get(name)))
            .collect::<BiophysResult<Vec<_>>>()?;
        Array2::from_shape_vec((self.len(), variables.len()), values)
            .map_err(|e| BiophysError::Error(e.to_string()))
    }

    /// Stretch a single-step table to `n_steps` copies of its row
    ///
    /// A table that already has `n_steps` rows is left as is. Any other length is an error.
    pub fn broadcast(&mut self, n_steps: usize) -> BiophysResult<()> {
        if self.len() == n_steps {
            return Ok(());
        }
        if self.len() != 1 {
            return Err(BiophysError::MismatchedLength {
                variable: "status".to_string(),
                length: self.len(),
                expected: n_steps,
            });
        }
        let row = self.rows[0].clone();
        self.rows = vec![row; n_steps];
        Ok(())
    }
}

impl Index<usize> for TimeStepTable {
    type Output = Status;

    fn index(&self, step: usize) -> &Self::Output {
        &self.rows[step]
    }
}

impl IndexMut<usize> for TimeStepTable {
    fn index_mut(&mut self, step: usize) -> &mut Self::Output {
        &mut self.rows[step]
    }
}

impl From<Status> for TimeStepTable {
    fn from(status: Status) -> Self {
        Self::from_status(status)
    }
}

/// Build a table from scalars and same-length series
///
/// The number of time steps is the length of the longest series (1 if there are only
/// scalars). Scalars and single-valued series are repeated at every step. A series of any
/// other length is an error.
///
/// A single step still gives a table, of length 1.
pub fn homogeneous_time_steps<I, S>(values: I) -> BiophysResult<TimeStepTable>
where
    I: IntoIterator<Item = (S, StatusValue)>,
    S: Into<String>,
{
    let values: Vec<(String, StatusValue)> =
        values.into_iter().map(|(k, v)| (k.into(), v)).collect();

    let n_steps = values.iter().map(|(_, v)| v.len()).max().unwrap_or(1).max(1);

    if let Some((name, value)) = values
        .iter()
        .find(|(_, v)| v.len() != 1 && v.len() != n_steps)
    {
        return Err(BiophysError::MismatchedLength {
            variable: name.clone(),
            length: value.len(),
            expected: n_steps,
        });
    }

    let rows = (0..n_steps)
        .map(|step| {
            values
                .iter()
                .filter_map(|(name, value)| value.at(step).map(|v| (name.clone(), v)))
                .collect::<Status>()
        })
        .collect();

    Ok(TimeStepTable { rows })
}
