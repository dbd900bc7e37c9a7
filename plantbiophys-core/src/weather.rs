use crate::atmosphere::{Atmosphere, MeteoRecord};
use crate::constants::Constants;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

/// An ordered sequence of [`Atmosphere`] records, one per time step
///
/// Metadata is free-form (site name, file of origin, time zone...) and is not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    data: Vec<Atmosphere>,
    metadata: BTreeMap<String, String>,
}

impl Weather {
    pub fn new(data: Vec<Atmosphere>) -> Self {
        Self {
            data,
            metadata: BTreeMap::new(),
        }
    }

    /// Build the weather from raw records, deriving each time step's atmosphere
    pub fn from_records(records: Vec<MeteoRecord>, constants: &Constants) -> Self {
        records
            .into_iter()
            .map(|record| Atmosphere::from_record(record, constants))
            .collect()
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn get(&self, index: usize) -> Option<&Atmosphere> {
        self.data.get(index)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atmosphere> {
        self.data.iter()
    }
}

impl Index<usize> for Weather {
    type Output = Atmosphere;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl FromIterator<Atmosphere> for Weather {
    fn from_iter<I: IntoIterator<Item = Atmosphere>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Atmosphere> for Weather {
    fn from(value: Atmosphere) -> Self {
        Self::new(vec![value])
    }
}
