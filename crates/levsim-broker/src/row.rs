use levsim_portfolio::MarkMap;
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// One market bar: field name -> numeric value, produced upstream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketRow(MarkMap);

impl MarketRow {
    pub fn new(fields: MarkMap) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    pub fn require(&self, field: &str) -> Result<f64, BrokerError> {
        self.get(field).ok_or_else(|| BrokerError::MissingField {
            field: field.to_string(),
        })
    }

    pub fn insert<S: Into<String>>(&mut self, field: S, value: f64) {
        self.0.insert(field.into(), value);
    }

    pub fn marks(&self) -> &MarkMap {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<MarkMap> for MarketRow {
    fn from(m: MarkMap) -> Self {
        Self(m)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for MarketRow {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
