use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourlyCurve(pub BTreeMap<u8, f64>);

impl HourlyCurve {
    pub fn get(&self, hour: u8) -> Option<f64> {
        self.0.get(&hour).copied()
    }

    pub fn hours(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0.iter().map(|(hour, value)| (*hour, *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(u8, f64)> for HourlyCurve {
    fn from_iter<I: IntoIterator<Item = (u8, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub curve: HourlyCurve,
    pub best_hour: u8,
    /// Percentage in [0, 100]; `None` when the curve has a zero mean.
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Ready(AnalysisResult),
    NoData,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HourPoint {
    pub hour: u8,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyzeResponse {
    Ready {
        keyword: String,
        best_hour: u8,
        best_hour_label: String,
        confidence: Option<f64>,
        curve: Vec<HourPoint>,
    },
    NoData {
        keyword: String,
    },
}
