//! Scenario configuration, loaded from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::climate::ClimateParams;
use crate::error::GlacierError;
use crate::valley::Valley;

/// A climate adjustment applied once the simulation clock reaches `year`.
/// Unset fields keep their current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateChange {
    pub year: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowfall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowfall_reference_elevation: Option<f64>,
}

/// Everything needed to run a glacier simulation.
/// Defaults describe the modern climate in an alpine valley.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub valley: Valley,
    pub climate: ClimateParams,
    /// Years per clock tick.
    pub dt: f64,
    /// Total simulated years.
    pub years: f64,
    /// Scheduled climate changes, in any order.
    pub changes: Vec<ClimateChange>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            valley: Valley::default(),
            climate: ClimateParams::default(),
            dt: 1.0,
            years: 500.0,
            changes: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(s: &str) -> Result<Self, GlacierError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GlacierError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GlacierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), GlacierError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(GlacierError::InvalidTimeStep(self.dt));
        }
        if !(self.years.is_finite() && self.years >= 0.0) {
            return Err(GlacierError::InvalidConfig(format!("years = {}", self.years)));
        }
        self.climate.validate()?;
        for change in &self.changes {
            if !change.year.is_finite() {
                return Err(GlacierError::InvalidConfig(format!("change year = {}", change.year)));
            }
            let applied = ClimateParams {
                temperature_offset: change.temperature_offset.unwrap_or(self.climate.temperature_offset),
                snowfall: change.snowfall.unwrap_or(self.climate.snowfall),
                snowfall_reference_elevation: change
                    .snowfall_reference_elevation
                    .unwrap_or(self.climate.snowfall_reference_elevation),
            };
            applied.validate()?;
        }
        Ok(())
    }

    /// Number of clock ticks covering `years`.
    pub fn ticks(&self) -> u64 {
        (self.years / self.dt).ceil() as u64
    }

    /// Changes sorted by year.
    pub fn schedule(&self) -> Vec<ClimateChange> {
        let mut changes = self.changes.clone();
        changes.sort_by(|a, b| a.year.total_cmp(&b.year));
        changes
    }
}
