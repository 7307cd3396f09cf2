use std::path::PathBuf;

/// Errors raised while building a valley, climate, clock or scenario.
///
/// The evolution engine itself never fails; these only come out of
/// construction and configuration paths.
#[derive(Debug, thiserror::Error)]
pub enum GlacierError {
    #[error("invalid valley profile: {0}")]
    InvalidValley(String),
    #[error("invalid time step {0} (must be finite and > 0)")]
    InvalidTimeStep(f64),
    #[error("invalid climate parameter `{name}` = {value}")]
    InvalidClimate { name: &'static str, value: f64 },
    #[error("invalid scenario: {0}")]
    InvalidConfig(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}
