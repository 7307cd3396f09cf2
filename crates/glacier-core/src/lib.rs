//! Glacier shape and flow evolution.
//!
//! A parametric, empirically tuned model of a valley glacier: ice thickness
//! along the valley, the internal velocity field, and the relaxation of the
//! glacier toward the equilibrium shape set by the climate.

pub mod climate;
pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod glacier;
pub mod model;
pub mod observer;
pub mod valley;

pub use climate::{Climate, ClimateParams, ClimateSource};
pub use clock::{ClockEvent, SimClock};
pub use config::{ClimateChange, SimConfig};
pub use error::GlacierError;
pub use geometry::{Point, Vector2};
pub use glacier::{Glacier, GlacierEvent, ProfileSample};
pub use model::{GlacierModel, GlacierSnapshot};
pub use observer::{ListenerId, Observers};
pub use valley::{Terrain, Valley};
