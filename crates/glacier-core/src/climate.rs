//! Climate: air temperature, snowfall and the equilibrium-line altitude.
//!
//! The mass balance at an elevation is accumulation (snowfall growing with
//! elevation) minus ablation (a degree-day melt term). The ELA is where the
//! two cancel. Parameters live in `Cell`s so the climate can be shared with
//! the glacier through an `Rc` and still be adjusted by its owner.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::GlacierError;
use crate::observer::{ListenerId, Observers};

/// Sea-level air temperature of the modern climate (°C).
pub const MODERN_SEA_LEVEL_TEMPERATURE: f64 = 19.0;
/// Temperature drop per metre of elevation (°C/m).
pub const LAPSE_RATE: f64 = 0.0065;
/// Melt per degree above freezing (metres of ice per year per °C).
pub const ABLATION_PER_DEGREE: f64 = 2.0;
/// Elevation over which accumulation grows by one reference snowfall (m).
pub const ACCUMULATION_SCALE_HEIGHT: f64 = 1000.0;
/// Bracket searched for the ELA (m).
pub const MIN_ELA_SEARCH: f64 = 0.0;
pub const MAX_ELA_SEARCH: f64 = 10_000.0;

const ELA_BISECTION_STEPS: usize = 50;

/// Read-only climate queries plus the change notification the glacier
/// listens to.
pub trait ClimateSource {
    /// Current equilibrium-line altitude (m).
    fn ela(&self) -> f64;

    /// Air temperature at `elevation` (°C).
    fn temperature(&self, elevation: f64) -> f64;

    /// Register a payload-free listener for temperature/snowfall changes.
    fn subscribe(&self, listener: Rc<dyn Fn()>) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Serializable climate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateParams {
    /// Temperature relative to the modern climate (°C).
    pub temperature_offset: f64,
    /// Snowfall at the reference elevation (m/yr).
    pub snowfall: f64,
    /// Elevation at which `snowfall` applies (m).
    pub snowfall_reference_elevation: f64,
}

impl Default for ClimateParams {
    /// Modern climate; ELA ≈ 2900 m.
    fn default() -> Self {
        Self {
            temperature_offset: 0.0,
            snowfall: 0.8,
            snowfall_reference_elevation: 3500.0,
        }
    }
}

impl ClimateParams {
    pub fn validate(&self) -> Result<(), GlacierError> {
        check_finite("temperature_offset", self.temperature_offset)?;
        check_snowfall(self.snowfall)?;
        check_finite("snowfall_reference_elevation", self.snowfall_reference_elevation)
    }
}

/// Snowfall-and-temperature climate model.
pub struct Climate {
    temperature_offset: Cell<f64>,
    snowfall: Cell<f64>,
    snowfall_reference_elevation: Cell<f64>,
    listeners: Observers<dyn Fn()>,
}

impl Climate {
    pub fn from_params(params: ClimateParams) -> Result<Self, GlacierError> {
        params.validate()?;
        Ok(Self {
            temperature_offset: Cell::new(params.temperature_offset),
            snowfall: Cell::new(params.snowfall),
            snowfall_reference_elevation: Cell::new(params.snowfall_reference_elevation),
            listeners: Observers::new(),
        })
    }

    pub fn params(&self) -> ClimateParams {
        ClimateParams {
            temperature_offset: self.temperature_offset.get(),
            snowfall: self.snowfall.get(),
            snowfall_reference_elevation: self.snowfall_reference_elevation.get(),
        }
    }

    pub fn temperature_offset(&self) -> f64 {
        self.temperature_offset.get()
    }

    pub fn snowfall(&self) -> f64 {
        self.snowfall.get()
    }

    pub fn snowfall_reference_elevation(&self) -> f64 {
        self.snowfall_reference_elevation.get()
    }

    pub fn set_temperature_offset(&self, value: f64) -> Result<(), GlacierError> {
        check_finite("temperature_offset", value)?;
        self.update(&self.temperature_offset, value, "temperature_offset");
        Ok(())
    }

    pub fn set_snowfall(&self, value: f64) -> Result<(), GlacierError> {
        check_snowfall(value)?;
        self.update(&self.snowfall, value, "snowfall");
        Ok(())
    }

    pub fn set_snowfall_reference_elevation(&self, value: f64) -> Result<(), GlacierError> {
        check_finite("snowfall_reference_elevation", value)?;
        self.update(&self.snowfall_reference_elevation, value, "snowfall_reference_elevation");
        Ok(())
    }

    /// Snow accumulation at `elevation` (m/yr of ice).
    pub fn accumulation(&self, elevation: f64) -> f64 {
        let rel = (elevation - self.snowfall_reference_elevation.get()) / ACCUMULATION_SCALE_HEIGHT;
        (self.snowfall.get() * (1.0 + rel)).max(0.0)
    }

    /// Melt at `elevation` (m/yr of ice).
    pub fn ablation(&self, elevation: f64) -> f64 {
        (ABLATION_PER_DEGREE * self.temperature(elevation)).max(0.0)
    }

    /// Net mass balance at `elevation`; positive above the ELA.
    pub fn glacial_budget(&self, elevation: f64) -> f64 {
        self.accumulation(elevation) - self.ablation(elevation)
    }

    fn update(&self, cell: &Cell<f64>, value: f64, name: &str) {
        if cell.get() == value {
            return;
        }
        cell.set(value);
        log::debug!("climate {name} = {value}, ELA now {:.1} m", self.ela());
        for listener in self.listeners.snapshot() {
            listener();
        }
    }
}

impl Default for Climate {
    fn default() -> Self {
        let p = ClimateParams::default();
        Self {
            temperature_offset: Cell::new(p.temperature_offset),
            snowfall: Cell::new(p.snowfall),
            snowfall_reference_elevation: Cell::new(p.snowfall_reference_elevation),
            listeners: Observers::new(),
        }
    }
}

impl ClimateSource for Climate {
    fn ela(&self) -> f64 {
        // Budget is non-decreasing in elevation.
        let (mut lo, mut hi) = (MIN_ELA_SEARCH, MAX_ELA_SEARCH);
        if self.glacial_budget(lo) >= 0.0 {
            return lo;
        }
        if self.glacial_budget(hi) <= 0.0 {
            return hi;
        }
        for _ in 0..ELA_BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.glacial_budget(mid) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    fn temperature(&self, elevation: f64) -> f64 {
        MODERN_SEA_LEVEL_TEMPERATURE + self.temperature_offset.get() - LAPSE_RATE * elevation
    }

    fn subscribe(&self, listener: Rc<dyn Fn()>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), GlacierError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GlacierError::InvalidClimate { name, value })
    }
}

fn check_snowfall(value: f64) -> Result<(), GlacierError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GlacierError::InvalidClimate { name: "snowfall", value })
    }
}
