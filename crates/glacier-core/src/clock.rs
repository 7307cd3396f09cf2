/// Simulation clock. Time is measured in years, the unit the glacier's
/// relaxation constants are tuned for.
use crate::error::GlacierError;

/// One clock tick as seen by the glacier and other time-driven consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockEvent {
    /// Simulation time after the tick (years).
    pub simulation_time: f64,
    /// Elapsed simulation time for this tick (years).
    pub simulation_time_change: f64,
}

#[derive(Debug, Clone)]
pub struct SimClock {
    dt: f64,
    time: f64,
    paused: bool,
}

impl SimClock {
    pub fn new(dt: f64) -> Result<Self, GlacierError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(GlacierError::InvalidTimeStep(dt));
        }
        Ok(Self { dt, time: 0.0, paused: false })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn set_dt(&mut self, dt: f64) -> Result<(), GlacierError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(GlacierError::InvalidTimeStep(dt));
        }
        self.dt = dt;
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advance by one step. Returns `None` while paused.
    pub fn tick(&mut self) -> Option<ClockEvent> {
        if self.paused {
            return None;
        }
        self.time += self.dt;
        Some(ClockEvent {
            simulation_time: self.time,
            simulation_time_change: self.dt,
        })
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }
}
