//! Model container: owns the clock, terrain, climate and glacier of one
//! simulation run and drives the glacier from clock ticks.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde::Serialize;

use crate::climate::{Climate, ClimateSource};
use crate::clock::{ClockEvent, SimClock};
use crate::config::{ClimateChange, SimConfig};
use crate::error::GlacierError;
use crate::geometry::Point;
use crate::glacier::Glacier;
use crate::valley::Valley;

/// Serializable summary of the glacier at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlacierSnapshot {
    pub time: f64,
    pub ela: f64,
    pub quasi_ela: f64,
    pub steady_state: bool,
    pub length: f64,
    pub max_thickness: f64,
    pub terminus: Point,
    pub surface_at_ela: Option<Point>,
}

pub struct GlacierModel {
    clock: SimClock,
    valley: Rc<Valley>,
    climate: Rc<Climate>,
    glacier: Rc<RefCell<Glacier>>,
    /// Pending scheduled changes, sorted by year, earliest last.
    pending: Vec<ClimateChange>,
}

impl GlacierModel {
    pub fn new(valley: Valley, climate: Climate, dt: f64) -> Result<Self, GlacierError> {
        let clock = SimClock::new(dt)?;
        let valley = Rc::new(valley);
        let climate = Rc::new(climate);
        let glacier = Glacier::new(valley.clone(), climate.clone());
        Ok(Self { clock, valley, climate, glacier, pending: Vec::new() })
    }

    pub fn from_config(config: &SimConfig) -> Result<Self, GlacierError> {
        config.validate()?;
        let climate = Climate::from_params(config.climate)?;
        let mut model = Self::new(config.valley.clone(), climate, config.dt)?;
        model.pending = config.schedule();
        model.pending.reverse();
        Ok(model)
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn valley(&self) -> &Valley {
        &self.valley
    }

    /// Shared climate; its setters notify the glacier.
    pub fn climate(&self) -> &Climate {
        &self.climate
    }

    pub fn glacier(&self) -> Ref<'_, Glacier> {
        self.glacier.borrow()
    }

    /// Shared handle for consumers that keep the glacier beyond a borrow.
    pub fn glacier_handle(&self) -> Rc<RefCell<Glacier>> {
        Rc::clone(&self.glacier)
    }

    /// Advance one clock tick: apply due climate changes, then evolve.
    /// Returns `None` while the clock is paused.
    pub fn step(&mut self) -> Result<Option<ClockEvent>, GlacierError> {
        let Some(event) = self.clock.tick() else {
            return Ok(None);
        };
        self.apply_due_changes(event.simulation_time)?;
        self.glacier.borrow_mut().tick(event.simulation_time_change);
        Ok(Some(event))
    }

    pub fn run(&mut self, ticks: u64) -> Result<(), GlacierError> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Step until the glacier reaches steady state. Returns the number of
    /// ticks taken, or `None` if `max_ticks` ran out first.
    pub fn run_until_steady(&mut self, max_ticks: u64) -> Result<Option<u64>, GlacierError> {
        for taken in 0..=max_ticks {
            if self.glacier.borrow().is_steady_state() {
                return Ok(Some(taken));
            }
            if taken < max_ticks && self.step()?.is_none() {
                return Ok(None);
            }
        }
        Ok(None)
    }

    pub fn snapshot(&self) -> GlacierSnapshot {
        let g = self.glacier.borrow();
        GlacierSnapshot {
            time: self.clock.time(),
            ela: self.climate.ela(),
            quasi_ela: g.quasi_ela(),
            steady_state: g.is_steady_state(),
            length: g.length(),
            max_thickness: g.max_thickness(),
            terminus: g.terminus_position(),
            surface_at_ela: g.surface_at_ela(),
        }
    }

    fn apply_due_changes(&mut self, time: f64) -> Result<(), GlacierError> {
        while self.pending.last().is_some_and(|c| c.year <= time) {
            let Some(change) = self.pending.pop() else { break };
            log::info!("year {time:.1}: applying climate change {change:?}");
            if let Some(v) = change.temperature_offset {
                self.climate.set_temperature_offset(v)?;
            }
            if let Some(v) = change.snowfall {
                self.climate.set_snowfall(v)?;
            }
            if let Some(v) = change.snowfall_reference_elevation {
                self.climate.set_snowfall_reference_elevation(v)?;
            }
        }
        Ok(())
    }
}
