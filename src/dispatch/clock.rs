//! Source of the current hour for greetings

use chrono::{Local, Timelike};

pub trait Clock: Send + Sync {
    /// Hour of the day, 0..=23
    fn hour(&self) -> u32;
}

/// Local wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Always reports the same hour
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn hour(&self) -> u32 {
        self.0
    }
}
