use serde::{Deserialize, Serialize};

use crate::status::{Status, HUMIDITY, TEMPERATURE};

/// Typical incubation period of chicken eggs in days.
pub const TOTAL_INCUBATION_DAYS: u32 = 21;

/// Snapshot of the incubator as last reported over the broker.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct IncubatorData {
    /// Temperature in °C.
    pub temperature: f32,

    /// Relative humidity in %.
    pub humidity: f32,

    pub heater_on: bool,
    pub humidifier_on: bool,

    /// Whether the link to the broker is currently up.
    pub connected: bool,

    /// Days since the eggs were set.
    pub current_day: u32,

    /// Days left until hatching.
    pub days_remaining: u32,
}

impl IncubatorData {
    pub fn total_days(&self) -> u32 {
        self.current_day.saturating_add(self.days_remaining)
    }

    /// Incubation progress as a fraction in `[0, 1]`, `0` for an empty cycle.
    pub fn progress(&self) -> f32 {
        let total = self.total_days();
        if total == 0 {
            return 0.0;
        }

        (self.current_day as f32 / total as f32).clamp(0.0, 1.0)
    }

    /// Whole percent of [`Self::progress`], rounded down.
    ///
    /// Computed on the day counts so that e.g. 53 of 100 days is exactly 53.
    pub fn progress_percent(&self) -> u32 {
        let total = u64::from(self.total_days());
        if total == 0 {
            return 0;
        }

        (u64::from(self.current_day) * 100 / total).min(100) as u32
    }

    pub fn temperature_status(&self) -> Status {
        TEMPERATURE.classify(self.temperature)
    }

    pub fn humidity_status(&self) -> Status {
        HUMIDITY.classify(self.humidity)
    }

    pub fn with_connected(self, connected: bool) -> Self {
        Self { connected, ..self }
    }
}

#[test]
fn test_default_is_empty_and_disconnected() {
    let data = IncubatorData::default();

    assert!(!data.connected);
    assert!(!data.heater_on);
    assert_eq!(data.total_days(), 0);
    assert_eq!(data.progress(), 0.0);
    assert_eq!(data.progress_percent(), 0);
}

#[test]
fn test_progress() {
    let data = IncubatorData {
        current_day: 7,
        days_remaining: 14,
        ..Default::default()
    };

    assert_eq!(data.total_days(), TOTAL_INCUBATION_DAYS);
    assert!((data.progress() - 1.0 / 3.0).abs() < f32::EPSILON);
    assert_eq!(data.progress_percent(), 33);

    let hatched = IncubatorData {
        current_day: 21,
        days_remaining: 0,
        ..Default::default()
    };
    assert_eq!(hatched.progress(), 1.0);
    assert_eq!(hatched.progress_percent(), 100);
}

#[test]
fn test_progress_percent_is_exact() {
    for total in 1..=200u32 {
        for current_day in 0..=total {
            let data = IncubatorData {
                current_day,
                days_remaining: total - current_day,
                ..Default::default()
            };

            assert_eq!(data.progress_percent(), current_day * 100 / total);
        }
    }

    let data = IncubatorData {
        current_day: 53,
        days_remaining: 47,
        ..Default::default()
    };
    assert_eq!(data.progress_percent(), 53);
}

#[test]
fn test_total_days_saturates() {
    let data = IncubatorData {
        current_day: u32::MAX,
        days_remaining: 3,
        ..Default::default()
    };

    assert_eq!(data.total_days(), u32::MAX);
    assert_eq!(data.progress(), 1.0);
}

#[test]
fn test_statuses_follow_readings() {
    let data = IncubatorData {
        temperature: 37.8,
        humidity: 70.0,
        ..Default::default()
    };

    assert_eq!(data.temperature_status(), Status::Ideal);
    assert_eq!(data.humidity_status(), Status::High);
}

#[test]
fn test_with_connected_keeps_readings() {
    let data = IncubatorData {
        temperature: 36.0,
        current_day: 4,
        ..Default::default()
    };

    let connected = data.with_connected(true);
    assert!(connected.connected);
    assert_eq!(connected.temperature, 36.0);
    assert_eq!(connected.current_day, 4);
}
