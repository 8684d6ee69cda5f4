use serde::{Deserialize, Serialize};

/// Classification of a sensor reading relative to the ideal range.
///
/// The variants are ordered from coldest/driest to hottest/wettest.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    CriticalLow,
    Low,
    #[default]
    Ideal,
    High,
    CriticalHigh,
}

impl Status {
    pub fn is_critical(self) -> bool {
        matches!(self, Status::CriticalLow | Status::CriticalHigh)
    }

    /// Short label for logs and accessibility text.
    pub fn label(self) -> &'static str {
        match self {
            Status::CriticalLow => "critically low",
            Status::Low => "below ideal",
            Status::Ideal => "ideal",
            Status::High => "above ideal",
            Status::CriticalHigh => "critically high",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The four boundaries splitting a reading into the five [`Status`] bands.
///
/// `ideal_min` is inclusive, `ideal_max` and `critical_high` are inclusive
/// upper bounds of their band, `critical_low` is exclusive.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub critical_low: f32,
    pub ideal_min: f32,
    pub ideal_max: f32,
    pub critical_high: f32,
}

/// Chicken egg incubation temperature in °C.
pub const TEMPERATURE: Thresholds = Thresholds {
    critical_low: 35.0,
    ideal_min: 37.5,
    ideal_max: 38.0,
    critical_high: 40.0,
};

/// Chicken egg incubation relative humidity in %.
pub const HUMIDITY: Thresholds = Thresholds {
    critical_low: 40.0,
    ideal_min: 55.0,
    ideal_max: 65.0,
    critical_high: 80.0,
};

impl Thresholds {
    /// Returns the band `value` falls into.
    ///
    /// NaN fails every comparison and therefore lands in
    /// [`Status::CriticalHigh`].
    pub fn classify(&self, value: f32) -> Status {
        if value < self.critical_low {
            Status::CriticalLow
        } else if value < self.ideal_min {
            Status::Low
        } else if value <= self.ideal_max {
            Status::Ideal
        } else if value <= self.critical_high {
            Status::High
        } else {
            Status::CriticalHigh
        }
    }
}
