// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

use incubator_dashboard_model::{IncubatorData, PayloadError, TelemetryPayload};
use serde_json::Value;

use crate::error::Error;
use crate::telemetry::source::TelemetrySource;

/// Replays a canned sequence of firmware messages, one per step, forever.
pub struct DemoSource {
    samples: Vec<TelemetryPayload>,
    next: usize,
    step: Duration,
    last_emit: Option<Instant>,
    current: IncubatorData,
}

impl DemoSource {
    pub const STEP: Duration = Duration::from_secs(2);

    pub fn new() -> Result<Self, Error> {
        let json_data = std::include_str!("./demo_telemetry.json");

        let samples = serde_json::from_str::<Vec<Value>>(json_data)
            .map_err(PayloadError::from)?
            .into_iter()
            .map(TelemetryPayload::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            samples,
            next: 0,
            step: Self::STEP,
            last_emit: None,
            current: IncubatorData::default(),
        })
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }
}

impl TelemetrySource for DemoSource {
    fn poll(&mut self) -> Option<IncubatorData> {
        if self.samples.is_empty() {
            return None;
        }

        let now = Instant::now();
        if self.last_emit.is_some_and(|last| now.duration_since(last) < self.step) {
            return None;
        }

        let sample = &self.samples[self.next];
        self.next = (self.next + 1) % self.samples.len();
        self.last_emit = Some(now);
        self.current = sample.apply(self.current);

        log::debug!("Demo sample: {:?}", self.current);
        Some(self.current)
    }

    fn describe(&self) -> String {
        format!("demo telemetry ({} samples)", self.samples.len())
    }
}

#[test]
fn test_demo_source_emits_once_per_step() {
    let mut source = DemoSource::new().unwrap();
    assert_eq!(source.samples.len(), 10);

    let first = source.poll().unwrap();
    assert!(first.connected);
    assert_eq!(first.temperature, 34.6);
    assert_eq!(first.current_day, 6);

    // Two seconds have certainly not passed yet.
    assert_eq!(source.poll(), None);
}

#[test]
fn test_demo_source_wraps_around() {
    let mut source = DemoSource::new().unwrap().with_step(Duration::ZERO);

    let first = source.poll().unwrap();
    for _ in 1..source.samples.len() {
        source.poll().unwrap();
    }

    assert_eq!(source.poll(), Some(first));
}
