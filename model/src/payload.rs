use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::incubator::IncubatorData;

/// Errors raised while decoding a telemetry message.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// One telemetry message as published by the incubator firmware.
///
/// The firmware uses short keys: `temp`, `humi`, `aq` (heater), `um`
/// (humidifier), `dia` (current day) and `resta` (days remaining). Decoding
/// is lenient: a missing key or a value of the wrong shape falls back to
/// zero/off instead of rejecting the whole message.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct TelemetryPayload {
    #[serde(rename = "temp", deserialize_with = "lenient_f32")]
    pub temperature: f32,

    #[serde(rename = "humi", deserialize_with = "lenient_f32")]
    pub humidity: f32,

    #[serde(rename = "aq", deserialize_with = "lenient_switch")]
    pub heater_on: bool,

    #[serde(rename = "um", deserialize_with = "lenient_switch")]
    pub humidifier_on: bool,

    #[serde(rename = "dia", deserialize_with = "lenient_days")]
    pub current_day: u32,

    #[serde(rename = "resta", deserialize_with = "lenient_days")]
    pub days_remaining: u32,
}

impl TelemetryPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        // serde would happily build a struct from a JSON array, so check first.
        if !value.is_object() {
            return Err(PayloadError::NotAnObject(json_kind(&value)));
        }

        Ok(Self::deserialize(value)?)
    }

    /// Returns `previous` with every telemetry field replaced by this
    /// message. A message arriving implies the link is up.
    pub fn apply(&self, previous: IncubatorData) -> IncubatorData {
        IncubatorData {
            temperature: self.temperature,
            humidity: self.humidity,
            heater_on: self.heater_on,
            humidifier_on: self.humidifier_on,
            current_day: self.current_day,
            days_remaining: self.days_remaining,
            ..previous.with_connected(true)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Numbers pass through, numeric strings are parsed, everything else is `None`.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|n| n.is_finite())
}

/// Like [`coerce_number`] but truncated toward zero.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64(),
        _ => coerce_number(value).map(|n| n.trunc() as i64),
    }
}

fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let number = coerce_number(&value).map(|n| n as f32);

    // Values beyond f32 range turn into infinity on the cast.
    Ok(number.filter(|n| n.is_finite()).unwrap_or(0.0))
}

fn lenient_switch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_integer(&value) == Some(1))
}

fn lenient_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let days = coerce_integer(&value).unwrap_or(0);

    Ok(days.clamp(0, u32::MAX as i64) as u32)
}
