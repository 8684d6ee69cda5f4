// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod demo;
mod mqtt;
mod source;

pub use demo::DemoSource;
pub use mqtt::MqttLink;
pub use source::{TelemetrySource, TelemetrySourcePointer};

use crate::{BrokerConfig, Error};

/// Picks the telemetry source described by `config`.
pub fn open(config: &BrokerConfig) -> Result<TelemetrySourcePointer, Error> {
    if config.demo {
        log::info!("Demo mode, replaying built-in telemetry");
        return Ok(Box::new(DemoSource::new()?));
    }

    Ok(Box::new(MqttLink::connect(config)?))
}
