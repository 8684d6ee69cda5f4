// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use incubator_dashboard_model::IncubatorData;

pub type TelemetrySourcePointer = Box<dyn TelemetrySource + Send>;

/// Something that delivers incubator snapshots to the UI.
pub trait TelemetrySource {
    /// Returns a new snapshot if one arrived since the last poll.
    fn poll(&mut self) -> Option<IncubatorData>;

    /// Human readable name of the source, used in logs.
    fn describe(&self) -> String;
}
