//! Data types shared by every front-end of the incubator dashboard.
//!
//! Nothing in here performs I/O. The connection thread produces
//! [`IncubatorData`] records, the UI consumes them.

mod incubator;
mod payload;
mod status;

pub use incubator::{IncubatorData, TOTAL_INCUBATION_DAYS};
pub use payload::{PayloadError, TelemetryPayload};
pub use status::{Status, Thresholds, HUMIDITY, TEMPERATURE};
