use std::path::Path;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::tracking::offline::OfflineSink;
use crate::tracking::sink::{LogSink, MetricsSink};

/// Environment variable that overrides the configured tracking mode.
pub const TRACKING_MODE_ENV: &str = "FERRITE_TRACKING_MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Write run directories to local disk.
    #[default]
    Offline,
    /// Log metrics only.
    Disabled,
}

impl FromStr for TrackingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<TrackingMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(TrackingMode::Offline),
            "disabled" => Ok(TrackingMode::Disabled),
            other => Err(Error::InvalidConfig(format!(
                "unknown tracking mode `{}` (expected `offline` or `disabled`)",
                other
            ))),
        }
    }
}

impl TrackingMode {
    /// Reads `FERRITE_TRACKING_MODE`; `None` when unset.
    pub fn from_env() -> Result<Option<TrackingMode>> {
        match std::env::var(TRACKING_MODE_ENV) {
            Ok(value) => value.parse().map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn open_sink(self, tracking_dir: &Path) -> Box<dyn MetricsSink> {
        match self {
            TrackingMode::Offline => Box::new(OfflineSink::new(tracking_dir)),
            TrackingMode::Disabled => Box::new(LogSink),
        }
    }
}
