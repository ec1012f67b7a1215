pub mod mode;
pub mod offline;
pub mod record;
pub mod sink;

pub use mode::{TrackingMode, TRACKING_MODE_ENV};
pub use offline::OfflineSink;
pub use record::{MetricRecord, RunInfo};
pub use sink::{LogSink, MemorySink, MetricsSink};
