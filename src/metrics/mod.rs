pub mod influx;
pub mod memory;
pub mod point;
pub mod sink;

pub use influx::InfluxSink;
pub use memory::{MemorySink, RecordedPoint};
pub use point::{FieldValue, Point};
pub use sink::{Sink, SinkConnection, WriteScope};

/// Address that selects the in-memory sink instead of InfluxDB.
pub const MEMORY_SINK_ADDRESS: &str = "memory://";
