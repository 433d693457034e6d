pub mod interceptor;
pub mod recorder;

pub use interceptor::{record_response, MetricsInterceptor};
pub use recorder::{CapturedResponse, ReplayWriter, ResponseRecorder, ResponseSink};
