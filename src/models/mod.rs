// Domain models: sampled log records, call-site frames, driver values

mod frame;
mod record;
mod value;

pub use frame::StackFrame;
pub use record::LogRecord;
pub use value::{Row, Value};
