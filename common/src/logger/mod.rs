mod init;
mod trace_id;

pub use init::{LogFormat, init_logger};
pub use trace_id::TraceId;
