pub mod defs;
pub mod sink;

pub use defs::*;
pub use sink::ProfileSink;
