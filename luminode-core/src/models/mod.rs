mod command;
mod control;
mod telemetry;

pub use command::*;
pub use control::*;
pub use telemetry::*;
