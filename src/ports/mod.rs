//! Port traits: the seams between the decision engine and the outside world.

pub mod config_port;
pub mod report_port;
pub mod snapshot_port;
