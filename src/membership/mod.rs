//! Membership protocol loops
//!
//! Each loop is an independent task sharing only the directory and the
//! node's socket:
//!
//! - `Announcer`: sends this node's files on a random 1-30s cadence
//! - `Listener`: applies received announcements and snapshots
//! - `LivenessMonitor`: demotes nodes that stopped announcing
//! - `SnapshotBroadcaster`: coordinator only, fans the whole view out
pub mod announcer;
pub mod broadcaster;
pub mod listener;
pub mod monitor;
pub mod schedule;

pub use announcer::{AnnounceTarget, Announcer};
pub use broadcaster::SnapshotBroadcaster;
pub use listener::{Delivery, Listener};
pub use monitor::LivenessMonitor;
pub use schedule::RandomSchedule;
