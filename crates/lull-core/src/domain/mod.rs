//! Domain model (tasks, capacity, loop phases, errors).

pub mod activity;
pub mod capacity;
pub mod errors;
pub mod task;

pub use self::activity::{Activity, LoopMode};
pub use self::capacity::{Capacity, DEFAULT_SLACK};
pub use self::errors::IdleError;
pub use self::task::{IdleTask, Step};
