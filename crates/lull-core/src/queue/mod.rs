//! Queue module: the bounded FIFO of idle-deferred tasks.

mod idle;

pub use idle::{DrainReport, IdleTaskQueue};
