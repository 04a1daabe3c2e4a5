//! Tick clock and deferred task scheduler for Skirmish.
//!
//! All arena orchestration runs on one logical thread that advances in
//! fixed ticks. This crate provides the two halves of that loop:
//!
//! - [`TickClock`]: decides when the next tick is due (tokio timers)
//! - [`Scheduler`]: runs deferred and repeating callbacks on each tick,
//!   with cancellable [`TaskHandle`]s
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         _ = clock.wait_for_tick() => { scheduler.advance(&mut state); }
//!     }
//! }
//! ```

mod clock;
mod scheduler;

pub use clock::{TickClock, TickConfig, TickInfo};
pub use scheduler::{Scheduler, TaskFn, TaskHandle};
