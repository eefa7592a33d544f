//! Motion engine for casino-style spinning reels.
//!
//! This crate has no rendering or toolkit-specific dependencies. A UI
//! layer registers a listener, calls [`SpinnerEngine::position`] on every
//! state change and redraws.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod position;
pub mod scheduler;
pub mod trajectory;

pub use config::{Direction, MotionConfig, Property, PropertyValue};
pub use engine::{Contention, SpinnerEngine};
pub use error::{Result, SpinnerError};
pub use events::{ListenerId, SpinnerEvent, SpinnerListener};
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, Tick};
pub use trajectory::{Phase, Trajectory};
