//! The reputation engine: dampening, cooldown and the event write paths

pub mod cooldown;
pub mod dampening;
mod engine;
mod outcome;
mod pipeline;

pub use cooldown::CooldownGate;
pub use dampening::{compute_delta, Crossing, DampeningParams};
pub use engine::RespecEngine;
pub use outcome::{AppliedRespec, EventKind, MessageReport, Outcome, SkipReason};
