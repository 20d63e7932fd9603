//! # reactor-runtime
//!
//! Platform-specific machinery backing the reactor: the event arena, the
//! indexed timer heap, priority activation queues, the `poll(2)` backend,
//! the self-pipe signal bridge, and the `Reactor` that drives them.
//!
//! Everything here targets Unix; a non-Unix backend would live beside
//! `backends::poll` without touching the rest of this crate.

#![allow(dead_code)]

pub mod arena;
pub mod backends;
pub mod config;
pub mod queues;
pub mod reactor;
pub mod signal;
pub mod time;
pub mod timer_heap;

pub use config::ReactorConfig;
pub use reactor::{LoopFlags, Reactor};
