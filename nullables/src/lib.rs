//! Nullable infrastructure for deterministic testing.
//!
//! The work pool reaches the outside world through three seams: where seeds
//! come from, which kernel runs, and how lanes get an execution context.
//! This crate provides test-friendly implementations of each that:
//! - Return scripted values
//! - Count how often they were used
//! - Never need kernel bytecode on disk
//!
//! Usage: swap real implementations for nullables in tests.

pub mod kernel;
pub mod seed;
pub mod spawner;

pub use kernel::{KernelCall, ScriptedKernelFactory};
pub use seed::NullSeedSource;
pub use spawner::CountingSpawner;
