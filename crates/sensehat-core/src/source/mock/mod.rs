//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built scenarios for testing
//! sources without a Raspberry Pi, a Sense HAT or a Linux `/proc`.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
