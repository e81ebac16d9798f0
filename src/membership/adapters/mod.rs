//! Adapter implementations for membership ports.

pub mod memory;
pub mod postgres;
