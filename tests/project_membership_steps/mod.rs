//! Step definitions for shared project membership scenarios.

mod given;
mod then;
mod when;
pub mod world;
