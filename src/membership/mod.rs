//! Shared-project membership for Coterie.
//!
//! Users create projects, invite other users by login, and accept, decline,
//! or leave. A membership row doubles as a pending invitation until it is
//! accepted. When a project's last row goes away the project is torn down:
//! tag links, then tasks, then the project itself. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
