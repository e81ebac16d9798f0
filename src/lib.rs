//! Coterie: shared-project membership and invitations.
//!
//! Users create projects, invite other users by login, and accept or
//! decline invitations. A project lives only as long as somebody holds a
//! membership row in it; when the last row goes, the project's tasks and
//! their tag links are removed with it.
//!
//! # Architecture
//!
//! Coterie follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and the tag service
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`membership`]: Projects, invitations, and membership lifecycle
//! - [`config`]: Database settings read from the environment

pub mod config;
pub mod membership;
