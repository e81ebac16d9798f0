//! `PostgreSQL` adapters for project membership persistence.

mod models;
mod repository;
mod schema;

pub use repository::{MembershipPgPool, PostgresMembershipStore, PostgresTagLinks};
