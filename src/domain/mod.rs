//! Domain layer: entities, errors, and the narrow ports infrastructure and
//! services are wired against. Nothing here depends on `sqlx`, `axum`, or
//! `reqwest`.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CoreError, CoreResult};
