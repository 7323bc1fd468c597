//! HTTP transport for Instagram's web endpoints.
//!
//! `InstaClient` carries an explicit cookie jar (so the session can
//! round-trip through the encrypted store) and covers login, the
//! two-factor leg, the session probe, handle-to-id resolution, and the
//! paginated GraphQL edge queries.

pub mod client;
pub mod error;

pub use client::InstaClient;
pub use error::ApiError;
