//! Find out who doesn't follow you back.
//!
//! gramscope logs into Instagram's web API (reusing an encrypted saved
//! session when one exists), pulls a profile's complete follower and
//! following lists through cursor pagination, computes the asymmetric
//! differences, and stores the result - cookies and reports alike - as
//! sealed blobs under a locally generated key.
//!
//! The fetch transport is swappable: [`fetch::GraphqlFetcher`] pages the
//! query API, [`fetch::DomFetcher`] drives a rendered profile dialog
//! through an embedder-supplied [`fetch::PageDriver`].

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod diff;
pub mod fetch;
pub mod models;
pub mod rate;
pub mod store;
pub mod update;
