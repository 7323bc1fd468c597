//! Relation-list retrieval.
//!
//! `GroupFetcher` is the transport-agnostic seam: the query-API
//! implementation pages through the GraphQL edges, the DOM implementation
//! drives a rendered page through a `PageDriver`. Everything downstream
//! (rate gate, diff, report) only sees `GroupSnapshot`s.

pub mod dom;
pub mod graphql;

pub use dom::{DomFetcher, PageDriver, ScrollPolicy};
pub use graphql::{GraphqlFetcher, QueryTransport};

use async_trait::async_trait;
use thiserror::Error;

use crate::api::ApiError;
use crate::models::GroupSnapshot;

/// Which relation list to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Followers,
    Followings,
}

impl GroupKind {
    /// GraphQL query hash for this edge type.
    pub fn query_hash(&self) -> &'static str {
        match self {
            GroupKind::Followers => "c76146de99bb02f6415203be841dd25a",
            GroupKind::Followings => "d04b0a864b4b54837c0d870b0e77e076",
        }
    }

    /// Key of this edge in the GraphQL response envelope.
    pub fn edge_key(&self) -> &'static str {
        match self {
            GroupKind::Followers => "edge_followed_by",
            GroupKind::Followings => "edge_follow",
        }
    }

    /// Path segment of the profile dialog showing this list.
    pub fn dialog_path(&self) -> &'static str {
        match self {
            GroupKind::Followers => "followers",
            GroupKind::Followings => "following",
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Followers => write!(f, "followers"),
            GroupKind::Followings => write!(f, "followings"),
        }
    }
}

/// A fetch is all-or-nothing: any page failing aborts the whole run with
/// the index of the page that failed, and nothing partial is kept.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network failure while fetching {kind} (page {page}): {source}")]
    Transport {
        kind: GroupKind,
        page: usize,
        #[source]
        source: ApiError,
    },

    #[error("malformed {kind} response (page {page}): {reason}")]
    Malformed {
        kind: GroupKind,
        page: usize,
        reason: String,
    },

    #[error("page driver failure: {0}")]
    Driver(String),
}

/// Retrieves the complete relation list for a target identity.
///
/// `target` is whatever the implementation keys on: the numeric user id
/// for the query API, the profile handle for the DOM variant.
#[async_trait]
pub trait GroupFetcher {
    async fn fetch(&mut self, target: &str, kind: GroupKind)
        -> Result<GroupSnapshot, FetchError>;
}
