//! Cursor-paginated fetch over the GraphQL query endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiError, InstaClient};
use crate::models::{GroupSnapshot, UserRef};

use super::{FetchError, GroupFetcher, GroupKind};

/// Entries requested per page. The endpoint caps larger requests anyway.
const PAGE_SIZE: u32 = 50;

/// One-page transport seam, implemented by the HTTP client and by
/// scripted fakes in tests.
#[async_trait]
pub trait QueryTransport: Send {
    async fn query_page(
        &mut self,
        query_hash: &str,
        variables: &Value,
    ) -> Result<Value, ApiError>;
}

#[async_trait]
impl QueryTransport for InstaClient {
    async fn query_page(
        &mut self,
        query_hash: &str,
        variables: &Value,
    ) -> Result<Value, ApiError> {
        InstaClient::query_page(self, query_hash, variables).await
    }
}

// Response envelope. The edge key differs per relation kind, so it is
// accepted under either name.

#[derive(Deserialize)]
struct Envelope {
    data: DataNode,
}

#[derive(Deserialize)]
struct DataNode {
    user: Option<EdgeHolder>,
}

#[derive(Deserialize)]
struct EdgeHolder {
    #[serde(alias = "edge_followed_by", alias = "edge_follow")]
    connection: Connection,
}

#[derive(Deserialize)]
struct Connection {
    page_info: PageInfo,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Edge {
    node: Node,
}

#[derive(Deserialize)]
struct Node {
    username: String,
    #[serde(default)]
    full_name: String,
}

/// Pages through one relation edge, threading the `after` cursor from
/// each response into the next request until the provider reports no
/// further page. Page requests are strictly sequential - each cursor
/// depends on the previous response.
pub struct GraphqlFetcher<T: QueryTransport> {
    transport: T,
}

impl<T: QueryTransport> GraphqlFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[async_trait]
impl<T: QueryTransport> GroupFetcher for GraphqlFetcher<T> {
    async fn fetch(
        &mut self,
        target: &str,
        kind: GroupKind,
    ) -> Result<GroupSnapshot, FetchError> {
        let mut snapshot = GroupSnapshot::new();
        let mut after: Option<String> = None;
        let mut page: usize = 0;

        loop {
            let variables = json!({
                "id": target,
                "include_reel": false,
                "fetch_mutual": false,
                "first": PAGE_SIZE,
                "after": after,
            });

            let value = self
                .transport
                .query_page(kind.query_hash(), &variables)
                .await
                .map_err(|source| match source {
                    ApiError::Malformed { reason, .. } => FetchError::Malformed {
                        kind,
                        page,
                        reason,
                    },
                    other => FetchError::Transport {
                        kind,
                        page,
                        source: other,
                    },
                })?;

            let envelope: Envelope =
                serde_json::from_value(value).map_err(|e| FetchError::Malformed {
                    kind,
                    page,
                    reason: e.to_string(),
                })?;

            let connection = envelope
                .data
                .user
                .ok_or_else(|| FetchError::Malformed {
                    kind,
                    page,
                    reason: "no user in response".to_string(),
                })?
                .connection;

            for edge in connection.edges {
                snapshot.insert(UserRef::new(edge.node.username, edge.node.full_name));
            }
            debug!(%kind, page, total = snapshot.len(), "page consumed");

            if !connection.page_info.has_next_page {
                break;
            }
            match connection.page_info.end_cursor {
                Some(cursor) => after = Some(cursor),
                None => {
                    return Err(FetchError::Malformed {
                        kind,
                        page,
                        reason: "has_next_page without end_cursor".to_string(),
                    })
                }
            }
            page += 1;
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned transport recording every request's variables.
    struct ScriptedTransport {
        pages: Vec<Result<Value, ApiError>>,
        requests: Vec<Value>,
    }

    impl ScriptedTransport {
        fn new(pages: Vec<Result<Value, ApiError>>) -> Self {
            Self {
                pages,
                requests: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl QueryTransport for ScriptedTransport {
        async fn query_page(
            &mut self,
            _query_hash: &str,
            variables: &Value,
        ) -> Result<Value, ApiError> {
            self.requests.push(variables.clone());
            self.pages.remove(0)
        }
    }

    fn page(kind: GroupKind, start: usize, count: usize, end_cursor: Option<&str>) -> Value {
        let edges: Vec<Value> = (start..start + count)
            .map(|i| json!({"node": {"username": format!("user{i}"), "full_name": format!("User {i}")}}))
            .collect();
        let connection = json!({
            "page_info": {
                "has_next_page": end_cursor.is_some(),
                "end_cursor": end_cursor,
            },
            "edges": edges,
        });
        let mut user = serde_json::Map::new();
        user.insert(kind.edge_key().to_string(), connection);
        json!({"data": {"user": user}})
    }

    #[tokio::test]
    async fn test_three_pages_chain_cursors() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(GroupKind::Followers, 0, 50, Some("cursor-a"))),
            Ok(page(GroupKind::Followers, 50, 50, Some("cursor-b"))),
            Ok(page(GroupKind::Followers, 100, 7, None)),
        ]);
        let mut fetcher = GraphqlFetcher::new(transport);

        let snapshot = fetcher.fetch("999", GroupKind::Followers).await.unwrap();
        assert_eq!(snapshot.len(), 107);

        let requests = fetcher.into_inner().requests;
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0]["after"], Value::Null);
        assert_eq!(requests[1]["after"], json!("cursor-a"));
        assert_eq!(requests[2]["after"], json!("cursor-b"));
        // Every request asks for the same target and page size.
        for request in &requests {
            assert_eq!(request["id"], json!("999"));
            assert_eq!(request["first"], json!(PAGE_SIZE));
        }
    }

    #[tokio::test]
    async fn test_empty_account_yields_empty_snapshot() {
        let transport =
            ScriptedTransport::new(vec![Ok(page(GroupKind::Followings, 0, 0, None))]);
        let mut fetcher = GraphqlFetcher::new(transport);
        let snapshot = fetcher.fetch("1", GroupKind::Followings).await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_reports_page_index() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(GroupKind::Followers, 0, 50, Some("c"))),
            Err(ApiError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                url: "https://example.com".into(),
            }),
        ]);
        let mut fetcher = GraphqlFetcher::new(transport);
        match fetcher.fetch("1", GroupKind::Followers).await {
            Err(FetchError::Transport { page, .. }) => assert_eq!(page, 1),
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_keys_are_malformed_with_page_index() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"data": {}}))]);
        let mut fetcher = GraphqlFetcher::new(transport);
        match fetcher.fetch("1", GroupKind::Followers).await {
            Err(FetchError::Malformed { page, .. }) => assert_eq!(page, 0),
            other => panic!("expected malformed failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_usernames_collapse() {
        let mut duplicated = page(GroupKind::Followers, 0, 2, None);
        duplicated["data"]["user"]["edge_followed_by"]["edges"]
            .as_array_mut()
            .unwrap()
            .push(json!({"node": {"username": "user0", "full_name": "Renamed"}}));
        let transport = ScriptedTransport::new(vec![Ok(duplicated)]);
        let mut fetcher = GraphqlFetcher::new(transport);
        let snapshot = fetcher.fetch("1", GroupKind::Followers).await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }
}
