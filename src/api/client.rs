//! HTTP client for Instagram's web endpoints.
//!
//! This module provides the `InstaClient` struct for the authenticated
//! query-API transport: login (including the two-factor leg), the session
//! probe, identity resolution, and the paginated GraphQL edge queries.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::auth::{LoginApi, LoginReply};
use crate::models::CookieJar;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for all web endpoints.
const BASE_URL: &str = "https://www.instagram.com";

/// Login endpoint; replies with the `authenticated`/`two_factor_required`
/// envelope, on HTTP 400 when a challenge is raised.
const LOGIN_PATH: &str = "/accounts/login/ajax/";

/// Two-factor code submission endpoint.
const TWO_FACTOR_PATH: &str = "/accounts/login/ajax/two_factor/";

/// Lightweight "am I logged in" probe; resolves the session's username.
const CURRENT_USER_PATH: &str = "/api/v1/accounts/current_user/";

/// Search endpoint used to resolve a handle to its numeric user id.
const TOP_SEARCH_PATH: &str = "/web/search/topsearch/";

/// GraphQL query endpoint for follower/following edges.
const GRAPHQL_PATH: &str = "/graphql/query/";

/// HTTP request timeout in seconds.
/// Generous enough for slow pages while still failing fast instead of
/// hanging a whole run.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The web endpoints refuse requests without a browser user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0";

/// Anti-forgery cookie mirrored into the `X-CSRFToken` header on writes.
const CSRF_COOKIE: &str = "csrftoken";

/// Query-API client carrying its own cookie jar.
///
/// The jar lives outside reqwest so it can round-trip through the
/// encrypted session store between runs; every response's `Set-Cookie`
/// headers are absorbed back into it.
pub struct InstaClient {
    http: Client,
    jar: CookieJar,
}

impl InstaClient {
    pub fn new(jar: CookieJar) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::transport(BASE_URL, e))?;
        Ok(Self { http, jar })
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.jar
    }

    /// Shared reqwest client, for incidental calls (update check) that
    /// should reuse the connection pool. Clone is cheap - reqwest uses Arc
    /// internally.
    pub fn http(&self) -> Client {
        self.http.clone()
    }

    fn csrf_token(&self) -> Option<&str> {
        self.jar.get(CSRF_COOKIE)
    }

    /// Fetch the landing page once to obtain the anti-forgery cookie that
    /// the login POST must echo back in its header.
    pub async fn prime_csrf(&mut self) -> Result<(), ApiError> {
        if self.csrf_token().is_some() {
            return Ok(());
        }
        let url = format!("{BASE_URL}/");
        let request = self.http.get(&url);
        self.send(request, &url).await?;
        if self.csrf_token().is_none() {
            return Err(ApiError::malformed(
                "landing page",
                "no anti-forgery cookie issued",
            ));
        }
        Ok(())
    }

    /// Probe whether the saved session is still authenticated. Returns the
    /// session's username on success, `None` when the service treats us as
    /// logged out.
    pub async fn probe_identity(&mut self) -> Result<Option<String>, ApiError> {
        let url = format!("{BASE_URL}{CURRENT_USER_PATH}");
        let request = self.http.get(&url).header(header::ACCEPT, "application/json");

        let (status, body) = self.send_raw(request, &url).await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status { status, url });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::malformed("current user probe", e))?;
        let username = value
            .pointer("/user/username")
            .and_then(Value::as_str)
            .map(str::to_string);
        match username {
            Some(name) => Ok(Some(name)),
            // A 2xx without a user payload is a logged-out interstitial.
            None => Ok(None),
        }
    }

    /// Submit credentials. The caller must have primed the CSRF cookie;
    /// the password travels in the browser envelope format the endpoint
    /// expects.
    pub async fn submit_login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginReply, ApiError> {
        self.prime_csrf().await?;
        let url = format!("{BASE_URL}{LOGIN_PATH}");
        let enc_password = format!(
            "#PWD_INSTAGRAM_BROWSER:0:{}:{}",
            Utc::now().timestamp(),
            password
        );
        let form = [
            ("username", username),
            ("enc_password", enc_password.as_str()),
        ];
        let request = self.write_request(&url).form(&form);
        self.login_reply(request, &url, "login").await
    }

    /// Submit a one-time code, echoing the identifier token from the
    /// original challenge response.
    pub async fn submit_two_factor(
        &mut self,
        username: &str,
        code: &str,
        identifier: &str,
    ) -> Result<LoginReply, ApiError> {
        let url = format!("{BASE_URL}{TWO_FACTOR_PATH}");
        let form = [
            ("username", username),
            ("verification_code", code),
            ("identifier", identifier),
        ];
        let request = self.write_request(&url).form(&form);
        self.login_reply(request, &url, "two-factor").await
    }

    /// Resolve a handle to the numeric user id the GraphQL queries key on.
    pub async fn resolve_user_id(&mut self, target: &str) -> Result<String, ApiError> {
        let url = format!("{BASE_URL}{TOP_SEARCH_PATH}");
        let request = self
            .http
            .get(&url)
            .query(&[("query", target)])
            .header(header::ACCEPT, "application/json");
        let body = self.send(request, &url).await?;

        let value: Value =
            serde_json::from_str(&body).map_err(|e| ApiError::malformed("user search", e))?;
        let users = value
            .get("users")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::malformed("user search", "missing `users` array"))?;

        for entry in users {
            let user = match entry.get("user") {
                Some(u) => u,
                None => continue,
            };
            if user.get("username").and_then(Value::as_str) == Some(target) {
                return match user.get("pk") {
                    Some(Value::String(pk)) => Ok(pk.clone()),
                    Some(Value::Number(pk)) => Ok(pk.to_string()),
                    _ => Err(ApiError::malformed("user search", "user entry without `pk`")),
                };
            }
        }
        Err(ApiError::malformed(
            "user search",
            format!("no account named '{target}' in results"),
        ))
    }

    /// Fetch one page of a relation edge from the GraphQL endpoint.
    pub async fn query_page(
        &mut self,
        query_hash: &str,
        variables: &Value,
    ) -> Result<Value, ApiError> {
        let url = format!("{BASE_URL}{GRAPHQL_PATH}");
        let encoded_variables = variables.to_string();
        let request = self
            .http
            .get(&url)
            .query(&[
                ("query_hash", query_hash),
                ("variables", encoded_variables.as_str()),
            ])
            .header(header::ACCEPT, "application/json");
        let body = self.send(request, &url).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::malformed("graphql page", e))
    }

    // ===== plumbing =====

    fn write_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::REFERER, format!("{BASE_URL}/"));
        if let Some(token) = self.csrf_token() {
            request = request.header("X-CSRFToken", token.to_string());
        }
        request
    }

    async fn login_reply(
        &mut self,
        request: reqwest::RequestBuilder,
        url: &str,
        context: &str,
    ) -> Result<LoginReply, ApiError> {
        // Challenge replies arrive with a non-2xx status but a parseable
        // body, so parse first and only then fall back to the status.
        let (status, body) = self.send_raw(request, url).await?;
        match serde_json::from_str::<LoginReply>(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status,
                url: url.to_string(),
            }),
            Err(e) => Err(ApiError::malformed(context, e)),
        }
    }

    /// Send a request, absorb cookies, and return the body of a 2xx reply.
    async fn send(
        &mut self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, ApiError> {
        let (status, body) = self.send_raw(request, url).await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Status {
                status,
                url: url.to_string(),
            })
        }
    }

    /// Send a request with the jar attached and absorb `Set-Cookie`
    /// headers from the reply. Transport failures (including timeouts)
    /// surface as [`ApiError::Transport`].
    async fn send_raw(
        &mut self,
        mut request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<(StatusCode, String), ApiError> {
        if !self.jar.is_empty() {
            request = request.header(header::COOKIE, self.jar.header_value());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(url, e))?;

        self.jar.absorb_set_cookie(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        let status = response.status();
        debug!(url, status = %status, "request complete");
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(url, e))?;
        Ok((status, body))
    }
}

/// The HTTP client is the production transport for the login state
/// machine.
#[async_trait]
impl LoginApi for InstaClient {
    async fn probe_identity(&mut self) -> Result<Option<String>, ApiError> {
        InstaClient::probe_identity(self).await
    }

    async fn submit_login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginReply, ApiError> {
        InstaClient::submit_login(self, username, password).await
    }

    async fn submit_two_factor(
        &mut self,
        username: &str,
        code: &str,
        identifier: &str,
    ) -> Result<LoginReply, ApiError> {
        InstaClient::submit_two_factor(self, username, code, identifier).await
    }
}
