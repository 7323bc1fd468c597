//! Login state machine.
//!
//! `AuthSession` drives a `LoginApi` transport from `Unauthenticated` to a
//! terminal `Authenticated` or `Failed` state. Both terminal states are
//! final for the run: there is no built-in retry, the caller decides
//! whether to rerun the program.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::ApiError;

use super::{CredentialSource, Credentials};

/// Reply envelope shared by the login and two-factor endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub two_factor_required: bool,
    #[serde(default)]
    pub two_factor_info: Option<TwoFactorInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwoFactorInfo {
    pub two_factor_identifier: Option<String>,
}

/// Transport seam for the login flow; implemented by the HTTP client and
/// by scripted fakes in tests.
#[async_trait]
pub trait LoginApi: Send {
    /// Lightweight "am I logged in" probe; `Some(username)` when the
    /// existing session is still valid.
    async fn probe_identity(&mut self) -> Result<Option<String>, ApiError>;

    /// Submit credentials; the transport obtains anti-forgery state first.
    async fn submit_login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginReply, ApiError>;

    /// Submit a one-time code together with the identifier token from the
    /// original challenge.
    async fn submit_two_factor(
        &mut self,
        username: &str,
        code: &str,
        identifier: &str,
    ) -> Result<LoginReply, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    CredentialsSubmitted,
    TwoFactorPending { identifier: String },
    Authenticated { username: String },
    Failed { reason: String },
}

pub struct AuthSession<A: LoginApi> {
    api: A,
    state: AuthState,
}

impl<A: LoginApi> AuthSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn into_inner(self) -> A {
        self.api
    }

    /// Run the machine to a terminal state and return the authenticated
    /// username. `try_existing` controls whether the saved-session probe
    /// may short-circuit the credential flow.
    pub async fn authenticate<C: CredentialSource>(
        &mut self,
        collector: &mut C,
        try_existing: bool,
    ) -> Result<String, ApiError> {
        if try_existing {
            match self.api.probe_identity().await {
                Ok(Some(username)) => {
                    info!(username = %username, "existing session still valid");
                    self.state = AuthState::Authenticated {
                        username: username.clone(),
                    };
                    return Ok(username);
                }
                Ok(None) => debug!("saved session rejected, falling back to login"),
                Err(e) => return Err(self.fail_with(e)),
            }
        }

        let credentials = collector
            .credentials()
            .map_err(|e| self.fail(format!("credential input failed: {e}")))?;

        println!("🛡️  Starting the authentication process");
        self.state = AuthState::CredentialsSubmitted;
        let reply = match self
            .api
            .submit_login(&credentials.username, credentials.password())
            .await
        {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail_with(e)),
        };

        if reply.authenticated {
            return Ok(self.succeed(credentials.username));
        }

        if reply.two_factor_required {
            return self.resolve_two_factor(collector, &credentials, reply).await;
        }

        Err(self.fail("check your credentials and try again".to_string()))
    }

    async fn resolve_two_factor<C: CredentialSource>(
        &mut self,
        collector: &mut C,
        credentials: &Credentials,
        reply: LoginReply,
    ) -> Result<String, ApiError> {
        // A challenge without an identifier token cannot be answered;
        // that is a Failed transition, never TwoFactorPending.
        let identifier = match reply
            .two_factor_info
            .and_then(|info| info.two_factor_identifier)
        {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(self.fail("unexpected two-factor response from provider".to_string()))
            }
        };

        self.state = AuthState::TwoFactorPending {
            identifier: identifier.clone(),
        };

        let code = collector
            .one_time_code()
            .map_err(|e| self.fail(format!("two-factor input failed: {e}")))?;

        let reply = match self
            .api
            .submit_two_factor(&credentials.username, &code, &identifier)
            .await
        {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail_with(e)),
        };

        if reply.authenticated {
            Ok(self.succeed(credentials.username.clone()))
        } else {
            Err(self.fail("two-factor code rejected".to_string()))
        }
    }

    fn succeed(&mut self, username: String) -> String {
        info!(username = %username, "login successful");
        self.state = AuthState::Authenticated {
            username: username.clone(),
        };
        username
    }

    fn fail(&mut self, reason: String) -> ApiError {
        self.state = AuthState::Failed {
            reason: reason.clone(),
        };
        ApiError::AuthenticationFailed(reason)
    }

    /// Record the failure reason but keep the original error kind, so
    /// transport failures stay distinguishable from bad credentials.
    fn fail_with(&mut self, error: ApiError) -> ApiError {
        self.state = AuthState::Failed {
            reason: error.to_string(),
        };
        error
    }
}
