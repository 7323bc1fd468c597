//! Authentication: the credential value object, the collector seam, and
//! the login state machine.
//!
//! `AuthSession` runs `Unauthenticated → CredentialsSubmitted →
//! (TwoFactorPending | Authenticated | Failed)` over a swappable
//! `LoginApi` transport. Failure is terminal for the run.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialSource, Credentials, TerminalPrompt};
pub use session::{AuthSession, AuthState, LoginApi, LoginReply, TwoFactorInfo};
