use std::io::{self, BufRead, Write};

/// Login credentials as an immutable value object, passed explicitly into
/// the auth flow and never stored in ambient state. The password is kept
/// out of `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies credentials and, when a challenge is raised, a one-time code.
/// Invoked synchronously; the auth state machine blocks until a value is
/// returned.
pub trait CredentialSource {
    fn credentials(&mut self) -> io::Result<Credentials>;
    fn one_time_code(&mut self) -> io::Result<String>;
}

/// Interactive collector reading from the terminal, with hidden password
/// input.
pub struct TerminalPrompt {
    /// Prefilled from the config's remembered username, if any.
    pub suggested_username: Option<String>,
}

impl TerminalPrompt {
    pub fn new(suggested_username: Option<String>) -> Self {
        Self { suggested_username }
    }

    fn read_line(prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl CredentialSource for TerminalPrompt {
    fn credentials(&mut self) -> io::Result<Credentials> {
        println!("🔐 Account credentials are required");
        let username = match &self.suggested_username {
            Some(suggested) => {
                let entered = Self::read_line(&format!("🔑 Username [{suggested}]: "))?;
                if entered.is_empty() {
                    suggested.clone()
                } else {
                    entered
                }
            }
            None => Self::read_line("🔑 Username: ")?,
        };
        let password = rpassword::prompt_password("🔑 Password: ")?;
        Ok(Credentials::new(username, password))
    }

    fn one_time_code(&mut self) -> io::Result<String> {
        println!("🔐 Two-factor authentication is required");
        Self::read_line("🔑 Enter the 2FA code: ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
