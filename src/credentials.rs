use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Username/password pair attached to every authenticated request
///
/// Held in memory only. The password is kept in a [`SecretString`] and is
/// never printed by `Debug`.
pub struct Credentials {
    username: String,
    password: SecretString,
}

/// Snapshot of the credentials taken when a request is built
///
/// Requests carry their own copy so later edits to the store never leak into
/// a request that is already in flight.
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: SecretString::from(""),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = username.to_string();
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = SecretString::from(password);
    }

    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }

    /// Both fields are non-empty
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && self.has_password()
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && !self.has_password()
    }

    /// Forget both fields
    pub fn clear(&mut self) {
        self.username.clear();
        self.password = SecretString::from("");
    }

    /// Compose the basic-auth pair for an outgoing request
    ///
    /// Returns `None` while either field is empty.
    pub fn basic_auth(&self) -> Option<BasicAuth> {
        if !self.is_complete() {
            return None;
        }
        Some(BasicAuth {
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret()),
        })
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
