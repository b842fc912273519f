//! Session state machine
//!
//! The session only records what the client believes about its credentials:
//! the server keeps no session, every request is authenticated on its own.
//! The epoch counts session generations; a response is only applied if it
//! was requested in the current generation.

use log::info;

pub const MSG_FILL_ALL_FIELDS: &str = "Please fill in all fields";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid Credentials";
pub const MSG_SIGNUP_FAILED: &str = "Username already exists or invalid data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// What the auth form submits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        }
    }
}

/// Why an authenticated session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The user logged out
    Logout,
    /// The server answered 401 to an authenticated request
    Demoted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    mode: AuthMode,
    last_error: Option<String>,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            mode: AuthMode::Login,
            last_error: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Does a response requested at `epoch` still belong to this session?
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.last_error = None;
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(crate) fn fail(&mut self, message: &str) {
        self.last_error = Some(message.to_string());
    }

    pub(crate) fn enter(&mut self) {
        self.state = SessionState::Authenticated;
        self.last_error = None;
        self.epoch += 1;
        info!("session authenticated (epoch {})", self.epoch);
    }

    pub(crate) fn end(&mut self, reason: EndReason) {
        if self.is_authenticated() {
            info!("session ended: {:?} (epoch {})", reason, self.epoch);
        }
        self.state = SessionState::Unauthenticated;
        self.epoch += 1;
    }

    /// The signup succeeded; the user logs in next
    pub(crate) fn registered(&mut self) {
        self.mode = AuthMode::Login;
        self.last_error = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
