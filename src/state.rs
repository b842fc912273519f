//! Application state and its single transition function
//!
//! Every user action and every request completion goes through
//! [`AppState::apply`], which mutates the state and returns the effects the
//! controller must perform. Nothing else writes to the state.

use crate::api::{ApiCall, ApiOutcome};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::models::{AnalysisResult, HistoryEntry, SelectedFile, UploadId};
use crate::session::{
    AuthMode, EndReason, MSG_FILL_ALL_FIELDS, MSG_INVALID_CREDENTIALS, MSG_SIGNUP_FAILED, Session,
};
use crate::workflows::{history, report, upload};
use crate::workflows::{HistoryWorkflow, UploadWorkflow};
use log::{debug, info};
use std::fmt;
use uuid::Uuid;

/// Tag carried by every in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Correlates log lines of one request
    pub request_id: Uuid,
    /// Session generation the request was issued in
    pub epoch: u64,
}

/// Blocking, user-visible messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    AccountCreated,
    UploadFailed,
    UploadBusy,
    ReportFailed { id: UploadId },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::AccountCreated => f.write_str("Account created! Please log in."),
            Notification::UploadFailed => f.write_str("Upload Failed"),
            Notification::UploadBusy => f.write_str("An upload is already in progress"),
            Notification::ReportFailed { id } => write!(f, "Report download failed for upload {}", id),
        }
    }
}

/// Work the controller performs after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Issue a backend call; credentials are attached when it is sent
    Request { ticket: Ticket, call: ApiCall },
    Notify(Notification),
    /// Hand a downloaded report to the host as `file_name`
    SaveReport {
        id: UploadId,
        file_name: String,
        bytes: Vec<u8>,
    },
    /// Abort every request still in flight
    CancelInFlight,
}

/// Inputs to the reducer
#[derive(Debug)]
pub enum Action {
    SetUsername(String),
    SetPassword(String),
    SetMode(AuthMode),
    ToggleMode,
    /// Login or signup, depending on the current mode
    Submit,
    Logout,
    SelectFile(SelectedFile),
    Upload,
    FetchHistory,
    DownloadReport(UploadId),
    Completed { ticket: Ticket, outcome: ApiOutcome },
}

/// Everything the client knows
#[derive(Debug, Default)]
pub struct AppState {
    pub(crate) credentials: Credentials,
    pub(crate) session: Session,
    pub(crate) upload: UploadWorkflow,
    pub(crate) history: HistoryWorkflow,
    /// Request id of the login probe that may still authenticate the session
    pending_probe: Option<Uuid>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn upload(&self) -> &UploadWorkflow {
        &self.upload
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.upload.result()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    /// Apply one action and return the effects it requires
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::SetUsername(username) => self.edit_credentials(|c| c.set_username(&username)),
            Action::SetPassword(password) => self.edit_credentials(|c| c.set_password(&password)),
            Action::SetMode(mode) => self.switch_mode(mode),
            Action::ToggleMode => self.switch_mode(self.session.mode().toggled()),
            Action::Submit => self.submit(),
            Action::Logout => self.end_session(EndReason::Logout),
            Action::SelectFile(file) => {
                self.upload.select(file);
                Vec::new()
            }
            Action::Upload => upload::start(self),
            Action::FetchHistory => history::fetch(self),
            Action::DownloadReport(id) => report::request(self, id),
            Action::Completed { ticket, outcome } => self.complete(ticket, outcome),
        }
    }

    pub(crate) fn ticket(&self) -> Ticket {
        Ticket {
            request_id: Uuid::new_v4(),
            epoch: self.session.epoch(),
        }
    }

    pub(crate) fn request(&self, call: ApiCall) -> Effect {
        Effect::Request {
            ticket: self.ticket(),
            call,
        }
    }

    /// Drop to Unauthenticated after a 401, without telling the user
    pub(crate) fn demote(&mut self) -> Vec<Effect> {
        self.end_session(EndReason::Demoted)
    }

    /// Lower the session flag and clear everything that depends on it
    fn end_session(&mut self, reason: EndReason) -> Vec<Effect> {
        self.credentials.clear();
        self.upload.reset();
        self.history.clear();
        self.pending_probe = None;
        self.session.end(reason);
        vec![Effect::CancelInFlight]
    }

    fn edit_credentials(&mut self, edit: impl FnOnce(&mut Credentials)) -> Vec<Effect> {
        if self.session.is_authenticated() {
            debug!("ignoring credential edit while authenticated");
            return Vec::new();
        }
        edit(&mut self.credentials);
        self.pending_probe = None;
        Vec::new()
    }

    fn switch_mode(&mut self, mode: AuthMode) -> Vec<Effect> {
        self.session.set_mode(mode);
        self.pending_probe = None;
        Vec::new()
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.session.is_authenticated() {
            debug!("ignoring submit while authenticated");
            return Vec::new();
        }

        // Only the probe issued below, if any, may log in
        self.pending_probe = None;
        self.session.clear_error();
        if !self.credentials.is_complete() {
            self.session.fail(MSG_FILL_ALL_FIELDS);
            return Vec::new();
        }

        match self.session.mode() {
            AuthMode::Login => {
                let ticket = self.ticket();
                self.pending_probe = Some(ticket.request_id);
                vec![Effect::Request {
                    ticket,
                    call: ApiCall::LoginProbe,
                }]
            }
            AuthMode::Signup => vec![self.request(ApiCall::Register)],
        }
    }

    fn complete(&mut self, ticket: Ticket, outcome: ApiOutcome) -> Vec<Effect> {
        if !self.session.is_current(ticket.epoch) {
            debug!(
                "dropping stale response {} (epoch {}, current {})",
                ticket.request_id,
                ticket.epoch,
                self.session.epoch()
            );
            return Vec::new();
        }

        match outcome {
            ApiOutcome::LoginProbe(result) => self.login_finished(ticket, result),
            ApiOutcome::Register(result) => self.register_finished(result),
            ApiOutcome::History(result) => history::finished(self, result),
            ApiOutcome::Upload(result) => upload::finished(self, ticket, result),
            ApiOutcome::Report { id, result } => report::finished(self, id, result),
        }
    }

    fn login_finished(&mut self, ticket: Ticket, result: Result<()>) -> Vec<Effect> {
        if self.pending_probe != Some(ticket.request_id) {
            debug!("dropping superseded login probe {}", ticket.request_id);
            return Vec::new();
        }
        self.pending_probe = None;

        match result {
            Ok(()) => {
                self.session.enter();
                let mut effects = vec![Effect::CancelInFlight];
                effects.extend(history::fetch(self));
                effects
            }
            Err(e) => {
                info!("login rejected: {}", e);
                self.session.fail(MSG_INVALID_CREDENTIALS);
                Vec::new()
            }
        }
    }

    fn register_finished(&mut self, result: Result<()>) -> Vec<Effect> {
        match result {
            Ok(()) => {
                info!("account created for {}", self.credentials.username());
                self.session.registered();
                vec![Effect::Notify(Notification::AccountCreated)]
            }
            Err(e) => {
                info!("signup rejected: {}", e);
                self.session.fail(MSG_SIGNUP_FAILED);
                Vec::new()
            }
        }
    }
}
