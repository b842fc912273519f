//! Async driver around the reducer
//!
//! The controller owns the [`AppState`], runs each requested backend call as
//! a task in a [`JoinSet`], and feeds the completions back through
//! [`AppState::apply`]. State is only touched from the task that owns the
//! controller, one action at a time.
//!
//! `dispatch` spawns tasks and therefore must be called from within a tokio
//! runtime.

use crate::api::{ApiClient, ApiOutcome, CallKind};
use crate::error::ClientError;
use crate::host::Host;
use crate::state::{Action, AppState, Effect, Notification, Ticket};
use log::{debug, error};
use std::collections::HashMap;
use tokio::task::{self, JoinSet};

pub struct Controller<H: Host> {
    state: AppState,
    api: ApiClient,
    host: H,
    tasks: JoinSet<ApiOutcome>,
    /// Ticket and call of every task not yet joined
    pending: HashMap<task::Id, (Ticket, CallKind)>,
}

impl<H: Host> Controller<H> {
    pub fn new(api: ApiClient, host: H) -> Self {
        Self {
            state: AppState::new(),
            api,
            host,
            tasks: JoinSet::new(),
            pending: HashMap::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Number of requests still running
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Apply a user action and start whatever it requires
    pub fn dispatch(&mut self, action: Action) {
        let effects = self.state.apply(action);
        self.run(effects);
    }

    /// Wait for one request to finish and apply its result
    ///
    /// A task that panicked completes as a transport failure of its call.
    /// Returns `false` once nothing is in flight.
    pub async fn step(&mut self) -> bool {
        loop {
            match self.tasks.join_next_with_id().await {
                None => return false,
                Some(Ok((id, outcome))) => {
                    let Some((ticket, _)) = self.pending.remove(&id) else {
                        error!("task {} finished without a ticket", id);
                        return true;
                    };
                    self.dispatch(Action::Completed { ticket, outcome });
                    return true;
                }
                Some(Err(err)) => {
                    let entry = self.pending.remove(&err.id());
                    if err.is_cancelled() {
                        debug!("request task cancelled");
                        continue;
                    }
                    error!("request task failed: {}", err);
                    if let Some((ticket, kind)) = entry {
                        let outcome = kind.failed(ClientError::Transport(format!(
                            "request task failed: {}",
                            err
                        )));
                        self.dispatch(Action::Completed { ticket, outcome });
                    }
                    return true;
                }
            }
        }
    }

    /// Process completions until no request is in flight
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request { ticket, call } => {
                    // Credentials are read now, not when the action was created
                    let auth = self.state.credentials().basic_auth();
                    let api = self.api.clone();
                    let kind = call.kind();
                    debug!("spawning {:?} ({})", kind, ticket.request_id);
                    let handle = self.tasks.spawn(async move { api.call(call, auth).await });
                    self.pending.insert(handle.id(), (ticket, kind));
                }
                Effect::Notify(notification) => self.host.notify(&notification),
                Effect::SaveReport {
                    id,
                    file_name,
                    bytes,
                } => {
                    if let Err(e) = self.host.save_file(&file_name, &bytes) {
                        error!("could not save {}: {}", file_name, e);
                        self.host.notify(&Notification::ReportFailed { id });
                    }
                }
                Effect::CancelInFlight => {
                    if !self.tasks.is_empty() {
                        debug!("cancelling {} in-flight requests", self.tasks.len());
                        self.tasks.abort_all();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::{HISTORY_PATH, UPLOAD_PATH};
    use crate::host::RecordingHost;
    use crate::models::{SelectedFile, UploadId};
    use crate::session::MSG_INVALID_CREDENTIALS;
    use std::sync::Arc;

    const HISTORY_BODY: &str = r#"[{"id": 42, "filename": "molecules.csv", "date": "2024-02-01 03:15 PM"}]"#;

    fn controller(transport: &Arc<ScriptedTransport>) -> Controller<RecordingHost> {
        Controller::new(ApiClient::new(transport.clone()), RecordingHost::default())
    }

    async fn login(ctl: &mut Controller<RecordingHost>, user: &str, pass: &str) {
        ctl.dispatch(Action::SetUsername(user.into()));
        ctl.dispatch(Action::SetPassword(pass.into()));
        ctl.dispatch(Action::Submit);
        ctl.settle().await;
    }

    #[tokio::test]
    async fn scenario_a_wrong_password() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 401, "");
        let mut ctl = controller(&transport);

        login(&mut ctl, "alice", "wrong").await;

        assert!(!ctl.state().session().is_authenticated());
        assert_eq!(ctl.state().session().last_error(), Some(MSG_INVALID_CREDENTIALS));
        assert_eq!(transport.count(HISTORY_PATH), 1);
    }

    #[tokio::test]
    async fn login_issues_probe_and_exactly_one_fetch() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 200, HISTORY_BODY);
        transport.reply(HISTORY_PATH, 200, HISTORY_BODY);
        let mut ctl = controller(&transport);

        login(&mut ctl, "alice", "pw").await;

        assert!(ctl.state().session().is_authenticated());
        assert_eq!(transport.count(HISTORY_PATH), 2);
        assert_eq!(ctl.state().history()[0].id, UploadId(42));
        assert_eq!(ctl.in_flight(), 0);
    }

    #[tokio::test]
    async fn scenario_b_upload_then_history() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(
            UPLOAD_PATH,
            200,
            r#"{"id":42,"stats":{"avg_mass":18.0153},"distribution":{"H2O":5}}"#,
        );
        transport.reply(HISTORY_PATH, 200, HISTORY_BODY);
        let mut ctl = controller(&transport);
        login(&mut ctl, "alice", "pw").await;

        ctl.dispatch(Action::SelectFile(SelectedFile::new(
            "molecules.csv",
            b"name,mass\n".to_vec(),
        )));
        ctl.dispatch(Action::Upload);
        ctl.settle().await;

        let result = ctl.state().analysis().unwrap();
        assert_eq!(result.id, UploadId(42));
        assert_eq!(transport.count(HISTORY_PATH), 3);
        assert_eq!(ctl.state().history().len(), 1);
        let upload = transport
            .seen()
            .into_iter()
            .find(|r| r.path == UPLOAD_PATH)
            .unwrap();
        assert_eq!(upload.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn scenario_c_report_is_saved() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply("/api/pdf/42/", 200, b"%PDF-1.4".to_vec());
        let mut ctl = controller(&transport);
        login(&mut ctl, "alice", "pw").await;

        ctl.dispatch(Action::DownloadReport(UploadId(42)));
        ctl.settle().await;

        assert_eq!(
            ctl.host().saved,
            vec![("report_42.pdf".to_string(), b"%PDF-1.4".to_vec())]
        );
    }

    #[tokio::test]
    async fn failed_save_is_surfaced() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply("/api/pdf/7/", 200, b"%PDF".to_vec());
        let mut ctl = controller(&transport);
        login(&mut ctl, "alice", "pw").await;
        ctl.host_mut().fail_saves = Some("disk full".into());

        ctl.dispatch(Action::DownloadReport(UploadId(7)));
        ctl.settle().await;

        assert_eq!(
            ctl.host().notifications,
            vec![Notification::ReportFailed { id: UploadId(7) }]
        );
    }

    #[tokio::test]
    async fn logout_cancels_in_flight_requests() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(
            UPLOAD_PATH,
            200,
            r#"{"id":1,"stats":{},"distribution":{}}"#,
        );
        let mut ctl = controller(&transport);
        login(&mut ctl, "alice", "pw").await;

        ctl.dispatch(Action::SelectFile(SelectedFile::new("a.csv", b"x".to_vec())));
        ctl.dispatch(Action::Upload);
        ctl.dispatch(Action::Logout);
        ctl.settle().await;

        assert!(ctl.state().analysis().is_none());
        assert!(ctl.state().history().is_empty());
        assert!(!ctl.state().session().is_authenticated());
        assert!(ctl.host().notifications.is_empty());
    }

    #[tokio::test]
    async fn panicked_upload_releases_the_in_flight_marker() {
        let transport = ScriptedTransport::new();
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.reply(HISTORY_PATH, 200, "[]");
        transport.panic_on(UPLOAD_PATH);
        let mut ctl = controller(&transport);
        login(&mut ctl, "alice", "pw").await;

        ctl.dispatch(Action::SelectFile(SelectedFile::new("a.csv", b"x".to_vec())));
        ctl.dispatch(Action::Upload);
        ctl.settle().await;

        assert!(!ctl.state().upload().is_in_flight());
        assert!(ctl.state().session().is_authenticated());
        assert_eq!(ctl.host().notifications, vec![Notification::UploadFailed]);

        ctl.dispatch(Action::Upload);
        ctl.settle().await;

        assert_eq!(transport.count(UPLOAD_PATH), 2);
        assert_eq!(
            ctl.host().notifications,
            vec![Notification::UploadFailed, Notification::UploadFailed]
        );
    }
}
