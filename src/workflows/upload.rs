use crate::api::ApiCall;
use crate::error::{ClientError, Result};
use crate::models::{AnalysisResult, SelectedFile};
use crate::state::{AppState, Effect, Notification, Ticket};
use crate::workflows::history;
use log::{debug, info, warn};
use uuid::Uuid;

/// File selection, the single in-flight upload, and the latest result
#[derive(Debug, Default)]
pub struct UploadWorkflow {
    pending: Option<SelectedFile>,
    in_flight: Option<Uuid>,
    result: Option<AnalysisResult>,
}

impl UploadWorkflow {
    /// The file the next upload will send
    pub fn pending(&self) -> Option<&SelectedFile> {
        self.pending.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub(crate) fn select(&mut self, file: SelectedFile) {
        debug!("selected {:?}", file);
        self.pending = Some(file);
    }

    pub(crate) fn reset(&mut self) {
        self.pending = None;
        self.in_flight = None;
        self.result = None;
    }
}

/// Submit the selected file, unless there is none or one is already on its way
pub(crate) fn start(state: &mut AppState) -> Vec<Effect> {
    if !state.session.is_authenticated() {
        debug!("upload skipped: not authenticated");
        return Vec::new();
    }
    let Some(file) = state.upload.pending.clone() else {
        debug!("upload skipped: no file selected");
        return Vec::new();
    };
    if let Some(request_id) = state.upload.in_flight {
        warn!("upload rejected: {} still in flight", request_id);
        return vec![Effect::Notify(Notification::UploadBusy)];
    }

    info!("uploading {}", file.file_name);
    let ticket = state.ticket();
    state.upload.in_flight = Some(ticket.request_id);
    vec![Effect::Request {
        ticket,
        call: ApiCall::Upload(file),
    }]
}

pub(crate) fn finished(
    state: &mut AppState,
    ticket: Ticket,
    result: Result<AnalysisResult>,
) -> Vec<Effect> {
    if state.upload.in_flight == Some(ticket.request_id) {
        state.upload.in_flight = None;
    }

    match result {
        Ok(result) => {
            info!("analysis {} received", result.id);
            state.upload.result = Some(result);
            history::fetch(state)
        }
        Err(ClientError::Unauthorized) => state.demote(),
        Err(e) => {
            warn!("upload failed: {}", e);
            vec![Effect::Notify(Notification::UploadFailed)]
        }
    }
}
