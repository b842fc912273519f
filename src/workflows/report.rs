use crate::api::ApiCall;
use crate::error::{ClientError, Result};
use crate::models::UploadId;
use crate::state::{AppState, Effect, Notification};
use log::{debug, warn};

/// Name under which the report of upload `id` is saved
pub fn report_file_name(id: UploadId) -> String {
    format!("report_{}.pdf", id)
}

pub(crate) fn request(state: &mut AppState, id: UploadId) -> Vec<Effect> {
    if !state.session.is_authenticated() {
        debug!("report {} skipped: not authenticated", id);
        return Vec::new();
    }
    vec![state.request(ApiCall::FetchReport(id))]
}

/// Hand the PDF to the host; failures are surfaced, not retried
pub(crate) fn finished(state: &mut AppState, id: UploadId, result: Result<Vec<u8>>) -> Vec<Effect> {
    match result {
        Ok(bytes) => vec![Effect::SaveReport {
            id,
            file_name: report_file_name(id),
            bytes,
        }],
        Err(ClientError::Unauthorized) => state.demote(),
        Err(e) => {
            warn!("report {} could not be fetched: {}", id, e);
            vec![Effect::Notify(Notification::ReportFailed { id })]
        }
    }
}
