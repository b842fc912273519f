use crate::api::ApiCall;
use crate::error::{ClientError, Result};
use crate::models::HistoryEntry;
use crate::state::{AppState, Effect};
use log::{debug, warn};

/// The user's past uploads, in the order the server listed them
#[derive(Debug, Default)]
pub struct HistoryWorkflow {
    entries: Vec<HistoryEntry>,
}

impl HistoryWorkflow {
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn replace(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries;
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Ask the server for the current list
pub(crate) fn fetch(state: &mut AppState) -> Vec<Effect> {
    if !state.session.is_authenticated() {
        debug!("history fetch skipped: not authenticated");
        return Vec::new();
    }
    vec![state.request(ApiCall::FetchHistory)]
}

/// Best-effort refresh: only a 401 has consequences beyond the log
pub(crate) fn finished(state: &mut AppState, result: Result<Vec<HistoryEntry>>) -> Vec<Effect> {
    match result {
        Ok(entries) => {
            debug!("history refreshed: {} entries", entries.len());
            state.history.replace(entries);
            Vec::new()
        }
        Err(ClientError::Unauthorized) => state.demote(),
        Err(e) => {
            warn!("history refresh failed, keeping previous list: {}", e);
            Vec::new()
        }
    }
}
