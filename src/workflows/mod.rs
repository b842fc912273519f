//! Per-feature workflows: upload, history and report retrieval
//!
//! Each module owns the state of its feature (if any) and the reducer steps
//! for its actions and completions. They are only reached through
//! [`AppState::apply`](crate::state::AppState::apply).

pub mod history;
pub mod report;
pub mod upload;

pub use history::HistoryWorkflow;
pub use upload::UploadWorkflow;
