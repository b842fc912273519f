/*!
# Chemical Visualizer Client

Client core for a chemical-data analysis service, built in Rust.

## Overview

Users log in (or sign up) against the analysis backend, upload a CSV file of
molecules, and get back summary statistics and a distribution that can be
drawn as a bar chart. Every upload is kept in a short history, and each one
has a PDF report that can be downloaded.

## Architecture

The client is organised around a single reducer:

### State Layer
- **AppState** - credentials, session, upload, history
- **Action** - everything a user or a finished request can cause
- **Effect** - what the reducer asks the outside world to do (requests,
  notifications, saving a report, cancelling work)

### Driver Layer
- **Controller** - runs requested calls as tokio tasks and feeds their
  completions back into the reducer
- **Host** - shows notifications and saves downloaded files

### Network Layer
- **ApiClient** - endpoint table and response classification
- **Transport** - async seam; `ReqwestTransport` in production

## Session Rules

- Credentials are only accepted once a protected call succeeds; signing up
  never logs in.
- Every request carries the session epoch it was issued under; completions
  from an older epoch are dropped.
- A `401` on any protected call while logged in ends the session.

## Modules

- **credentials**: username/password store with secret handling
- **session**: authentication state machine
- **state**: reducer, actions and effects
- **workflows**: upload, history and report steps
- **controller**: async driver
- **api**: endpoints and transports
- **view**: render-ready projections
- **host**: notification and file-saving boundary
- **cli**: interactive console front-end

## REST API Endpoints

- `GET /api/history/` - upload history, also used to check credentials
- `POST /api/register/` - create an account
- `POST /api/upload/` - analyse a CSV file (multipart field `file`)
- `GET /api/pdf/{id}/` - PDF report for an upload
*/

pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod host;
pub mod models;
pub mod session;
pub mod state;
pub mod view;
pub mod workflows;

/// Re-export the types most callers need
pub use api::{ApiClient, ApiOutcome, ReqwestTransport, Transport};
pub use config::ClientConfig;
pub use controller::Controller;
pub use credentials::Credentials;
pub use error::{ClientError, ConfigError, Result};
pub use host::{DownloadDirHost, Host, RecordingHost};
pub use models::{AnalysisResult, HistoryEntry, SelectedFile, StatValue, UploadId};
pub use session::{AuthMode, Session, SessionState};
pub use state::{Action, AppState, Effect, Notification};
pub use view::Screen;
