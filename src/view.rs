//! Render-ready projections of the application state
//!
//! Nothing here mutates state; every function derives what a front-end
//! needs to draw from the current [`AppState`].

use crate::models::{AnalysisResult, HistoryEntry, UploadId};
use crate::session::AuthMode;
use crate::state::AppState;
use std::fmt;

/// Data source for the distribution bar chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

/// Labels and counts in the order the server sent the buckets
pub fn chart_data(result: &AnalysisResult) -> ChartData {
    ChartData {
        labels: result.distribution.keys().map(str::to_string).collect(),
        values: result.distribution.values().copied().collect(),
    }
}

/// One summary tile above the chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: String,
    pub value: String,
}

/// Metric tiles; an `avg_` prefix is dropped from the label
pub fn stat_cards(result: &AnalysisResult) -> Vec<StatCard> {
    result
        .stats
        .iter()
        .map(|(key, value)| StatCard {
            label: key.replacen("avg_", "", 1),
            value: value.to_string(),
        })
        .collect()
}

/// A history entry with its 1-based position in the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub position: usize,
    pub id: UploadId,
    pub filename: String,
    pub date: String,
}

/// Format of the date column; dates the client cannot parse are shown as sent
pub const HISTORY_ROW_DATE_FORMAT: &str = "%d %b %Y, %H:%M";

pub fn history_rows(entries: &[HistoryEntry]) -> Vec<HistoryRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| HistoryRow {
            position: i + 1,
            id: entry.id,
            filename: entry.filename.clone(),
            date: entry
                .uploaded_at()
                .map(|at| at.format(HISTORY_ROW_DATE_FORMAT).to_string())
                .unwrap_or_else(|| entry.date.clone()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthScreen {
    pub title: &'static str,
    pub submit_label: &'static str,
    pub toggle_prompt: &'static str,
    pub toggle_label: &'static str,
    pub username: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardScreen {
    pub username: String,
    pub pending_file: Option<String>,
    pub uploading: bool,
    pub stats: Vec<StatCard>,
    pub chart: Option<ChartData>,
    /// Id whose report the "full report" button fetches
    pub report_id: Option<UploadId>,
    pub history: Vec<HistoryRow>,
}

/// Which screen the state calls for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Auth(AuthScreen),
    Dashboard(DashboardScreen),
}

pub fn project(state: &AppState) -> Screen {
    let session = state.session();
    if !session.is_authenticated() {
        let (title, submit_label, toggle_prompt, toggle_label) = match session.mode() {
            AuthMode::Login => ("Welcome Back", "Sign In", "New here?", "Create Account"),
            AuthMode::Signup => (
                "Create Account",
                "Sign Up",
                "Already have an account?",
                "Login",
            ),
        };
        return Screen::Auth(AuthScreen {
            title,
            submit_label,
            toggle_prompt,
            toggle_label,
            username: state.credentials().username().to_string(),
            error: session.last_error().map(str::to_string),
        });
    }

    let analysis = state.analysis();
    Screen::Dashboard(DashboardScreen {
        username: state.credentials().username().to_string(),
        pending_file: state.upload().pending().map(|f| f.file_name.clone()),
        uploading: state.upload().is_in_flight(),
        stats: analysis.map(stat_cards).unwrap_or_default(),
        chart: analysis.map(chart_data),
        report_id: analysis.map(|a| a.id),
        history: history_rows(state.history()),
    })
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Auth(auth) => {
                writeln!(f, "== {} ==", auth.title)?;
                writeln!(f, "username: {}", auth.username)?;
                if let Some(error) = &auth.error {
                    writeln!(f, "error: {}", error)?;
                }
                write!(
                    f,
                    "`submit` to {} | {} `toggle` to {}",
                    auth.submit_label, auth.toggle_prompt, auth.toggle_label
                )
            }
            Screen::Dashboard(dash) => {
                writeln!(f, "== Chemical Visualizer ({}) ==", dash.username)?;
                match &dash.pending_file {
                    Some(name) if dash.uploading => writeln!(f, "file: {} (uploading...)", name)?,
                    Some(name) => writeln!(f, "file: {}", name)?,
                    None => writeln!(f, "file: none selected")?,
                }
                for card in &dash.stats {
                    writeln!(f, "  {:<16} {}", card.label.to_uppercase(), card.value)?;
                }
                if let Some(chart) = &dash.chart {
                    writeln!(f, "Distribution")?;
                    for (label, value) in chart.labels.iter().zip(&chart.values) {
                        let bar = "#".repeat((*value).min(40) as usize);
                        writeln!(f, "  {:<16} {:>5} {}", label, value, bar)?;
                    }
                }
                if let Some(id) = dash.report_id {
                    writeln!(f, "`report` downloads report_{}.pdf", id)?;
                }
                writeln!(f, "Recent Uploads")?;
                if dash.history.is_empty() {
                    write!(f, "  No history found.")
                } else {
                    let rows: Vec<String> = dash
                        .history
                        .iter()
                        .map(|row| {
                            format!(
                                "  {}. {} [{}] id={}",
                                row.position, row.filename, row.date, row.id
                            )
                        })
                        .collect();
                    write!(f, "{}", rows.join("\n"))
                }
            }
        }
    }
}
