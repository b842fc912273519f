//! Interactive console front-end
//!
//! Reads one command per line, turns it into an [`Action`], lets the
//! controller finish the requests it started, and prints the resulting
//! screen.

use crate::controller::Controller;
use crate::host::Host;
use crate::models::{SelectedFile, UploadId};
use crate::session::AuthMode;
use crate::state::Action;
use crate::view;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Commands:
  user <name>           Set the username
  pass <password>       Set the password
  mode <login|signup>   Choose what submit does
  toggle                Switch between login and signup
  submit                Log in or sign up
  file <path>           Select a CSV file to upload
  upload                Upload the selected file
  history               Refresh the upload history
  report [id]           Download a report (defaults to the current result)
  show                  Print the current screen
  logout                Log out
  help                  Show this help
  q                     Quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Pass(String),
    Mode(AuthMode),
    Toggle,
    Submit,
    File(PathBuf),
    Upload,
    History,
    Report(Option<UploadId>),
    Show,
    Logout,
    Help,
    Quit,
}

/// Parse one input line
///
/// # Errors
/// * A short hint when the command is unknown or its argument is missing
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let required = |what: &str| -> Result<String, String> {
        if arg.is_empty() {
            Err(format!("usage: {} <{}>", name, what))
        } else {
            Ok(arg.to_string())
        }
    };

    match name {
        "user" => required("name").map(Command::User),
        // An empty password is allowed; submit reports it
        "pass" => Ok(Command::Pass(arg.to_string())),
        "mode" => match arg {
            "login" => Ok(Command::Mode(AuthMode::Login)),
            "signup" => Ok(Command::Mode(AuthMode::Signup)),
            _ => Err("usage: mode <login|signup>".to_string()),
        },
        "toggle" => Ok(Command::Toggle),
        "submit" => Ok(Command::Submit),
        "file" => required("path").map(|p| Command::File(PathBuf::from(p))),
        "upload" => Ok(Command::Upload),
        "history" => Ok(Command::History),
        "report" if arg.is_empty() => Ok(Command::Report(None)),
        "report" => arg
            .parse()
            .map(|id| Command::Report(Some(id)))
            .map_err(|_| format!("invalid report id: {}", arg)),
        "show" => Ok(Command::Show),
        "logout" => Ok(Command::Logout),
        "help" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "" => Err("invalid command".to_string()),
        other => Err(format!("unknown command: {} (try `help`)", other)),
    }
}

/// Run the command loop until `q` or end of input
pub async fn run<R, W, H>(
    controller: &mut Controller<H>,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    H: Host,
{
    let mut lines = input.lines();
    writeln!(out, "{}", view::project(controller.state()))?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(hint) => {
                writeln!(out, "{}", hint)?;
                continue;
            }
        };

        let action = match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Command::Show => None,
            Command::User(name) => Some(Action::SetUsername(name)),
            Command::Pass(password) => Some(Action::SetPassword(password)),
            Command::Mode(mode) => Some(Action::SetMode(mode)),
            Command::Toggle => Some(Action::ToggleMode),
            Command::Submit => Some(Action::Submit),
            Command::File(path) => match SelectedFile::from_path(&path) {
                Ok(file) => Some(Action::SelectFile(file)),
                Err(e) => {
                    writeln!(out, "cannot read {}: {}", path.display(), e)?;
                    continue;
                }
            },
            Command::Upload => Some(Action::Upload),
            Command::History => Some(Action::FetchHistory),
            Command::Report(Some(id)) => Some(Action::DownloadReport(id)),
            Command::Report(None) => match controller.state().analysis() {
                Some(result) => Some(Action::DownloadReport(result.id)),
                None => {
                    writeln!(out, "no analysis yet; use `report <id>`")?;
                    continue;
                }
            },
            Command::Logout => Some(Action::Logout),
        };

        if let Some(action) = action {
            controller.dispatch(action);
            controller.settle().await;
        }
        writeln!(out, "{}", view::project(controller.state()))?;
    }

    Ok(())
}
