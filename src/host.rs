//! Boundary to whatever presents the client to a user
//!
//! A host shows blocking notifications and performs the "save as" of a
//! downloaded report. The console front-end uses [`DownloadDirHost`];
//! embedders and tests can use [`RecordingHost`].

use crate::state::Notification;
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait Host {
    /// Show a message the user has to acknowledge
    fn notify(&mut self, notification: &Notification);

    /// Offer `bytes` to the user as a file named `file_name`
    fn save_file(&mut self, file_name: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Prints notifications and writes saved files into a directory
#[derive(Debug, Clone)]
pub struct DownloadDirHost {
    dir: PathBuf,
}

impl DownloadDirHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Host for DownloadDirHost {
    fn notify(&mut self, notification: &Notification) {
        println!("[!] {}", notification);
    }

    fn save_file(&mut self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        let mut file = fs::File::create(&path)?;
        file.write_all(bytes)?;
        info!("saved {} ({} bytes)", path.display(), bytes.len());
        println!("Saved {}", path.display());
        Ok(())
    }
}

/// Keeps everything in memory
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub notifications: Vec<Notification>,
    pub saved: Vec<(String, Vec<u8>)>,
    /// When set, `save_file` fails with this message
    pub fail_saves: Option<String>,
}

impl Host for RecordingHost {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }

    fn save_file(&mut self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(reason) = &self.fail_saves {
            return Err(std::io::Error::other(reason.clone()));
        }
        self.saved.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
