//! Per-run log file sink.
//!
//! One human-readable line per message, appended to a timestamped file
//! under the log directory. No machine schema; the structured event
//! stream on stderr is the machine-facing channel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Create `dir/YYYY-MM-DD-HH-MM.txt`, creating the directory as
    /// needed.
    pub async fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let filename = Local::now().format("%Y-%m-%d-%H-%M").to_string() + ".txt";
        let path = dir.join(filename);

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line, echoing it to stdout.
    pub async fn log(&self, message: &str) -> Result<()> {
        println!("{message}");

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;
        file.write_all(message.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}
