use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Removes retained downloads once they are older than `max_age`.
pub(crate) struct DownloadSweeper {
    directory: PathBuf,
    max_age: Duration,
}

impl DownloadSweeper {
    pub(crate) fn new(directory: PathBuf, max_age: Duration) -> Self {
        Self { directory, max_age }
    }

    pub(crate) async fn sweep(&self) -> Result<usize, std::io::Error> {
        let mut dir_reader = match tokio::fs::read_dir(&self.directory).await {
            Ok(reader) => reader,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(error),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = dir_reader.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => {
                    warn!(path = %entry.path().display(), ?error, "Unable to remove stale download")
                }
            }
        }

        Ok(removed)
    }

    pub(crate) async fn run(self, interval: Duration) {
        info!(directory = %self.directory.display(), "Download sweeper started");

        loop {
            match self.sweep().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Stale downloads removed"),
                Err(error) => warn!(?error, "Download sweep failed"),
            }

            actix_rt::time::sleep(interval).await;
        }
    }
}
