use crate::ytdlp::parser::{parse_search_results, ParseError};
use crate::{SearchEntries, VideoId};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const AUDIO_FORMAT: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";

#[derive(Debug, thiserror::Error)]
pub enum YtDlpClientError {
    #[error("Unable to run yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("yt-dlp exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error("Downloaded file is missing: {0}")]
    FileMissing(PathBuf),
}

/// Searches and downloads audio by driving the `yt-dlp` executable.
pub struct YtDlpClient {
    binary: PathBuf,
    download_directory: PathBuf,
    cookies_file: Option<PathBuf>,
}

impl YtDlpClient {
    pub fn create(
        binary: impl Into<PathBuf>,
        download_directory: impl Into<PathBuf>,
        cookies_file: Option<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            download_directory: download_directory.into(),
            cookies_file,
        }
    }

    pub fn download_directory(&self) -> &Path {
        &self.download_directory
    }

    /// Path the audio of `video_id` lands at after a successful download.
    pub fn audio_path(&self, video_id: &VideoId) -> PathBuf {
        self.download_directory
            .join(format!("{}.{}", video_id, AUDIO_FORMAT))
    }

    pub async fn search_music(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<SearchEntries, YtDlpClientError> {
        let search_term = format!("ytsearch{}:{}", limit, query);

        let stdout = self
            .run(&[
                "--flat-playlist",
                "--dump-json",
                "--ignore-errors",
                "--no-warnings",
                &search_term,
            ])
            .await?;

        let results = parse_search_results(&stdout)?;

        debug!(query, found = results.len(), "yt-dlp search finished");

        Ok(results)
    }

    pub async fn download_audio(&self, video_id: &VideoId) -> Result<PathBuf, YtDlpClientError> {
        tokio::fs::create_dir_all(&self.download_directory).await?;

        let args = self.download_arguments(video_id);
        self.run(&args.iter().map(String::as_str).collect::<Vec<_>>())
            .await?;

        let path = self.audio_path(video_id);

        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(path),
            _ => Err(YtDlpClientError::FileMissing(path)),
        }
    }

    // Ids may start with '-', so the url always follows "--".
    pub(crate) fn download_arguments(&self, video_id: &VideoId) -> Vec<String> {
        let output_template = self
            .download_directory
            .join("%(id)s.%(ext)s")
            .to_string_lossy()
            .to_string();

        [
            "--no-playlist",
            "--no-warnings",
            "--extract-audio",
            "--audio-format",
            AUDIO_FORMAT,
            "--audio-quality",
            AUDIO_QUALITY,
            "--output",
            &output_template,
            "--",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .chain([format!("{}{}", YOUTUBE_WATCH_URL, video_id)])
        .collect()
    }

    /// Removes every file yt-dlp may have produced for `video_id`,
    /// including `.part` leftovers of an interrupted download.
    pub async fn remove_artifacts(&self, video_id: &VideoId) -> Result<usize, std::io::Error> {
        let prefix = format!("{}.", video_id);
        let mut removed = 0;

        let mut dir_reader = match tokio::fs::read_dir(&self.download_directory).await {
            Ok(reader) => reader,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(error),
        };

        while let Some(entry) = dir_reader.next_entry().await? {
            let filename = entry.file_name().to_str().unwrap_or_default().to_string();

            if filename.starts_with(&prefix) {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(error) => warn!(?error, %filename, "Unable to remove download artifact"),
                }
            }
        }

        Ok(removed)
    }

    async fn run(&self, args: &[&str]) -> Result<String, YtDlpClientError> {
        let mut command = Command::new(&self.binary);

        if let Some(cookies_file) = &self.cookies_file {
            command.arg("--cookies").arg(cookies_file);
        }

        let output = command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(YtDlpClientError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
