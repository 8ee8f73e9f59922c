//! External merge capability: ordered concatenation of staged media
//! files, implemented over ffmpeg's concat demuxer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::MergeConfig;
use crate::error::RestitchError;

/// One concatenation order: `inputs` merged into `output`, in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// External merge capability. Implementations must fail loudly when an
/// input is missing or unreadable; codecs are never inspected here.
#[async_trait]
pub trait MergeRunner: Send + Sync {
    async fn concat(&self, request: &MergeRequest) -> Result<(), RestitchError>;
}

/// [`MergeRunner`] invoking ffmpeg's concat demuxer with stream copy.
pub struct FfmpegMerger {
    config: MergeConfig,
}

impl FfmpegMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    fn build_args(list_path: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

/// Concat-demuxer list document. Single quotes in paths are closed,
/// escaped and reopened per the demuxer's quoting rules.
fn concat_list(inputs: &[PathBuf]) -> String {
    let mut list = String::new();
    for input in inputs {
        let path = input.to_string_lossy().replace('\'', "'\\''");
        list.push_str("file '");
        list.push_str(&path);
        list.push_str("'\n");
    }
    list
}

#[async_trait]
impl MergeRunner for FfmpegMerger {
    async fn concat(&self, request: &MergeRequest) -> Result<(), RestitchError> {
        if request.inputs.is_empty() {
            return Err(RestitchError::merge_failure("no input files"));
        }

        let mut list_file = tempfile::Builder::new()
            .prefix("restitch-concat-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| RestitchError::io("create concat list", &std::env::temp_dir(), e))?;
        list_file
            .write_all(concat_list(&request.inputs).as_bytes())
            .map_err(|e| RestitchError::io("write concat list", list_file.path(), e))?;

        debug!(
            inputs = request.inputs.len(),
            output = %request.output.display(),
            "merging"
        );

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(Self::build_args(list_file.path(), &request.output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RestitchError::merge_failure(format!(
                    "failed to launch `{}`: {e}",
                    self.config.ffmpeg_path
                ))
            })?;

        let mut stderr_pipe = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut buffer).await;
            }
            buffer
        });

        let status = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(RestitchError::MergeTimeout { limit });
                }
            },
            None => child.wait().await,
        }
        .map_err(|e| RestitchError::merge_failure(format!("waiting for merge process: {e}")))?;

        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let detail = stderr_output.trim();
            let reason = if detail.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {detail}")
            };
            return Err(RestitchError::merge_failure(reason));
        }

        Ok(())
    }
}
