//! Encode job executor.
//!
//! Runs ffmpeg as one blocking subprocess per job with an explicit
//! argument list (never shell-interpolated, so filenames cannot inject
//! options) and bounded stderr capture.

use super::{discover_jobs, BatchReport, EncodeJob, JobOutcome, HLS_DIR, MANIFEST_NAME};
use crate::config::{Config, EncodingConfig};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{error, info, warn};

/// Cap on captured encoder stderr. ffmpeg front-loads its useful
/// diagnostics; the cap keeps memory bounded however chatty it gets.
const STDERR_CAP: u64 = 64 * 1024;

/// Batch encode executor.
pub struct EncodeExecutor {
    settings: EncodingConfig,
    ffmpeg: PathBuf,
}

impl EncodeExecutor {
    /// Create an executor from the loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.encoding.clone(),
            ffmpeg: config.tools.ffmpeg.clone(),
        }
    }

    /// Encode every discovered source under `root`.
    ///
    /// A per-file failure is recorded and never aborts the remaining
    /// jobs. With `force`, existing renditions are re-encoded.
    pub fn run_batch(&self, root: &Path, force: bool) -> Result<BatchReport> {
        let jobs = discover_jobs(root)?;
        std::fs::create_dir_all(root.join(HLS_DIR))
            .with_context(|| format!("Failed to create {:?}", root.join(HLS_DIR)))?;

        if jobs.is_empty() {
            info!("No input videos found under original/");
            return Ok(BatchReport::default());
        }

        let mut report = BatchReport::default();
        for job in &jobs {
            let outcome = self.encode_one(job, force);
            match &outcome {
                JobOutcome::Done => info!(asset_id = %job.asset_id, "Encode complete"),
                JobOutcome::Skipped => {
                    info!(asset_id = %job.asset_id, "Manifest exists, skipping")
                }
                JobOutcome::Failed(reason) => {
                    error!(asset_id = %job.asset_id, reason = %reason, "Encode failed")
                }
            }
            report.record(&job.asset_id, outcome);
        }

        info!(
            encoded = report.encoded,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Encoding finished"
        );
        Ok(report)
    }

    /// Encode a single job, deriving the outcome from manifest presence
    /// and the encoder's exit status.
    pub fn encode_one(&self, job: &EncodeJob, force: bool) -> JobOutcome {
        let manifest = job.output_dir.join(MANIFEST_NAME);
        if manifest.exists() && !force {
            return JobOutcome::Skipped;
        }

        if !job.input.is_file() {
            return JobOutcome::Failed(format!("Input file not found: {:?}", job.input));
        }

        if let Err(e) = std::fs::create_dir_all(&job.output_dir) {
            return JobOutcome::Failed(format!(
                "Failed to create output dir {:?}: {}",
                job.output_dir, e
            ));
        }

        let args = self.build_args(&job.input, &job.output_dir);
        info!(asset_id = %job.asset_id, "Starting encode");
        tracing::debug!("FFmpeg args: {:?}", args);

        let mut child = match Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return JobOutcome::Failed(format!(
                    "Failed to execute {:?}: {}",
                    self.ffmpeg, e
                ));
            }
        };

        let mut stderr = String::new();
        if let Some(pipe) = child.stderr.take() {
            let mut capped = pipe.take(STDERR_CAP);
            let mut buf = Vec::new();
            if let Err(e) = capped.read_to_end(&mut buf) {
                warn!(asset_id = %job.asset_id, "Failed to read encoder stderr: {}", e);
            }
            // Drain past the cap so the child never blocks on a full pipe.
            let _ = std::io::copy(&mut capped.into_inner(), &mut std::io::sink());
            stderr = String::from_utf8_lossy(&buf).into_owned();
        }

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => return JobOutcome::Failed(format!("Failed to wait on encoder: {}", e)),
        };

        if status.success() {
            JobOutcome::Done
        } else {
            let diagnostics = stderr.lines().rev().take(5).collect::<Vec<_>>();
            JobOutcome::Failed(format!(
                "Encoder exited with {}: {}",
                status,
                diagnostics.into_iter().rev().collect::<Vec<_>>().join(" | ")
            ))
        }
    }

    /// Build the ffmpeg argument list for a single-rendition HLS encode.
    fn build_args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        let segment_pattern = output_dir.join("segment_%03d.ts");
        let manifest = output_dir.join(MANIFEST_NAME);

        vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.settings.preset.clone(),
            "-crf".to_string(),
            self.settings.crf.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-ar".to_string(),
            "48000".to_string(),
            "-b:a".to_string(),
            self.settings.audio_bitrate.clone(),
            "-vf".to_string(),
            self.settings.scale.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-hls_time".to_string(),
            self.settings.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_segment_filename".to_string(),
            segment_pattern.to_string_lossy().to_string(),
            manifest.to_string_lossy().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> EncodeExecutor {
        EncodeExecutor::new(&Config::default())
    }

    #[test]
    fn test_build_args_shape() {
        let args = executor().build_args(
            Path::new("/data/original/intro.mp4"),
            Path::new("/data/hls/intro"),
        );

        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "-i");
        assert_eq!(args[2], "/data/original/intro.mp4");
        assert_eq!(args.last().unwrap(), "/data/hls/intro/master.m3u8");

        let crf_pos = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf_pos + 1], "22");
        let hls_time_pos = args.iter().position(|a| a == "-hls_time").unwrap();
        assert_eq!(args[hls_time_pos + 1], "4");
        assert!(args.contains(&"scale=-2:720".to_string()));
        assert!(args.contains(&"/data/hls/intro/segment_%03d.ts".to_string()));
    }

    #[test]
    fn test_build_args_never_quotes() {
        // Args go straight to execve; a filename with spaces or shell
        // metacharacters stays one argument.
        let args = executor().build_args(
            Path::new("/data/original/my file; rm -rf.mp4"),
            Path::new("/data/hls/out"),
        );
        assert_eq!(args[2], "/data/original/my file; rm -rf.mp4");
        assert!(!args.iter().any(|a| a.contains('"')));
    }

    #[test]
    fn test_settings_flow_through() {
        let mut config = Config::default();
        config.encoding.crf = 18;
        config.encoding.segment_seconds = 6;
        config.encoding.preset = "slow".to_string();
        let exec = EncodeExecutor::new(&config);
        let args = exec.build_args(Path::new("in.mp4"), Path::new("out"));
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "18"));
        assert!(args.windows(2).any(|w| w[0] == "-hls_time" && w[1] == "6"));
        assert!(args.windows(2).any(|w| w[0] == "-preset" && w[1] == "slow"));
    }
}
