//! Offline HLS encoding pipeline.
//!
//! Scans `<root>/original` for source videos and ensures a segmented
//! rendition exists under `<root>/hls/<id>/` (one `master.m3u8` plus
//! fixed-duration `segment_NNN.ts` files). Job state is derived purely
//! from the presence of the output manifest, so reruns are idempotent;
//! nothing is persisted.

mod executor;

pub use executor::EncodeExecutor;

use crate::media::resolve::is_safe_asset_id;
use crate::media::SOURCE_EXTENSIONS;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory under the storage root holding source files.
pub const ORIGINAL_DIR: &str = "original";
/// Directory under the storage root holding derived renditions.
pub const HLS_DIR: &str = "hls";
/// Manifest filename within each asset's output directory.
pub const MANIFEST_NAME: &str = "master.m3u8";

/// One discovered encode target.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Asset id derived from the source file stem.
    pub asset_id: String,
    /// Source file path under `original/`.
    pub input: PathBuf,
    /// Output directory under `hls/`.
    pub output_dir: PathBuf,
}

/// Outcome of a single encode job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The rendition was (re)encoded.
    Done,
    /// The manifest already existed and `force` was not set.
    Skipped,
    /// The encode failed; the batch continues.
    Failed(String),
}

/// Aggregate result of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub encoded: usize,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn record(&mut self, asset_id: &str, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Done => self.encoded += 1,
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Failed(reason) => {
                self.failed.push((asset_id.to_string(), reason));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.encoded + self.skipped + self.failed.len()
    }
}

/// Discover encode jobs under the storage root.
///
/// Scans the top level of `original/` for recognized containers. When
/// both `.mp4` and `.mov` exist for one id, the `.mp4` wins. Stems that
/// fail the asset-id safety rule are skipped with a warning so a
/// malicious source filename can never address outside the derived
/// root.
pub fn discover_jobs(root: &Path) -> Result<Vec<EncodeJob>> {
    let originals = root.join(ORIGINAL_DIR);
    if !originals.is_dir() {
        anyhow::bail!("Originals directory not found: {:?}", originals);
    }
    let hls_root = root.join(HLS_DIR);

    let mut inputs: BTreeMap<String, PathBuf> = BTreeMap::new();
    for entry in WalkDir::new(&originals)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_lowercase();
        if !SOURCE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!("Skipping source with non-UTF8 name: {:?}", path);
            continue;
        };
        if !is_safe_asset_id(stem) {
            tracing::warn!("Skipping source with unsafe id: {:?}", path);
            continue;
        }

        // mp4 wins over mov for the same id.
        let keep_existing = ext == "mov"
            && matches!(
                inputs.get(stem),
                Some(existing) if existing.extension() == Some("mp4".as_ref())
            );
        if !keep_existing {
            inputs.insert(stem.to_string(), path.to_path_buf());
        }
    }

    Ok(inputs
        .into_iter()
        .map(|(asset_id, input)| EncodeJob {
            output_dir: hls_root.join(&asset_id),
            asset_id,
            input,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed_root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join(ORIGINAL_DIR)).unwrap();
        (dir, root)
    }

    #[test]
    fn discovers_recognized_sources() {
        let (_dir, root) = seed_root();
        fs::write(root.join("original/intro.mp4"), b"x").unwrap();
        fs::write(root.join("original/breathing.mov"), b"x").unwrap();
        fs::write(root.join("original/notes.txt"), b"x").unwrap();

        let jobs = discover_jobs(&root).unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["breathing", "intro"]);
        for job in &jobs {
            assert!(job.output_dir.starts_with(root.join(HLS_DIR)));
        }
    }

    #[test]
    fn prefers_mp4_over_mov() {
        let (_dir, root) = seed_root();
        fs::write(root.join("original/intro.mov"), b"x").unwrap();
        fs::write(root.join("original/intro.mp4"), b"x").unwrap();

        let jobs = discover_jobs(&root).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].input.extension().unwrap(), "mp4");
    }

    #[test]
    fn skips_unsafe_stems() {
        let (_dir, root) = seed_root();
        fs::write(root.join("original/evil..name.mp4"), b"x").unwrap();
        fs::write(root.join("original/fine.mp4"), b"x").unwrap();

        let jobs = discover_jobs(&root).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].asset_id, "fine");
    }

    #[test]
    fn missing_originals_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_jobs(dir.path()).is_err());
    }

    #[test]
    fn report_accounting() {
        let mut report = BatchReport::default();
        report.record("a", JobOutcome::Done);
        report.record("b", JobOutcome::Skipped);
        report.record("c", JobOutcome::Failed("encoder exited with 1".into()));
        assert_eq!(report.encoded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.total(), 3);
    }
}
