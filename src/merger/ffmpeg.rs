use std::fs;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{error, info, warn};

use super::{MergeError, MergeReport, Merger};
use crate::recorder::Chunk;

const MANIFEST_FILE: &str = "chunks.txt";

/// Joins chunk files with ffmpeg's concat demuxer (`-f concat -c copy`):
/// byte-level concatenation, zero re-encoding.
pub struct FfmpegMerger;

impl FfmpegMerger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the concat-demuxer manifest: one `file '<path>'` line per chunk.
/// Single quotes in paths use ffmpeg's `'\''` quoting, so a user-supplied
/// output directory cannot break the manifest.
fn concat_manifest(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| {
            let escaped = p.display().to_string().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Split chunk records into those with a file on disk and the sequence
/// numbers of those without. Partial files from failed or interrupted
/// captures count as present.
fn partition_existing(chunks: &[Chunk]) -> (Vec<Chunk>, Vec<u32>) {
    let mut present = Vec::new();
    let mut missing = Vec::new();
    for chunk in chunks {
        if chunk.path.exists() {
            present.push(chunk.clone());
        } else {
            missing.push(chunk.sequence);
        }
    }
    (present, missing)
}

#[async_trait::async_trait]
impl Merger for FfmpegMerger {
    async fn merge(
        &self,
        chunks: &[Chunk],
        output_path: &Path,
    ) -> Result<MergeReport, MergeError> {
        let (mut present, missing) = partition_existing(chunks);
        present.sort_by_key(|c| c.sequence);

        for sequence in &missing {
            warn!(
                "Chunk {} has no file on disk, merged output will have a gap",
                sequence
            );
        }

        if present.is_empty() {
            return Err(MergeError::NoChunks);
        }

        let dir = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let manifest_path = dir.join(MANIFEST_FILE);

        let absolute_paths: Vec<PathBuf> = present
            .iter()
            .map(|c| fs::canonicalize(&c.path).unwrap_or_else(|_| c.path.clone()))
            .collect();

        fs::write(&manifest_path, concat_manifest(&absolute_paths)).map_err(|source| {
            MergeError::Manifest {
                path: manifest_path.clone(),
                source,
            }
        })?;

        info!(
            "Merging {} chunks into {}",
            present.len(),
            output_path.display()
        );

        let status = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&manifest_path)
            .args(["-c", "copy"])
            .arg(output_path)
            .status()
            .await;

        // The manifest is transient plumbing, gone on every exit path
        if let Err(e) = fs::remove_file(&manifest_path) {
            warn!("Failed to remove concat manifest: {}", e);
        }

        let status = status.map_err(MergeError::Spawn)?;

        if !status.success() {
            error!(
                "Concatenation failed, {} chunk files retained in {}",
                present.len(),
                dir.display()
            );
            return Err(MergeError::ConcatFailed {
                detail: format!("ffmpeg exited with {}", status),
                retained: present.len(),
                dir,
            });
        }

        for chunk in &present {
            if let Err(e) = fs::remove_file(&chunk.path) {
                warn!(
                    "Failed to remove chunk file {}: {}",
                    chunk.path.display(),
                    e
                );
            }
        }

        info!(
            "Merge complete: {} chunks -> {}",
            present.len(),
            output_path.display()
        );

        Ok(MergeReport {
            output_path: output_path.to_path_buf(),
            merged: present.iter().map(|c| c.sequence).collect(),
            missing,
        })
    }
}
