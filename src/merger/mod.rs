use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::recorder::Chunk;

pub mod ffmpeg;

pub use ffmpeg::FfmpegMerger;

/// Result of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// The merged output file
    pub output_path: PathBuf,
    /// Sequence numbers that went into the output, ascending
    pub merged: Vec<u32>,
    /// Sequence numbers whose chunk file was absent (gaps in the output)
    pub missing: Vec<u32>,
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("no chunk files present to merge")]
    NoChunks,

    #[error("failed to write concat manifest {path:?}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run the concat subprocess")]
    Spawn(#[source] std::io::Error),

    #[error("concatenation failed ({detail}); {retained} chunk files retained in {dir:?} for manual recovery")]
    ConcatFailed {
        detail: String,
        retained: usize,
        dir: PathBuf,
    },
}

/// Lossless concatenation of ordered chunks into one continuous artifact.
#[async_trait::async_trait]
pub trait Merger: Send + Sync {
    /// Merge the chunks that exist on disk, in ascending sequence order,
    /// without re-encoding. On success the chunk files and any transient
    /// manifest are removed; on failure the chunk files are left intact.
    async fn merge(&self, chunks: &[Chunk], output_path: &Path)
        -> Result<MergeReport, MergeError>;
}
