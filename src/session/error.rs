use std::path::PathBuf;

use thiserror::Error;

use crate::merger::MergeError;

/// Session-fatal failures. Per-chunk problems (bad URLs, short windows,
/// abnormal recorder exits) are handled inside the loop and never surface
/// here.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("URL provider failed {attempts} consecutive times, giving up")]
    ProviderExhausted {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("merge failed; chunk files retained in {} for manual recovery", dir.display())]
    MergeFailed {
        dir: PathBuf,
        #[source]
        source: MergeError,
    },
}
