pub mod config;
pub mod merger;
pub mod planner;
pub mod provider;
pub mod recorder;
pub mod session;
pub mod stop;

pub use config::Config;
pub use merger::{FfmpegMerger, MergeError, MergeReport, Merger};
pub use planner::{plan_window, WindowPlan};
pub use provider::{extract_expiry, LiveApiProvider, MalformedUrl, UrlProvider};
pub use recorder::{Chunk, ChunkOutcome, FfmpegRecorder, Recorder, RecorderConfig};
pub use session::{
    Clock, RecordingSession, SessionConfig, SessionError, SessionReport, SystemClock,
};
pub use stop::StopFlag;
