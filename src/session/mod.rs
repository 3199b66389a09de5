//! Recording session orchestration
//!
//! This module provides the `RecordingSession` abstraction that manages:
//! - Signed-URL fetching and expiry-aware window planning
//! - Chunk capture through the injected recorder
//! - Budget accounting and bounded provider retries
//! - Final merge and session reporting

mod clock;
mod config;
mod error;
mod session;
mod stats;

pub use clock::{Clock, SystemClock};
pub use config::SessionConfig;
pub use error::SessionError;
pub use session::RecordingSession;
pub use stats::SessionReport;
