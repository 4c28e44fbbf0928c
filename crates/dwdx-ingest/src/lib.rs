//! Fetch and normalize DWD forecast and observation feeds
//!
//! Two independent pipelines share the same [`dwdx_core::StateWriter`]:
//! - [`ForecastPipeline`] mirrors the JSON station overview (forecast1,
//!   forecast2, days)
//! - [`ObservationPipeline`] mirrors the newest row of the hourly POI CSV
//!   reports

pub mod datefmt;
pub mod fetch;
pub mod forecast;
pub mod observation;

pub use datefmt::*;
pub use fetch::*;
pub use forecast::*;
pub use observation::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Malformed data: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::Transport(e.to_string())
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
