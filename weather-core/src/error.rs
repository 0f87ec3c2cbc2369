use reqwest::StatusCode;
use std::{error::Error as StdError, fmt};
use thiserror::Error;

/// A unit code outside the supported set reached the converter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Unsupported temperature unit '{0}'. Supported units: C, F.")]
    UnsupportedUnit(String),
}

/// Failure of a single upstream HTTP call, other than "not found".
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response is unusable: {reason}")]
    Payload {
        endpoint: &'static str,
        reason: String,
    },
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Transport { source, .. } if source.is_timeout())
    }
}

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Which half of the pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStage {
    Geocode,
    Weather,
}

impl fmt::Display for ProviderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStage::Geocode => f.write_str("geocode"),
            ProviderStage::Weather => f.write_str("weather"),
        }
    }
}

/// Fatal provider failure. "Not found" is never represented by this type;
/// it is an `Ok(None)` from the provider.
#[derive(Debug, Error)]
#[error("Error retrieving {stage} for zip code {zip}")]
pub struct ProviderError {
    stage: ProviderStage,
    zip: String,
    #[source]
    source: BoxError,
}

impl ProviderError {
    pub fn new(stage: ProviderStage, zip: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            stage,
            zip: zip.into(),
            source: source.into(),
        }
    }

    pub fn geocode(zip: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::new(ProviderStage::Geocode, zip, source)
    }

    pub fn weather(zip: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::new(ProviderStage::Weather, zip, source)
    }

    pub fn stage(&self) -> ProviderStage {
        self.stage
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    /// The wrapped cause, e.g. an [`UpstreamError`].
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }
}
