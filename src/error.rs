use thiserror::Error;

use crate::types::AppId;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("[{source_label}] unexpected status {status} for app {appid}")]
    UnexpectedStatus {
        source_label: &'static str,
        appid: AppId,
        status: u16,
    },

    #[error("[{source_label}] malformed payload for app {appid}: {detail}")]
    Payload {
        source_label: &'static str,
        appid: AppId,
        detail: String,
    },

    #[error("[{source_label}] transport failure for app {appid}: {inner}")]
    Transport {
        source_label: &'static str,
        appid: AppId,
        #[source]
        inner: reqwest::Error,
    },

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, HarvestError>;
