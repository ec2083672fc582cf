// SPDX-License-Identifier: GPL-3.0-or-later

use scrobbler_core::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrobblerError>;

#[derive(Debug, Error)]
pub enum ScrobblerError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Rate limiter closed")]
    RateLimiterClosed,

    #[error("The API handle this entity belongs to has been dropped")]
    ApiDropped,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("API error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("Invalid response from the web service: {0}")]
    InvalidResponse(String),

    #[error("XML decoding error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
