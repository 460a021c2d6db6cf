//! Error types and failure classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all quote operations
//! - [`FailureClass`]: How an aggregation reports a failed source
//!
//! "Currency not listed by this source" is deliberately absent: adapters
//! report it as `Ok(None)`, never as an error.

mod classification;

pub use classification::FailureClass;

use thiserror::Error;

/// Errors that can occur while fetching, decoding or converting quotes.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("Transport error: {source_id} - {message}")]
    Transport {
        /// The source that failed
        source_id: String,
        /// Underlying transport message
        message: String,
    },

    /// The upstream answered with a non-success HTTP status.
    #[error("Unexpected status from {source_id}: {status}")]
    Status {
        /// The source that answered
        source_id: String,
        /// HTTP status code
        status: u16,
    },

    /// The upstream answered 200 but its payload carried a failure code.
    #[error("Upstream rejected request: {source_id} - {code}: {message}")]
    Rejected {
        /// The source that answered
        source_id: String,
        /// Status code found in the payload
        code: String,
        /// Message found in the payload, if any
        message: String,
    },

    /// The payload could not be decoded (bad encoding, malformed JSON).
    #[error("Decode error: {source_id} - {message}")]
    Decode {
        /// The source whose payload failed to decode
        source_id: String,
        /// Decoder message
        message: String,
    },

    /// The expected table or array is missing from the payload.
    /// Usually means the upstream page changed.
    #[error("Layout error: {source_id} - {message}")]
    Layout {
        /// The source whose layout changed
        source_id: String,
        /// What was missing
        message: String,
    },

    /// The source's deadline expired.
    #[error("Timeout: {source_id}")]
    Timeout {
        /// The source that timed out
        source_id: String,
    },

    /// The conversion cannot be computed from this source's quote.
    #[error("Conversion unsupported: {0}")]
    ConversionUnsupported(String),

    /// Caller input was rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller named a source that is not registered.
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// A network error that was not attributed to a specific source.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Builds the error for a failed request, keeping timeouts distinct.
    pub fn from_request(source_id: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                source_id: source_id.to_string(),
            }
        } else {
            Self::Transport {
                source_id: source_id.to_string(),
                message: error.to_string(),
            }
        }
    }

    /// Returns how an aggregation should report this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use fxrate_market_data::errors::{FailureClass, MarketDataError};
    ///
    /// let error = MarketDataError::Timeout { source_id: "BOC".to_string() };
    /// assert_eq!(error.failure_class(), FailureClass::Timeout);
    ///
    /// let error = MarketDataError::Layout {
    ///     source_id: "CGB".to_string(),
    ///     message: "rate table missing".to_string(),
    /// };
    /// assert_eq!(error.failure_class(), FailureClass::Miss);
    /// ```
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Timeout { .. } => FailureClass::Timeout,
            Self::Network(e) if e.is_timeout() => FailureClass::Timeout,

            Self::Transport { .. }
            | Self::Status { .. }
            | Self::Rejected { .. }
            | Self::Decode { .. }
            | Self::Layout { .. }
            | Self::ConversionUnsupported(_)
            | Self::InvalidInput(_)
            | Self::UnknownSource(_)
            | Self::Network(_) => FailureClass::Miss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_timeout_class() {
        let error = MarketDataError::Timeout {
            source_id: "BOC".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Timeout);
    }

    #[test]
    fn test_transport_is_miss() {
        let error = MarketDataError::Transport {
            source_id: "CIB".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Miss);
    }

    #[test]
    fn test_status_is_miss() {
        let error = MarketDataError::Status {
            source_id: "UNIONPAY".to_string(),
            status: 404,
        };
        assert_eq!(error.failure_class(), FailureClass::Miss);
    }

    #[test]
    fn test_layout_and_decode_are_miss() {
        let layout = MarketDataError::Layout {
            source_id: "BOC".to_string(),
            message: "rate table missing".to_string(),
        };
        let decode = MarketDataError::Decode {
            source_id: "CMB".to_string(),
            message: "expected value".to_string(),
        };
        assert_eq!(layout.failure_class(), FailureClass::Miss);
        assert_eq!(decode.failure_class(), FailureClass::Miss);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::Rejected {
            source_id: "CITIC".to_string(),
            code: "E0001".to_string(),
            message: "busy".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Upstream rejected request: CITIC - E0001: busy"
        );

        let error = MarketDataError::ConversionUnsupported("USD -> HKD".to_string());
        assert_eq!(format!("{}", error), "Conversion unsupported: USD -> HKD");

        let error = MarketDataError::Status {
            source_id: "BOC".to_string(),
            status: 503,
        };
        assert_eq!(format!("{}", error), "Unexpected status from BOC: 503");
    }
}
