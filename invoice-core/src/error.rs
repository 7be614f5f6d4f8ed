use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Message returned to clients for every render failure. The detail
/// stays in the log.
pub const CLIENT_ERROR_MESSAGE: &str = "PDF error; please try again;";

/// The request payload could not be understood at all, or its
/// amounts cannot be represented.
///
/// Individual unparseable fields never produce this; they fall back
/// to defaults.
#[derive(Error, Debug)]
pub enum RenderInputError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("`items` must be an array")]
    ItemsNotArray,

    #[error("item {index} must be an object")]
    ItemNotObject { index: usize },

    #[error("amount of item {index} is out of range")]
    AmountOutOfRange { index: usize },

    #[error("order total is out of range")]
    TotalOutOfRange,
}

/// Any failure while producing an invoice document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid invoice request: {0}")]
    Input(#[from] RenderInputError),

    #[error("logo asset {}: {source}", .path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logo image could not be decoded: {0}")]
    Image(#[from] pdf_core::ImageError),

    #[error("document write failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RenderError {
    /// HTTP status a request boundary should answer with.
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Generic, client-safe message.
    pub fn client_message(&self) -> &'static str {
        CLIENT_ERROR_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_generic_500() {
        let errors = vec![
            RenderError::from(RenderInputError::NotAnObject),
            RenderError::Config("bad".into()),
            RenderError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ];
        for err in errors {
            assert_eq!(err.status_code(), 500);
            assert_eq!(err.client_message(), "PDF error; please try again;");
        }
    }

    #[test]
    fn asset_error_names_the_path() {
        let err = RenderError::Asset {
            path: PathBuf::from("images/Logo.png"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "logo asset images/Logo.png: no such file");
    }
}
