use thiserror::Error;

/// Errors raised while decoding, encoding or interpreting an OFX document.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("malformed OFX header: {0}")]
    MalformedHeader(String),
    #[error("tokenize error at byte {offset}: {message}")]
    Tokenize { offset: usize, message: String },
    #[error("unbalanced structure: {0}")]
    UnbalancedStructure(String),
    #[error("duplicate element <{name}> in <{parent}>")]
    DuplicateElement { parent: String, name: String },
    #[error("invalid document root: {0}")]
    InvalidRoot(String),
    #[error("invalid date `{0}`")]
    InvalidDate(String),
    #[error("invalid decimal `{0}`")]
    InvalidDecimal(String),
    #[error("missing element `{0}`")]
    MissingElement(String),
    /// The institution answered with a well-formed document whose sign-on status is an error.
    #[error("{message}")]
    ProtocolStatus { code: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`Bank`](crate::client::Bank) while talking to an institution.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("`{0}` must be specified")]
    MissingConfig(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("Expected: application/x-ofx or plain/text, Received: {0}")]
    UnexpectedContentType(String),
    /// The response could not be decoded or reported a failure; `raw` holds the body as received.
    #[error("{source}")]
    Ofx {
        #[source]
        source: Error,
        raw: String,
    },
}

impl ClientError {
    /// The OFX-level error behind this failure, if any.
    pub fn ofx_error(&self) -> Option<&Error> {
        match self {
            ClientError::Ofx { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The raw response body attached to an OFX-level failure.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ClientError::Ofx { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_status__display__is_institution_message() {
        let err = Error::ProtocolStatus {
            code: String::from("2000"),
            message: String::from("Something Has Failed!"),
        };

        assert_eq!(err.to_string(), "Something Has Failed!");
    }

    #[test]
    fn client_error__ofx__exposes_source_and_raw() {
        let err = ClientError::Ofx {
            source: Error::InvalidRoot(String::from("empty body")),
            raw: String::from("OFXHEADER:100"),
        };

        assert_eq!(err.ofx_error(), Some(&Error::InvalidRoot(String::from("empty body"))));
        assert_eq!(err.raw(), Some("OFXHEADER:100"));
        assert_eq!(err.to_string(), "invalid document root: empty body");
    }

    #[test]
    fn client_error__non_ofx__has_no_raw() {
        let err = ClientError::HttpStatus(500);

        assert_eq!(err.ofx_error(), None);
        assert_eq!(err.raw(), None);
    }
}
