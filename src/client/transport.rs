use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::error::ClientError;

const OFX_CONTENT_TYPE: &str = "application/x-ofx";
/// Not a registered media type, but sent by some institutions.
const LEGACY_CONTENT_TYPE: &str = "plain/text";

/// What came back from an OFX server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers a serialized request to an OFX server.
pub trait Transport: Send + Sync {
    fn post(&self, url: &str, body: &str) -> Result<TransportResponse, ClientError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, url: &str, body: &str) -> Result<TransportResponse, ClientError> {
        (**self).post(url, body)
    }
}

/// Blocking HTTPS transport.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(ReqwestTransport { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Transport for ReqwestTransport {
    fn post(&self, url: &str, body: &str) -> Result<TransportResponse, ClientError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, OFX_CONTENT_TYPE)
            .header(ACCEPT, OFX_CONTENT_TYPE)
            .body(body.to_owned())
            .send()?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes()?.to_vec();
        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Whether a `Content-Type` header announces an OFX body. Parameters such as `charset` are
/// ignored.
pub fn is_ofx_content_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(OFX_CONTENT_TYPE) || essence.eq_ignore_ascii_case(LEGACY_CONTENT_TYPE)
}

/// Rejects responses with a non-success status or a body that is not OFX.
pub fn check_response(response: &TransportResponse) -> Result<(), ClientError> {
    if !response.is_success() {
        return Err(ClientError::HttpStatus(response.status));
    }
    match response.content_type.as_deref() {
        Some(value) if is_ofx_content_type(value) => Ok(()),
        Some(value) => Err(ClientError::UnexpectedContentType(String::from(value))),
        None => Err(ClientError::UnexpectedContentType(String::from("(none)"))),
    }
}
