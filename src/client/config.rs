use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

fn default_app_id() -> String {
    String::from("QWIN")
}

fn default_app_ver() -> String {
    String::from("2100")
}

fn default_language() -> String {
    String::from("ENG")
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection and sign-on settings for one institution.
///
/// The application id and version default to those of Quicken for Windows, which most servers
/// accept.
#[derive(Clone, Deserialize, Eq, PartialEq)]
pub struct BankConfig {
    /// The institution's OFX server endpoint.
    pub url: String,
    /// Financial institution id, sent as `FI/FID`.
    pub fid: String,
    /// Financial institution organisation, sent as `FI/ORG`.
    pub fidorg: String,
    pub user: String,
    pub pass: String,
    /// Client identifier registered with the institution. Required.
    #[serde(default)]
    pub clientuid: String,
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default = "default_app_ver")]
    pub app_ver: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BankConfig {
    pub fn new(
        url: impl Into<String>,
        fid: impl Into<String>,
        fidorg: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
        clientuid: impl Into<String>,
    ) -> Self {
        BankConfig {
            url: url.into(),
            fid: fid.into(),
            fidorg: fidorg.into(),
            user: user.into(),
            pass: pass.into(),
            clientuid: clientuid.into(),
            app_id: default_app_id(),
            app_ver: default_app_ver(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.clientuid.trim().is_empty() {
            return Err(ClientError::MissingConfig("clientuid"));
        }
        if self.url.trim().is_empty() {
            return Err(ClientError::MissingConfig("url"));
        }
        Ok(())
    }
}

impl fmt::Debug for BankConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankConfig")
            .field("url", &self.url)
            .field("fid", &self.fid)
            .field("fidorg", &self.fidorg)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("clientuid", &self.clientuid)
            .field("app_id", &self.app_id)
            .field("app_ver", &self.app_ver)
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A deposit account as addressed in `BANKACCTFROM`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct BankAccount {
    /// Routing number.
    pub bank_id: String,
    pub account_id: String,
    /// `CHECKING`, `SAVINGS`, `MONEYMRKT` or `CREDITLINE`.
    pub account_type: String,
}

impl BankAccount {
    pub fn new(
        bank_id: impl Into<String>,
        account_id: impl Into<String>,
        account_type: impl Into<String>,
    ) -> Self {
        BankAccount {
            bank_id: bank_id.into(),
            account_id: account_id.into(),
            account_type: account_type.into(),
        }
    }
}
