//! A blocking OFX banking client.
//!
//! [`Bank`] signs on to an institution's OFX server and downloads account lists and statements.

use time::Date;
use tracing::{debug, info, warn};

pub use self::config::{BankAccount, BankConfig};
pub use self::response::{
    account_infos, check_signon, signon_status, statement, Account, AccountInfo, Balance, Severity,
    Status, Transaction,
};
pub use self::transport::{ReqwestTransport, Transport, TransportResponse};
use self::request::{account_info_request, statement_request, RequestStamp};
use self::transport::check_response;
use crate::error::{ClientError, Error};
use crate::ofx::Ofx;
use crate::{parse, ser};

pub mod config;
pub mod request;
pub mod response;
pub mod transport;

/// The result of an account list request.
#[derive(Clone, Debug)]
pub struct AccountList {
    pub accounts: Vec<AccountInfo>,
    /// The parsed response.
    pub ofx: Ofx,
    /// The response body as received.
    pub raw: String,
}

/// The result of a statement request.
#[derive(Clone, Debug)]
pub struct Statement {
    pub account: Account,
    pub ofx: Ofx,
    pub raw: String,
}

pub struct Bank<T = ReqwestTransport> {
    config: BankConfig,
    transport: T,
}

impl Bank<ReqwestTransport> {
    /// Creates a client talking HTTPS to `config.url`.
    pub fn new(config: BankConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Bank { config, transport })
    }
}

impl<T: Transport> Bank<T> {
    pub fn with_transport(config: BankConfig, transport: T) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Bank { config, transport })
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Lists the accounts the user holds with the institution.
    pub fn get_accounts(&self) -> Result<AccountList, ClientError> {
        let request = account_info_request(&self.config, &RequestStamp::generate());
        let (ofx, raw) = self.exchange(&request)?;
        match account_infos(&ofx) {
            Ok(accounts) => {
                info!(accounts = accounts.len(), "downloaded account list");
                Ok(AccountList { accounts, ofx, raw })
            }
            Err(source) => Err(ClientError::Ofx { source, raw }),
        }
    }

    /// Downloads the statement of `account` for transactions posted from `start` to `end`, or to
    /// the present when `end` is `None`.
    pub fn get_statement(
        &self,
        account: &BankAccount,
        start: Date,
        end: Option<Date>,
    ) -> Result<Statement, ClientError> {
        let request =
            statement_request(&self.config, account, start, end, &RequestStamp::generate());
        let (ofx, raw) = self.exchange(&request)?;
        match statement(&ofx) {
            Ok(account) => {
                info!(
                    account = %account.number,
                    transactions = account.transactions.len(),
                    "downloaded statement"
                );
                Ok(Statement { account, ofx, raw })
            }
            Err(source) => Err(ClientError::Ofx { source, raw }),
        }
    }

    /// Sends `request` and returns the parsed response with its raw body, failing on a rejected
    /// sign-on.
    fn exchange(&self, request: &Ofx) -> Result<(Ofx, String), ClientError> {
        let body = ser::to_string(request);
        debug!(url = %self.config.url, bytes = body.len(), "posting OFX request");

        let response = self.transport.post(&self.config.url, &body)?;
        debug!(
            status = response.status,
            content_type = response.content_type.as_deref().unwrap_or_default(),
            bytes = response.body.len(),
            "received OFX response"
        );
        check_response(&response)?;

        let raw = parse::decode(&response.body).into_owned();
        let parsed = parse::from_str(&raw).and_then(|ofx| {
            check_signon(&ofx)?;
            Ok::<_, Error>(ofx)
        });
        match parsed {
            Ok(ofx) => Ok((ofx, raw)),
            Err(source) => {
                warn!(%source, "OFX response rejected");
                Err(ClientError::Ofx { source, raw })
            }
        }
    }
}
