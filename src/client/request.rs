//! Assembly of sign-on, statement and account list requests.

use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::config::{BankAccount, BankConfig};
use crate::ofx::{Aggregate, Header, Ofx};
use crate::value::{encode_text, format_date, format_datetime};

/// Requests ask for accounts updated since this date, which is in practice all of them.
const ACCOUNTS_SINCE: &str = "19700101";

/// A random lowercase hex id of at most 32 characters.
fn random_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

/// The per-request identifiers and timestamp.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestStamp {
    /// `NEWFILEUID` header value.
    pub new_file_uid: String,
    /// Transaction id echoed back by the server.
    pub trn_uid: String,
    /// `CLTCOOKIE`, a short opaque client value.
    pub cookie: String,
    /// `DTCLIENT`.
    pub client_time: OffsetDateTime,
}

impl RequestStamp {
    pub fn generate() -> Self {
        RequestStamp {
            new_file_uid: random_id(32),
            trn_uid: random_id(32),
            cookie: random_id(5),
            client_time: OffsetDateTime::now_utc(),
        }
    }
}

/// Builds the `SIGNONMSGSRQV1` aggregate.
pub fn signon(config: &BankConfig, stamp: &RequestStamp) -> Aggregate {
    Aggregate::new("SIGNONMSGSRQV1").with_child(
        Aggregate::new("SONRQ")
            .with_leaf("DTCLIENT", format_datetime(stamp.client_time))
            .with_leaf("USERID", encode_text(&config.user))
            .with_leaf("USERPASS", encode_text(&config.pass))
            .with_leaf("LANGUAGE", encode_text(&config.language))
            .with_child(
                Aggregate::new("FI")
                    .with_leaf("ORG", encode_text(&config.fidorg))
                    .with_leaf("FID", encode_text(&config.fid)),
            )
            .with_leaf("APPID", encode_text(&config.app_id))
            .with_leaf("APPVER", encode_text(&config.app_ver))
            .with_leaf("CLIENTUID", encode_text(&config.clientuid)),
    )
}

fn envelope(config: &BankConfig, stamp: &RequestStamp, messages: Aggregate) -> Ofx {
    Ofx::new(
        Header::request_v103(stamp.new_file_uid.as_str()),
        Aggregate::new("OFX")
            .with_child(signon(config, stamp))
            .with_child(messages),
    )
}

/// Builds a bank statement download request covering `start` to `end`, or to the present when
/// `end` is `None`.
pub fn statement_request(
    config: &BankConfig,
    account: &BankAccount,
    start: Date,
    end: Option<Date>,
    stamp: &RequestStamp,
) -> Ofx {
    let mut inctran = Aggregate::new("INCTRAN").with_leaf("DTSTART", format_date(start));
    if let Some(end) = end {
        inctran.push_leaf("DTEND", format_date(end));
    }
    inctran.push_leaf("INCLUDE", "Y");

    let messages = Aggregate::new("BANKMSGSRQV1").with_child(
        Aggregate::new("STMTTRNRQ")
            .with_leaf("TRNUID", stamp.trn_uid.as_str())
            .with_leaf("CLTCOOKIE", stamp.cookie.as_str())
            .with_child(
                Aggregate::new("STMTRQ")
                    .with_child(
                        Aggregate::new("BANKACCTFROM")
                            .with_leaf("BANKID", encode_text(&account.bank_id))
                            .with_leaf("ACCTID", encode_text(&account.account_id))
                            .with_leaf("ACCTTYPE", encode_text(&account.account_type)),
                    )
                    .with_child(inctran),
            ),
    );
    envelope(config, stamp, messages)
}

/// Builds an account list request.
pub fn account_info_request(config: &BankConfig, stamp: &RequestStamp) -> Ofx {
    let messages = Aggregate::new("SIGNUPMSGSRQV1").with_child(
        Aggregate::new("ACCTINFOTRNRQ")
            .with_leaf("TRNUID", stamp.trn_uid.as_str())
            .with_child(Aggregate::new("ACCTINFORQ").with_leaf("DTACCTUP", ACCOUNTS_SINCE)),
    );
    envelope(config, stamp, messages)
}
