//! Extraction of sign-on status, statements and account lists from response documents.

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::warn;

use super::config::BankAccount;
use crate::error::{Error, Result};
use crate::ofx::{Aggregate, Ofx};

const SIGNON_STATUS: [&str; 3] = ["SIGNONMSGSRSV1", "SONRS", "STATUS"];
const BANK_STATEMENT: [&str; 3] = ["BANKMSGSRSV1", "STMTTRNRS", "STMTRS"];
const CARD_STATEMENT: [&str; 3] = ["CREDITCARDMSGSRSV1", "CCSTMTTRNRS", "CCSTMTRS"];
const ACCOUNT_LIST: [&str; 3] = ["SIGNUPMSGSRSV1", "ACCTINFOTRNRS", "ACCTINFORS"];

fn required<'a>(aggregate: &'a Aggregate, name: &str) -> Result<&'a str> {
    aggregate
        .value(name)
        .ok_or_else(|| Error::MissingElement(format!("{}/{name}", aggregate.name())))
}

fn optional_text(aggregate: &Aggregate, name: &str) -> Option<String> {
    aggregate
        .leaf(name)
        .map(|leaf| leaf.as_text().into_owned())
        .filter(|text| !text.is_empty())
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Unknown(String),
}

impl From<&str> for Severity {
    fn from(value: &str) -> Self {
        match value {
            "INFO" => Severity::Info,
            "WARN" => Severity::Warn,
            "ERROR" => Severity::Error,
            other => Severity::Unknown(String::from(other)),
        }
    }
}

/// A `STATUS` aggregate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Status {
    pub code: String,
    pub severity: Severity,
    pub message: Option<String>,
}

impl Status {
    pub fn from_aggregate(status: &Aggregate) -> Result<Self> {
        Ok(Status {
            code: String::from(required(status, "CODE")?),
            severity: Severity::from(required(status, "SEVERITY")?),
            message: optional_text(status, "MESSAGE"),
        })
    }
}

/// Reads `SIGNONMSGSRSV1/SONRS/STATUS`, if the document has one.
pub fn signon_status(ofx: &Ofx) -> Result<Option<Status>> {
    ofx.root
        .find(&SIGNON_STATUS)
        .map(Status::from_aggregate)
        .transpose()
}

/// Fails with [`Error::ProtocolStatus`] when the sign-on status has severity `ERROR`.
pub fn check_signon(ofx: &Ofx) -> Result<()> {
    match signon_status(ofx)? {
        Some(Status {
            code,
            severity: Severity::Error,
            message,
        }) => {
            let message = message.unwrap_or_default();
            warn!(%code, %message, "institution rejected the request");
            Err(Error::ProtocolStatus { code, message })
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Balance {
    pub amount: Decimal,
    pub as_of: Option<OffsetDateTime>,
}

impl Balance {
    fn from_aggregate(balance: &Aggregate) -> Result<Self> {
        let amount = balance
            .leaf("BALAMT")
            .ok_or_else(|| Error::MissingElement(format!("{}/BALAMT", balance.name())))?
            .as_decimal()?;
        let as_of = balance.leaf("DTASOF").map(|l| l.as_date()).transpose()?;
        Ok(Balance { amount, as_of })
    }
}

/// A `STMTTRN` aggregate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    /// `TRNTYPE`, e.g. `DEBIT` or `CREDIT`.
    pub kind: String,
    pub posted: OffsetDateTime,
    pub amount: Decimal,
    pub fit_id: String,
    pub name: Option<String>,
    pub memo: Option<String>,
}

impl Transaction {
    pub fn from_aggregate(trn: &Aggregate) -> Result<Self> {
        let posted = trn
            .leaf("DTPOSTED")
            .ok_or_else(|| Error::MissingElement(String::from("STMTTRN/DTPOSTED")))?
            .as_date()?;
        let amount = trn
            .leaf("TRNAMT")
            .ok_or_else(|| Error::MissingElement(String::from("STMTTRN/TRNAMT")))?
            .as_decimal()?;
        Ok(Transaction {
            kind: String::from(required(trn, "TRNTYPE")?),
            posted,
            amount,
            fit_id: String::from(required(trn, "FITID")?),
            name: optional_text(trn, "NAME"),
            memo: optional_text(trn, "MEMO"),
        })
    }
}

/// A statement for one account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub currency: String,
    /// Routing number; absent for credit card accounts.
    pub routing: Option<String>,
    pub number: String,
    pub account_type: Option<String>,
    pub ledger_balance: Option<Balance>,
    /// `AVAILBAL`, or the ledger balance when the institution sends none.
    pub available_balance: Option<Balance>,
    pub transactions: Vec<Transaction>,
}

/// Extracts the first bank statement, or failing that the first credit card statement.
pub fn statement(ofx: &Ofx) -> Result<Account> {
    let (stmt, from_name) = match ofx.root.find(&BANK_STATEMENT) {
        Some(stmt) => (stmt, "BANKACCTFROM"),
        None => match ofx.root.find(&CARD_STATEMENT) {
            Some(stmt) => (stmt, "CCACCTFROM"),
            None => return Err(Error::MissingElement(BANK_STATEMENT.join("/"))),
        },
    };
    let from = stmt
        .aggregate(from_name)
        .ok_or_else(|| Error::MissingElement(format!("{}/{from_name}", stmt.name())))?;

    let ledger_balance = stmt
        .aggregate("LEDGERBAL")
        .map(Balance::from_aggregate)
        .transpose()?;
    let available_balance = match stmt.aggregate("AVAILBAL") {
        Some(avail) => Some(Balance::from_aggregate(avail)?),
        None => ledger_balance.clone(),
    };
    let transactions = match stmt.aggregate("BANKTRANLIST") {
        Some(list) => list
            .aggregates("STMTTRN")
            .map(Transaction::from_aggregate)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Account {
        currency: String::from(required(stmt, "CURDEF")?),
        routing: from.value("BANKID").map(String::from),
        number: String::from(required(from, "ACCTID")?),
        account_type: from
            .value("ACCTTYPE")
            .map(String::from)
            .or_else(|| (from.name() == "CCACCTFROM").then(|| String::from("CREDITCARD"))),
        ledger_balance,
        available_balance,
        transactions,
    })
}

/// An `ACCTINFO` entry from an account list response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountInfo {
    pub description: Option<String>,
    pub bank_id: Option<String>,
    pub account_id: String,
    pub account_type: Option<String>,
}

impl AccountInfo {
    pub fn from_aggregate(info: &Aggregate) -> Result<Self> {
        let from = [
            ["BANKACCTINFO", "BANKACCTFROM"],
            ["CCACCTINFO", "CCACCTFROM"],
            ["INVACCTINFO", "INVACCTFROM"],
        ]
        .iter()
        .find_map(|path| info.find(path))
        .ok_or_else(|| Error::MissingElement(String::from("ACCTINFO/BANKACCTINFO")))?;

        Ok(AccountInfo {
            description: optional_text(info, "DESC"),
            bank_id: from.value("BANKID").map(String::from),
            account_id: String::from(required(from, "ACCTID")?),
            account_type: from.value("ACCTTYPE").map(String::from),
        })
    }

    /// The account in the form a statement request needs, for deposit accounts.
    pub fn bank_account(&self) -> Option<BankAccount> {
        Some(BankAccount::new(
            self.bank_id.as_deref()?,
            self.account_id.as_str(),
            self.account_type.as_deref()?,
        ))
    }
}

/// Extracts the `ACCTINFO` entries of an account list response.
pub fn account_infos(ofx: &Ofx) -> Result<Vec<AccountInfo>> {
    ofx.root
        .find(&ACCOUNT_LIST)
        .ok_or_else(|| Error::MissingElement(ACCOUNT_LIST.join("/")))?
        .aggregates("ACCTINFO")
        .map(AccountInfo::from_aggregate)
        .collect()
}
