//! Parsers for OFX documents.

use std::borrow::Cow;
use std::collections::BTreeSet;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

use crate::error::Result;
use crate::ofx::{Ofx, OfxCharset, OfxEncoding};
use self::sgml::{header::ofx_header, token::Tokenizer, tree};

pub mod sgml;

/// Elements that legitimately repeat under one parent.
const REPEATABLE: [&str; 20] = [
    "STMTTRN",
    "STMTTRNRS",
    "CCSTMTTRNRS",
    "INVSTMTTRNRS",
    "ACCTINFO",
    "BAL",
    "INVBANKTRAN",
    "BUYSTOCK",
    "SELLSTOCK",
    "BUYMF",
    "SELLMF",
    "INCOME",
    "POSSTOCK",
    "POSMF",
    "POSDEBT",
    "POSOPT",
    "POSOTHER",
    "STOCKINFO",
    "MFINFO",
    "OTHERINFO",
];

/// Elements that only ever hold a value, even when that value is empty.
const LEAF: [&str; 34] = [
    "ACCTID",
    "ACCTTYPE",
    "APPID",
    "APPVER",
    "BALAMT",
    "BANKID",
    "CHECKNUM",
    "CLIENTUID",
    "CLTCOOKIE",
    "CODE",
    "CURDEF",
    "DESC",
    "DTACCTUP",
    "DTASOF",
    "DTCLIENT",
    "DTEND",
    "DTPOSTED",
    "DTSERVER",
    "DTSTART",
    "DTUSER",
    "FID",
    "FITID",
    "LANGUAGE",
    "MEMO",
    "MESSAGE",
    "NAME",
    "ORG",
    "PAYEEID",
    "REFNUM",
    "SEVERITY",
    "SIC",
    "TRNAMT",
    "TRNTYPE",
    "TRNUID",
];

/// Per-call parser configuration.
///
/// The defaults know the common OFX banking and investment elements; callers dealing with
/// institution-specific extensions can register more.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    /// Reject documents whose aggregates are not explicitly closed, whose end tags do not match,
    /// or which repeat elements not known to be repeatable.
    pub strict: bool,
    repeatable: BTreeSet<String>,
    leaf: BTreeSet<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: false,
            repeatable: REPEATABLE.iter().map(|s| String::from(*s)).collect(),
            leaf: LEAF.iter().map(|s| String::from(*s)).collect(),
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        ParseOptions::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Registers an element that may appear several times under one parent.
    pub fn repeatable(mut self, name: impl Into<String>) -> Self {
        self.repeatable.insert(name.into());
        self
    }

    /// Registers an element that never contains other elements.
    pub fn leaf(mut self, name: impl Into<String>) -> Self {
        self.leaf.insert(name.into());
        self
    }

    pub fn is_repeatable(&self, name: &str) -> bool {
        self.repeatable.contains(name)
    }

    pub fn is_leaf(&self, name: &str) -> bool {
        self.leaf.contains(name)
    }
}

/// Parses an OFX 1.x SGML document with the default options.
pub fn from_str(s: &str) -> Result<Ofx> {
    from_str_with(s, &ParseOptions::default())
}

/// Parses an OFX 1.x SGML document.
pub fn from_str_with(s: &str, options: &ParseOptions) -> Result<Ofx> {
    let (header, offset) = ofx_header(s)?;
    let root = tree::build(Tokenizer::starting_at(s, offset), options)?;
    debug!(
        root = root.name(),
        elements = root.children().len(),
        "parsed OFX document"
    );
    Ok(Ofx { header, root })
}

/// Parses an OFX document from raw bytes, see [`decode`].
pub fn from_bytes(bytes: &[u8]) -> Result<Ofx> {
    from_str(&decode(bytes))
}

/// Decodes document bytes to text.
///
/// Valid UTF-8 is borrowed as is. Anything else is decoded with the charset the SGML header
/// declares, which for OFX 1.x is almost always `1252`; an unrecognised or missing `CHARSET`
/// falls back to Windows-1252.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(s);
    }
    let encoding = declared_encoding(bytes);
    debug!(encoding = encoding.name(), "response is not valid UTF-8");
    encoding.decode_without_bom_handling(bytes).0
}

/// Reads `ENCODING` and `CHARSET` from the header lines ahead of the body.
fn declared_encoding(bytes: &[u8]) -> &'static Encoding {
    let end = bytes.iter().position(|&b| b == b'<').unwrap_or(bytes.len());
    let (header, _) = WINDOWS_1252.decode_without_bom_handling(&bytes[..end]);

    let mut encoding = None;
    let mut charset = None;
    for (key, value) in header.lines().filter_map(|line| line.split_once(':')) {
        match key.trim() {
            "ENCODING" => encoding = Some(OfxEncoding::from(value.trim())),
            "CHARSET" => charset = Some(OfxCharset::from(value.trim())),
            _ => {}
        }
    }

    match (encoding, charset) {
        (Some(OfxEncoding::Utf8), _) => UTF_8,
        (_, Some(OfxCharset::Unknown(label))) => {
            Encoding::for_label(label.as_bytes()).unwrap_or(WINDOWS_1252)
        }
        _ => WINDOWS_1252,
    }
}
