use std::fmt;

use thiserror::Error;

/// Header keys in the order they are written.
pub const CANONICAL_KEYS: [&str; 9] = [
    "OFXHEADER",
    "DATA",
    "VERSION",
    "SECURITY",
    "ENCODING",
    "CHARSET",
    "COMPRESSION",
    "OLDFILEUID",
    "NEWFILEUID",
];

/// Header keys without which a document is rejected.
pub const MANDATORY_KEYS: [&str; 3] = ["OFXHEADER", "VERSION", "SECURITY"];

const KNOWN_VERSIONS: [u32; 4] = [102, 103, 151, 160];

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxContentType {
    OfxSgml,
    Unknown(String),
}

impl From<&str> for OfxContentType {
    fn from(value: &str) -> Self {
        match value {
            "OFXSGML" => OfxContentType::OfxSgml,
            other => OfxContentType::Unknown(String::from(other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxSecurity {
    None,
    Type1,
    Unknown(String),
}

impl From<&str> for OfxSecurity {
    fn from(value: &str) -> Self {
        match value {
            "NONE" => OfxSecurity::None,
            "TYPE1" => OfxSecurity::Type1,
            other => OfxSecurity::Unknown(String::from(other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxEncoding {
    UsAscii,
    Utf8,
    Unknown(String),
}

impl From<&str> for OfxEncoding {
    fn from(value: &str) -> Self {
        match value {
            "USASCII" => OfxEncoding::UsAscii,
            "UTF-8" => OfxEncoding::Utf8,
            other => OfxEncoding::Unknown(String::from(other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxCharset {
    Latin1,
    WindowsLatin1,
    None,
    Unknown(String),
}

impl From<&str> for OfxCharset {
    fn from(value: &str) -> Self {
        match value {
            "ISO-8859-1" => OfxCharset::Latin1,
            "1252" => OfxCharset::WindowsLatin1,
            "NONE" => OfxCharset::None,
            other => OfxCharset::Unknown(String::from(other)),
        }
    }
}

/// Header values that are tolerated but not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HeaderWarning {
    #[error("unrecognized OFXHEADER value `{0}`")]
    UnrecognizedOfxHeaderVersion(String),
    #[error("unrecognized VERSION value `{0}`")]
    UnrecognizedVersion(String),
    #[error("unrecognized DATA value `{0}`")]
    UnrecognizedContentType(String),
    #[error("unrecognized SECURITY value `{0}`")]
    UnrecognizedSecurityType(String),
    #[error("unrecognized ENCODING value `{0}`")]
    UnrecognizedEncoding(String),
    #[error("unrecognized CHARSET value `{0}`")]
    UnrecognizedCharset(String),
}

/// The header segment of an OFX document: an ordered set of `KEY:VALUE` pairs.
///
/// Keys are kept in insertion order; serialization reorders the well-known keys into
/// [`CANONICAL_KEYS`] order and appends the others afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    entries: Vec<(String, String)>,
}

impl Header {
    pub fn new() -> Self {
        Header::default()
    }

    /// The header sent with OFX 1.0.3 requests.
    pub fn request_v103(new_file_uid: impl Into<String>) -> Self {
        Header::new()
            .with("OFXHEADER", "100")
            .with("DATA", "OFXSGML")
            .with("VERSION", "103")
            .with("SECURITY", "NONE")
            .with("ENCODING", "USASCII")
            .with("CHARSET", "1252")
            .with("COMPRESSION", "NONE")
            .with("OLDFILEUID", "NONE")
            .with("NEWFILEUID", new_file_uid)
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries in serialization order: canonical keys first, then extensions as inserted.
    pub fn canonical_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let known = CANONICAL_KEYS
            .iter()
            .filter_map(move |key| self.get(key).map(|v| (*key, v)));
        let extensions = self.iter().filter(|(k, _)| !CANONICAL_KEYS.contains(k));
        known.chain(extensions)
    }

    /// The version of the header portion of the document. `100` is the only recognised value.
    pub fn header_version(&self) -> Option<u32> {
        self.get("OFXHEADER").and_then(|v| v.trim().parse().ok())
    }

    /// The version of the content portion of the document.
    pub fn version(&self) -> Option<u32> {
        self.get("VERSION").and_then(|v| v.trim().parse().ok())
    }

    pub fn data(&self) -> Option<OfxContentType> {
        self.get("DATA").map(OfxContentType::from)
    }

    /// The type of application-level security used for the `<OFX>` block.
    pub fn security(&self) -> Option<OfxSecurity> {
        self.get("SECURITY").map(OfxSecurity::from)
    }

    pub fn encoding(&self) -> Option<OfxEncoding> {
        self.get("ENCODING").map(OfxEncoding::from)
    }

    pub fn charset(&self) -> Option<OfxCharset> {
        self.get("CHARSET").map(OfxCharset::from)
    }

    /// Reports values which are tolerated but fall outside the values defined for OFX 1.x headers.
    pub fn warnings(&self) -> Vec<HeaderWarning> {
        let mut warnings = Vec::new();
        if let Some(v) = self.get("OFXHEADER") {
            if self.header_version() != Some(100) {
                warnings.push(HeaderWarning::UnrecognizedOfxHeaderVersion(String::from(v)));
            }
        }
        if let Some(v) = self.get("VERSION") {
            if !self.version().is_some_and(|n| KNOWN_VERSIONS.contains(&n)) {
                warnings.push(HeaderWarning::UnrecognizedVersion(String::from(v)));
            }
        }
        if let Some(OfxContentType::Unknown(v)) = self.data() {
            warnings.push(HeaderWarning::UnrecognizedContentType(v));
        }
        if let Some(OfxSecurity::Unknown(v)) = self.security() {
            warnings.push(HeaderWarning::UnrecognizedSecurityType(v));
        }
        if let Some(OfxEncoding::Unknown(v)) = self.encoding() {
            warnings.push(HeaderWarning::UnrecognizedEncoding(v));
        }
        if let Some(OfxCharset::Unknown(v)) = self.charset() {
            warnings.push(HeaderWarning::UnrecognizedCharset(v));
        }
        warnings
    }
}

impl<K, V> FromIterator<(K, V)> for Header
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut header = Header::new();
        for (k, v) in iter {
            header.insert(k, v);
        }
        header
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.canonical_iter() {
            write!(f, "{key}:{value}\r\n")?;
        }
        Ok(())
    }
}
