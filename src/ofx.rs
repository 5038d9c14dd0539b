use std::borrow::Cow;

use rust_decimal::Decimal;
use time::OffsetDateTime;

pub use self::header::*;
use crate::error::Result;
use crate::value::{self, Value, ValueKind};

pub mod header;

/// An element holding a terminal string value, written `<NAME>value` in OFX SGML.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Leaf {
    name: String,
    value: String,
}

impl Leaf {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Leaf {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value exactly as it appeared in the document, minus surrounding whitespace.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn typed(&self, kind: ValueKind) -> Result<Value<'_>> {
        value::normalize(&self.value, kind)
    }

    pub fn as_decimal(&self) -> Result<Decimal> {
        value::parse_decimal(&self.value)
    }

    pub fn as_date(&self) -> Result<OffsetDateTime> {
        value::parse_date(&self.value)
    }

    pub fn as_enum(&self) -> &str {
        &self.value
    }

    /// The value with entity references and CDATA sections decoded.
    pub fn as_text(&self) -> Cow<'_, str> {
        value::decode_text(&self.value)
    }
}

/// A child of an [`Aggregate`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Aggregate(Aggregate),
    Leaf(Leaf),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Aggregate(a) => a.name(),
            Node::Leaf(l) => l.name(),
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            Node::Aggregate(a) => Some(a),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Aggregate(_) => None,
        }
    }
}

impl From<Aggregate> for Node {
    fn from(value: Aggregate) -> Self {
        Node::Aggregate(value)
    }
}

impl From<Leaf> for Node {
    fn from(value: Leaf) -> Self {
        Node::Leaf(value)
    }
}

/// A container element holding nested elements in document order.
///
/// Repeated children (e.g. several `STMTTRN` under one `BANKTRANLIST`) are kept as siblings;
/// [`Aggregate::get_all`] yields them as a sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Aggregate {
    name: String,
    children: Vec<Node>,
}

impl Aggregate {
    pub fn new(name: impl Into<String>) -> Self {
        Aggregate {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn push_leaf(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(Leaf::new(name, value));
    }

    pub fn with_child(mut self, node: impl Into<Node>) -> Self {
        self.push(node);
        self
    }

    pub fn with_leaf(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_leaf(name, value);
        self
    }

    /// The first child named `name`.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name() == name)
    }

    /// Every child named `name`, in document order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name() == name)
    }

    pub fn aggregate(&self, name: &str) -> Option<&Aggregate> {
        self.children
            .iter()
            .filter_map(Node::as_aggregate)
            .find(|a| a.name() == name)
    }

    pub fn aggregates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Aggregate> + 'a {
        self.get_all(name).filter_map(Node::as_aggregate)
    }

    pub fn leaf(&self, name: &str) -> Option<&Leaf> {
        self.children
            .iter()
            .filter_map(Node::as_leaf)
            .find(|l| l.name() == name)
    }

    /// Shorthand for the raw value of the leaf named `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.leaf(name).map(Leaf::value)
    }

    /// Descends through the first aggregate matching each name in turn.
    pub fn find(&self, path: &[&str]) -> Option<&Aggregate> {
        path.iter()
            .try_fold(self, |current, name| current.aggregate(name))
    }
}

/// An OFX document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ofx {
    /// The header section of the document.
    pub header: Header,
    /// The root element of the document, normally `OFX`.
    pub root: Aggregate,
}

impl Ofx {
    pub fn new(header: Header, root: Aggregate) -> Self {
        Ofx { header, root }
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    fn statement() -> Aggregate {
        Aggregate::new("STMTRS")
            .with_leaf("CURDEF", "USD")
            .with_child(
                Aggregate::new("BANKTRANLIST")
                    .with_leaf("DTSTART", "20110101")
                    .with_child(Aggregate::new("STMTTRN").with_leaf("FITID", "1"))
                    .with_child(Aggregate::new("STMTTRN").with_leaf("FITID", "2"))
                    .with_child(Aggregate::new("STMTTRN").with_leaf("FITID", "3")),
            )
    }

    #[test]
    fn aggregate__get_all__keeps_document_order() {
        let stmt = statement();
        let list = stmt.aggregate("BANKTRANLIST").unwrap();

        let ids: Vec<_> = list
            .aggregates("STMTTRN")
            .map(|t| t.value("FITID").unwrap())
            .collect();

        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn aggregate__find__descends_path() {
        let root = Aggregate::new("OFX").with_child(statement());

        assert_eq!(
            root.find(&["STMTRS", "BANKTRANLIST"]).map(Aggregate::name),
            Some("BANKTRANLIST")
        );
        assert_eq!(root.find(&["STMTRS", "CURDEF"]), None);
        assert_eq!(root.find(&[]), Some(&root));
    }

    #[test]
    fn aggregate__leaf_and_aggregate__distinguish_kinds() {
        let stmt = statement();

        assert_eq!(stmt.value("CURDEF"), Some("USD"));
        assert!(stmt.aggregate("CURDEF").is_none());
        assert!(stmt.leaf("BANKTRANLIST").is_none());
    }

    #[test]
    fn leaf__typed_accessors__do_not_mutate_value() {
        let leaf = Leaf::new("TRNAMT", "-49.95");

        assert_eq!(leaf.as_decimal().unwrap().to_string(), "-49.95");
        assert_eq!(leaf.as_decimal().unwrap().to_string(), "-49.95");
        assert_eq!(leaf.value(), "-49.95");
    }

    #[test]
    fn leaf__as_text__decodes_entities() {
        let leaf = Leaf::new("NAME", "AT&amp;T");

        assert_eq!(leaf.as_text(), "AT&T");
        assert_eq!(leaf.value(), "AT&amp;T");
    }
}
