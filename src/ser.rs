//! Serializer for OFX 1.x SGML documents.

use std::fmt::{self, Write};

use crate::ofx::{Aggregate, Leaf, Node, Ofx};

const LINE_END: &str = "\r\n";

/// Writes `ofx` as an OFX 1.x SGML document.
///
/// The header comes first in canonical key order, followed by a blank line and the body with one
/// element per line. Leaf values are written verbatim, without end tags, except that an empty
/// value is closed on the same line (`<MEMO></MEMO>`) so that it reads back as a leaf.
pub fn to_writer<W: Write>(writer: &mut W, ofx: &Ofx) -> fmt::Result {
    for (key, value) in ofx.header.canonical_iter() {
        write!(writer, "{key}:{value}{LINE_END}")?;
    }
    writer.write_str(LINE_END)?;
    write_aggregate(writer, &ofx.root)
}

fn write_aggregate<W: Write>(writer: &mut W, aggregate: &Aggregate) -> fmt::Result {
    write!(writer, "<{}>{LINE_END}", aggregate.name())?;
    for child in aggregate.children() {
        match child {
            Node::Aggregate(inner) => write_aggregate(writer, inner)?,
            Node::Leaf(leaf) => write_leaf(writer, leaf)?,
        }
    }
    write!(writer, "</{}>{LINE_END}", aggregate.name())
}

fn write_leaf<W: Write>(writer: &mut W, leaf: &Leaf) -> fmt::Result {
    match leaf.value() {
        "" => write!(writer, "<{0}></{0}>{LINE_END}", leaf.name()),
        value => write!(writer, "<{}>{value}{LINE_END}", leaf.name()),
    }
}

pub fn to_string(ofx: &Ofx) -> String {
    ofx.to_string()
}

impl fmt::Display for Ofx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        to_writer(f, self)
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ofx::Header;
    use crate::parse::{from_str, from_str_with, ParseOptions};

    const HEADER: &str = "OFXHEADER:100\r\n\
                          DATA:OFXSGML\r\n\
                          VERSION:102\r\n\
                          SECURITY:NONE\r\n\
                          ENCODING:USASCII\r\n\
                          CHARSET:1252\r\n\
                          COMPRESSION:NONE\r\n\
                          OLDFILEUID:NONE\r\n\
                          NEWFILEUID:NONE\r\n";

    fn statement() -> Ofx {
        let header = from_str(&format!("{HEADER}\r\n<OFX></OFX>")).unwrap().header;
        let transactions = (1..=3).fold(Aggregate::new("BANKTRANLIST"), |list, i| {
            list.with_child(
                Aggregate::new("STMTTRN")
                    .with_leaf("TRNTYPE", "DEBIT")
                    .with_leaf("TRNAMT", format!("-{i}.50"))
                    .with_leaf("FITID", i.to_string())
                    .with_leaf("NAME", "AT&amp;T"),
            )
        });
        Ofx::new(
            header,
            Aggregate::new("OFX").with_child(
                Aggregate::new("BANKMSGSRSV1").with_child(
                    Aggregate::new("STMTTRNRS").with_child(
                        Aggregate::new("STMTRS")
                            .with_leaf("CURDEF", "USD")
                            .with_child(transactions),
                    ),
                ),
            ),
        )
    }

    #[test]
    fn to_string__layout() {
        let ofx = Ofx::new(
            Header::new().with("VERSION", "102").with("OFXHEADER", "100"),
            Aggregate::new("OFX").with_child(
                Aggregate::new("STATUS")
                    .with_leaf("CODE", "0")
                    .with_leaf("SEVERITY", "INFO"),
            ),
        );

        assert_eq!(
            to_string(&ofx),
            "OFXHEADER:100\r\nVERSION:102\r\n\r\n\
             <OFX>\r\n<STATUS>\r\n<CODE>0\r\n<SEVERITY>INFO\r\n</STATUS>\r\n</OFX>\r\n"
        );
    }

    #[test]
    fn to_string__canonical_header__byte_identical() {
        let ofx = statement();

        assert!(to_string(&ofx).starts_with(&format!("{HEADER}\r\n<OFX>\r\n")));
    }

    #[test]
    fn to_string__parse__structurally_equal() {
        let ofx = statement();

        assert_eq!(from_str(&to_string(&ofx)), Ok(ofx.clone()));
        assert_eq!(
            from_str_with(&to_string(&ofx), &ParseOptions::default().strict(true)),
            Ok(ofx)
        );
    }

    #[test]
    fn to_string__registered_empty_leaf__round_trips() {
        let ofx = Ofx::new(
            Header::request_v103("NONE"),
            Aggregate::new("OFX").with_child(
                Aggregate::new("STMTTRN")
                    .with_leaf("MEMO", "")
                    .with_leaf("NAME", "Coffee"),
            ),
        );

        assert_eq!(from_str(&to_string(&ofx)), Ok(ofx));
    }

    #[test]
    fn to_string__unregistered_empty_leaf__round_trips() {
        let ofx = Ofx::new(
            Header::request_v103("NONE"),
            Aggregate::new("OFX").with_child(
                Aggregate::new("STMTTRN")
                    .with_leaf("XNOTE", "")
                    .with_leaf("NAME", "Coffee")
                    .with_child(Aggregate::new("XGROUP")),
            ),
        );

        let written = to_string(&ofx);

        assert!(written.contains("<XNOTE></XNOTE>\r\n<NAME>Coffee\r\n<XGROUP>\r\n</XGROUP>\r\n"));
        assert_eq!(from_str(&written), Ok(ofx.clone()));
        assert_eq!(
            from_str_with(&written, &ParseOptions::default().strict(true)),
            Ok(ofx)
        );
    }
}
