use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::complete::{line_ending, multispace0, not_line_ending},
    combinator::{eof, recognize},
    error::{Error as BriefError, ParseError},
    multi::{many0, many0_count},
    sequence::{preceded, terminated, tuple},
    IResult,
};
use tracing::warn;

use crate::error::{Error, Result};
use crate::ofx::header::{Header, MANDATORY_KEYS};

/// Parses a header element name.
fn elem_name<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    recognize(tuple((
        is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
        many0_count(is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789")),
    )))(input)
}

/// Parses a header element value.
fn elem_value<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    not_line_ending(input)
}

/// Parses a `NAME:VALUE` line.
fn any_elem<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str), E>
where
    E: ParseError<&'a str>,
{
    tuple((
        terminated(elem_name, tag(":")),
        terminated(elem_value, alt((line_ending, eof))),
    ))(input)
}

/// Parses the run of header lines at the start of a document, skipping leading whitespace.
pub(crate) fn header_elems<'a, E>(input: &'a str) -> IResult<&'a str, Vec<(&'a str, &'a str)>, E>
where
    E: ParseError<&'a str>,
{
    preceded(multispace0, many0(any_elem))(input)
}

/// Parses the header of an OFX document.
///
/// Returns the header and the byte offset at which the body starts. The header ends at a blank
/// line or at a line starting with `<`.
pub(crate) fn ofx_header(input: &str) -> Result<(Header, usize)> {
    let (rest, elems) = header_elems::<BriefError<&str>>(input)
        .map_err(|e| Error::MalformedHeader(e.to_string()))?;

    let terminated = line_ending::<_, BriefError<&str>>(rest).is_ok();
    let next = rest.trim_start();
    if !terminated && !next.is_empty() && !next.starts_with('<') {
        let line = next.lines().next().unwrap_or_default();
        return Err(Error::MalformedHeader(format!("unexpected line `{line}`")));
    }
    if elems.is_empty() && next.starts_with("<?xml") {
        return Err(Error::MalformedHeader(String::from(
            "OFX 2.x XML documents are not supported",
        )));
    }

    let mut header = Header::new();
    for (key, value) in elems {
        if header.contains_key(key) {
            return Err(Error::MalformedHeader(format!("duplicate key `{key}`")));
        }
        header.insert(key, value);
    }
    if let Some(key) = MANDATORY_KEYS.iter().find(|k| !header.contains_key(k)) {
        return Err(Error::MalformedHeader(format!("missing mandatory key `{key}`")));
    }
    for warning in header.warnings() {
        warn!(%warning, "tolerating OFX header value");
    }

    Ok((header, input.len() - rest.len()))
}
