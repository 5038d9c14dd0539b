//! Parsers for OFX SGML elements.

use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{is_a, is_not, tag, take_until},
    combinator::{recognize, value},
    error::ParseError,
    multi::{many0, many0_count},
    sequence::{delimited, tuple},
    IResult,
};

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Parses the name of a tag.
///
/// Besides letters and digits, `.` and `_` are accepted after the first character so that vendor
/// extensions such as `<INTU.BID>` are recognised.
pub(crate) fn tag_name<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    recognize(tuple((
        is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
        many0_count(is_a("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._")),
    )))(input)
}

/// Parses the start tag of an element.
pub(crate) fn any_start_tag<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag("<"), tag_name, tag(">"))(input)
}

/// Parses the end tag of an element.
pub(crate) fn any_end_tag<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag("</"), tag_name, tag(">"))(input)
}

/// Parses a CDATA section, yielding its contents.
fn cdata<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag(CDATA_START), take_until(CDATA_END), tag(CDATA_END))(input)
}

/// Parses the undecoded value of an element: everything up to the next tag, with CDATA sections
/// passed over whole.
pub(crate) fn raw_value<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    recognize(many0_count(alt((is_not("<"), recognize(cdata)))))(input)
}

/// Parses the value of an element, decoding entity references and CDATA sections.
pub(crate) fn decoded_value<'a, E>(input: &'a str) -> IResult<&'a str, Cow<'a, str>, E>
where
    E: ParseError<&'a str>,
{
    let (input, chunks) = many0(alt((
        is_not("<&"),
        value("<", tag("&lt;")),
        value(">", tag("&gt;")),
        value("&", tag("&amp;")),
        value(" ", tag("&nbsp;")),
        cdata,
        tag("&"),
    )))(input)?;

    Ok((
        input,
        match chunks.len() {
            0 => Cow::Borrowed(""),
            1 => Cow::Borrowed(chunks[0]),
            _ => Cow::Owned(chunks.concat()),
        },
    ))
}
