//! Conversions between OFX leaf strings and typed values.
//!
//! Leaves are stored as they appear in the document; these functions are applied on demand by the
//! accessors on [`Leaf`](crate::ofx::Leaf) and when assembling requests.

use std::borrow::Cow;
use std::str::FromStr;

use nom::{
    bytes::complete::{is_not, take_while_m_n},
    character::complete::{char, digit0, digit1, one_of, space0},
    combinator::{all_consuming, map, opt},
    error::{Error as BriefError, ParseError},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{Error, Result};
use crate::parse::sgml::element::decoded_value;

/// How a leaf value should be interpreted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueKind {
    Decimal,
    Date,
    Enum,
    Text,
}

/// A normalized leaf value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value<'a> {
    Decimal(Decimal),
    Date(OffsetDateTime),
    Enum(&'a str),
    Text(Cow<'a, str>),
}

pub fn normalize(raw: &str, kind: ValueKind) -> Result<Value<'_>> {
    Ok(match kind {
        ValueKind::Decimal => Value::Decimal(parse_decimal(raw)?),
        ValueKind::Date => Value::Date(parse_date(raw)?),
        ValueKind::Enum => Value::Enum(raw),
        ValueKind::Text => Value::Text(decode_text(raw)),
    })
}

/// Parses a decimal literal: an optional sign, digits, and an optional fraction introduced by `.`
/// or `,`.
fn decimal_literal<'a, E>(input: &'a str) -> IResult<&'a str, (Option<char>, &'a str, Option<&'a str>), E>
where
    E: ParseError<&'a str>,
{
    tuple((
        opt(one_of("+-")),
        digit0,
        opt(preceded(one_of(".,"), digit0)),
    ))(input)
}

/// Parses an OFX amount, keeping its exact digits and scale.
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    let invalid = || Error::InvalidDecimal(String::from(raw));

    let (_, (sign, int, fraction)) =
        all_consuming(decimal_literal::<BriefError<&str>>)(raw.trim()).map_err(|_| invalid())?;
    let fraction = fraction.unwrap_or_default();
    if int.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    let mut canonical = String::with_capacity(raw.len() + 1);
    if sign == Some('-') {
        canonical.push('-');
    }
    canonical.push_str(if int.is_empty() { "0" } else { int });
    if !fraction.is_empty() {
        canonical.push('.');
        canonical.push_str(fraction);
    }
    Decimal::from_str(&canonical).map_err(|_| invalid())
}

/// Folds a run of ASCII digits into a number. Callers bound the length.
fn to_number(digits: &str) -> u32 {
    digits
        .bytes()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

fn fixed<'a, E>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32, E>
where
    E: ParseError<&'a str>,
{
    map(take_while_m_n(n, n, |c: char| c.is_ascii_digit()), to_number)
}

type RawOffset<'a> = (Option<char>, &'a str, Option<&'a str>);

struct DateParts<'a> {
    date: (u32, u32, u32),
    time: Option<(u32, u32, u32, Option<&'a str>)>,
    offset: Option<RawOffset<'a>>,
}

/// Parses a `[±H[.MM][:TZ]]` time zone suffix. Both parts are optional inside the brackets.
fn time_zone<'a, E>(input: &'a str) -> IResult<&'a str, Option<RawOffset<'a>>, E>
where
    E: ParseError<&'a str>,
{
    delimited(
        char('['),
        terminated(
            opt(tuple((
                opt(one_of("+-")),
                digit1,
                opt(preceded(char('.'), digit1)),
            ))),
            opt(preceded(char(':'), is_not("]"))),
        ),
        char(']'),
    )(input)
}

fn date_parts<'a, E>(input: &'a str) -> IResult<&'a str, DateParts<'a>, E>
where
    E: ParseError<&'a str>,
{
    map(
        all_consuming(tuple((
            tuple((fixed(4), fixed(2), fixed(2))),
            opt(tuple((
                fixed(2),
                fixed(2),
                fixed(2),
                opt(preceded(char('.'), digit1)),
            ))),
            space0,
            opt(time_zone),
        ))),
        |(date, time, _, offset)| DateParts {
            date,
            time,
            offset: offset.flatten(),
        },
    )(input)
}

/// Parses an OFX date or datetime, `YYYYMMDD[HHMMSS[.XXX]][ ][[±H[.MM]][:TZ]]`.
///
/// A missing time means midnight and a missing offset means UTC. A one-digit fraction of the
/// offset hour is read as tenths (`-3.5` is three and a half hours), two digits as minutes.
pub fn parse_date(raw: &str) -> Result<OffsetDateTime> {
    let invalid = || Error::InvalidDate(String::from(raw));

    let (_, parts) = date_parts::<BriefError<&str>>(raw.trim()).map_err(|_| invalid())?;

    let (year, month, day) = parts.date;
    let month = Month::try_from(month as u8).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(year as i32, month, day as u8).map_err(|_| invalid())?;

    let time = match parts.time {
        None => Time::MIDNIGHT,
        Some((hour, minute, second, fraction)) => {
            let nanos = match fraction {
                None => 0,
                Some(f) if f.len() <= 9 => to_number(f) * 10u32.pow(9 - f.len() as u32),
                Some(_) => return Err(invalid()),
            };
            Time::from_hms_nano(hour as u8, minute as u8, second as u8, nanos)
                .map_err(|_| invalid())?
        }
    };

    let offset = match parts.offset {
        None => UtcOffset::UTC,
        Some((sign, hours, fraction)) => {
            if hours.len() > 2 {
                return Err(invalid());
            }
            let hours = to_number(hours) as i8;
            let minutes = match fraction {
                None => 0,
                Some(f) if f.len() == 1 => to_number(f) as i8 * 6,
                Some(f) if f.len() == 2 => to_number(f) as i8,
                Some(_) => return Err(invalid()),
            };
            let (hours, minutes) = match sign {
                Some('-') => (-hours, -minutes),
                _ => (hours, minutes),
            };
            UtcOffset::from_hms(hours, minutes, 0).map_err(|_| invalid())?
        }
    };

    Ok(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// Decodes entity references and CDATA sections.
pub fn decode_text(raw: &str) -> Cow<'_, str> {
    match decoded_value::<BriefError<&str>>(raw) {
        Ok(("", decoded)) => decoded,
        Ok((rest, decoded)) => Cow::Owned(decoded.into_owned() + rest),
        Err(_) => Cow::Borrowed(raw),
    }
}

pub fn format_decimal(value: Decimal) -> String {
    value.to_string()
}

/// Formats a date as `YYYYMMDD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Formats a datetime as `YYYYMMDDHHMMSS.XXX[±H[.MM]]`.
pub fn format_datetime(value: OffsetDateTime) -> String {
    let offset = value.offset();
    let sign = if offset.is_negative() { '-' } else { '+' };
    let hours = offset.whole_hours().unsigned_abs();
    let minutes = offset.minutes_past_hour().unsigned_abs();
    let zone = if minutes == 0 {
        format!("[{sign}{hours}]")
    } else {
        format!("[{sign}{hours}.{minutes:02}]")
    };

    format!(
        "{}{:02}{:02}{:02}.{:03}{zone}",
        format_date(value.date()),
        value.hour(),
        value.minute(),
        value.second(),
        value.millisecond(),
    )
}

/// Escapes the characters that would otherwise be read as markup.
pub fn encode_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&']) {
        return Cow::Borrowed(text);
    }
    let mut encoded = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '&' => encoded.push_str("&amp;"),
            c => encoded.push(c),
        }
    }
    Cow::Owned(encoded)
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use test_case::test_case;
    use time::macros::{date, datetime};
    use time::OffsetDateTime;

    use super::*;

    #[test_case("-49.95" , "-49.95" ; "negative"           )]
    #[test_case("25.00"  , "25.00"  ; "trailing zeros kept")]
    #[test_case("+3"     , "3"      ; "explicit plus"      )]
    #[test_case(" 12.5\r\n", "12.5" ; "surrounding space"  )]
    #[test_case("-.5"    , "-0.5"   ; "no integer part"    )]
    #[test_case("7."     , "7"      ; "no fraction digits" )]
    #[test_case("1234,56", "1234.56"; "comma separator"    )]
    fn parse_decimal__ok(input: &str, expected: &str) {
        assert_eq!(parse_decimal(input).map(|d| d.to_string()), Ok(String::from(expected)));
    }

    #[test_case(""        ; "empty"          )]
    #[test_case("-"       ; "sign only"      )]
    #[test_case("."       ; "separator only" )]
    #[test_case("1.2.3"   ; "two separators" )]
    #[test_case("12a"     ; "trailing letter")]
    #[test_case("1 000"   ; "inner space"    )]
    #[test_case("--1"     ; "double sign"    )]
    fn parse_decimal__err(input: &str) {
        assert_eq!(parse_decimal(input), Err(Error::InvalidDecimal(String::from(input))));
    }

    #[test]
    fn parse_decimal__exact_sum() {
        let sum = parse_decimal("0.10").unwrap() + parse_decimal("0.20").unwrap();

        assert_eq!(sum, parse_decimal("0.30").unwrap());
    }

    #[test_case("20110125"                 , datetime!(2011-01-25 00:00 UTC)              ; "date only"        )]
    #[test_case("20110125143015"           , datetime!(2011-01-25 14:30:15 UTC)           ; "datetime"         )]
    #[test_case("20110125143015.123"       , datetime!(2011-01-25 14:30:15.123 UTC)       ; "milliseconds"     )]
    #[test_case("20110125143015.123[-5:EST]", datetime!(2011-01-25 14:30:15.123 -5)      ; "offset and zone"  )]
    #[test_case("20110125143015 [+5.30:IST]", datetime!(2011-01-25 14:30:15 +5:30)        ; "offset minutes"   )]
    #[test_case("20110125120000[-3.5:NST]" , datetime!(2011-01-25 12:00 -3:30)            ; "offset tenths"    )]
    #[test_case("20110125120000[0:GMT]"    , datetime!(2011-01-25 12:00 UTC)              ; "zero offset"      )]
    #[test_case("20110125[:EST]"           , datetime!(2011-01-25 00:00 UTC)              ; "zone name only"   )]
    #[test_case("20110125120000[+10]"      , datetime!(2011-01-25 12:00 +10)              ; "no zone name"     )]
    fn parse_date__ok(input: &str, expected: OffsetDateTime) {
        assert_eq!(parse_date(input), Ok(expected));
    }

    #[test_case(""                     ; "empty"           )]
    #[test_case("2011012"              ; "short date"      )]
    #[test_case("20111325"             ; "month 13"        )]
    #[test_case("20110230"             ; "february 30"     )]
    #[test_case("2011012514"           ; "partial time"    )]
    #[test_case("20110125250000"       ; "hour 25"         )]
    #[test_case("20110125120000[-5"    ; "unclosed zone"   )]
    #[test_case("20110125120000[-123]" ; "long offset"     )]
    #[test_case("20110125120000[+1.234]"; "long offset fraction")]
    #[test_case("yesterday"            ; "text"            )]
    fn parse_date__err(input: &str) {
        assert_eq!(parse_date(input), Err(Error::InvalidDate(String::from(input))));
    }

    #[test_case("AT&amp;T"               , "AT&T"        ; "entity"        )]
    #[test_case("&lt;b&gt;&nbsp;x"       , "<b> x"       ; "several"       )]
    #[test_case("<![CDATA[a&amp;b]]>"    , "a&amp;b"     ; "cdata verbatim")]
    #[test_case("plain"                  , "plain"       ; "plain"         )]
    #[test_case("a<![CDATA[b"            , "a<![CDATA[b" ; "broken cdata"  )]
    fn decode_text(input: &str, expected: &str) {
        assert_eq!(super::decode_text(input), expected);
    }

    #[test]
    fn normalize__by_kind() {
        assert_eq!(
            normalize("-49.95", ValueKind::Decimal),
            Ok(Value::Decimal(Decimal::new(-4995, 2)))
        );
        assert_eq!(
            normalize("20110125", ValueKind::Date),
            Ok(Value::Date(datetime!(2011-01-25 00:00 UTC)))
        );
        assert_eq!(normalize("debit", ValueKind::Enum), Ok(Value::Enum("debit")));
        assert_eq!(
            normalize("A&amp;B", ValueKind::Text),
            Ok(Value::Text(Cow::Borrowed("A&B")))
        );
        assert!(normalize("x", ValueKind::Decimal).is_err());
    }

    #[test]
    fn format_date__pads_fields() {
        assert_eq!(format_date(date!(2012 - 12 - 01)), "20121201");
    }

    #[test_case(datetime!(2011-01-25 14:30:15.123 UTC)  , "20110125143015.123[+0]"    ; "utc"            )]
    #[test_case(datetime!(2011-01-25 09:05:01 -5)       , "20110125090501.000[-5]"    ; "negative offset")]
    #[test_case(datetime!(2011-01-25 09:05:01 +5:30)    , "20110125090501.000[+5.30]" ; "offset minutes" )]
    fn format_datetime(value: OffsetDateTime, expected: &str) {
        let formatted = super::format_datetime(value);

        assert_eq!(formatted, expected);
        assert_eq!(parse_date(&formatted), Ok(value));
    }

    #[test]
    fn format_decimal__keeps_scale() {
        assert_eq!(format_decimal(parse_decimal("25.00").unwrap()), "25.00");
    }

    #[test_case("AT&T"  , "AT&amp;T"        ; "ampersand")]
    #[test_case("<b>"   , "&lt;b&gt;"       ; "brackets" )]
    #[test_case("plain" , "plain"           ; "plain"    )]
    fn encode_text(input: &str, expected: &str) {
        let encoded = super::encode_text(input);

        assert_eq!(encoded, expected);
        assert_eq!(super::decode_text(&encoded), input);
    }
}
