use rust_decimal::Decimal;
use test_case::test_case;

use ofx_banking::client::{check_signon, signon_status, statement, Severity};
use ofx_banking::{from_str, from_str_with, to_string, Error, ParseOptions};

const SAMPLE: &str = include_str!("data/v102/sample.ofx");
const ERROR: &str = include_str!("data/v102/error.ofx");
const ACCOUNTS: &str = include_str!("data/v102/accounts.ofx");

#[test]
fn sample__signon() {
    let ofx = from_str(SAMPLE).unwrap();

    let status = signon_status(&ofx).unwrap().unwrap();
    assert_eq!(status.code, "0");
    assert_eq!(status.severity, Severity::Info);
    let fi = ofx.root.find(&["SIGNONMSGSRSV1", "SONRS", "FI"]).unwrap();
    assert_eq!(fi.value("ORG"), Some("WFB"));
    assert_eq!(fi.value("FID"), Some("3000"));
}

#[test]
fn sample__statement() {
    let ofx = from_str(SAMPLE).unwrap();
    let account = statement(&ofx).unwrap();

    assert_eq!(account.currency, "USD");
    assert_eq!(account.routing.as_deref(), Some("000000000"));
    assert_eq!(account.transactions.len(), 11);

    let first = &account.transactions[0];
    assert_eq!(first.amount, Decimal::new(-4995, 2));
    assert_eq!(first.amount.to_string(), "-49.95");
    assert_eq!(first.kind, "DEBIT");

    let last = &account.transactions[10];
    assert_eq!(last.amount.to_string(), "25.00");
    assert_eq!(last.kind, "CREDIT");

    assert_eq!(
        account.available_balance.map(|b| b.amount.to_string()),
        Some(String::from("2317.36"))
    );
}

#[test]
fn sample__transactions_are_siblings_in_order() {
    let ofx = from_str(SAMPLE).unwrap();

    let list = ofx
        .root
        .find(&["BANKMSGSRSV1", "STMTTRNRS", "STMTRS", "BANKTRANLIST"])
        .unwrap();
    let amounts: Vec<_> = list
        .aggregates("STMTTRN")
        .map(|t| t.value("TRNAMT").unwrap())
        .collect();
    assert_eq!(amounts.len(), 11);
    assert_eq!(amounts.first(), Some(&"-49.95"));
    assert_eq!(amounts.last(), Some(&"25.00"));
}

#[test_case(SAMPLE   ; "statement"   )]
#[test_case(ERROR    ; "error"       )]
#[test_case(ACCOUNTS ; "account list")]
fn fixture__strict_parse_and_round_trip(input: &str) {
    let strict = ParseOptions::default().strict(true);
    let ofx = from_str_with(input, &strict).unwrap();

    assert_eq!(from_str(input), Ok(ofx.clone()));
    assert_eq!(to_string(&ofx), input);
}

#[test]
fn error__protocol_status_without_transactions() {
    let ofx = from_str(ERROR).unwrap();

    assert_eq!(
        check_signon(&ofx),
        Err(Error::ProtocolStatus {
            code: String::from("15500"),
            message: String::from("Something Has Failed!"),
        })
    );
    assert!(statement(&ofx).is_err());
}

#[test_case("OFXHEADER:100\r\n"  , "OFXHEADER" ; "no ofxheader")]
#[test_case("VERSION:102\r\n"    , "VERSION"   ; "no version"  )]
#[test_case("SECURITY:NONE\r\n"  , "SECURITY"  ; "no security" )]
fn missing_header_key__malformed_header(line: &str, key: &str) {
    let input = SAMPLE.replacen(line, "", 1);

    assert_eq!(
        from_str(&input),
        Err(Error::MalformedHeader(format!("missing mandatory key `{key}`")))
    );
}

#[test]
fn truncated_body__tolerated_unless_strict() {
    let cut = SAMPLE.find("</BANKTRANLIST>").unwrap();
    let input = &SAMPLE[..cut];

    let ofx = from_str(input).unwrap();
    assert_eq!(statement(&ofx).unwrap().transactions.len(), 11);
    assert!(matches!(
        from_str_with(input, &ParseOptions::default().strict(true)),
        Err(Error::UnbalancedStructure(_))
    ));
}
