use hookrule::{
    arguments_to_json_string, parse_argument, parse_arguments, ArgumentError, ArgumentReference,
    RuleError, Source, SyntaxError, SyntaxErrorKind,
};
use rstest::rstest;

fn syntax_error(input: &str) -> SyntaxError {
    match parse_arguments(input).unwrap_err() {
        RuleError::Syntax(err) => err,
        other => panic!("expected syntax error, got: {other}"),
    }
}

#[test]
fn parses_references_in_order() {
    let args = parse_arguments(r#""header.X-Signature", 'payload.head_commit.id',"string.-v""#)
        .unwrap();
    assert_eq!(
        args,
        vec![
            ArgumentReference::new(Source::Header, "X-Signature"),
            ArgumentReference::new(Source::Payload, "head_commit.id"),
            ArgumentReference::new(Source::String, "-v"),
        ]
    );
}

#[test]
fn single_reference_needs_no_comma() {
    let args = parse_arguments("'query.q'").unwrap();
    assert_eq!(args, vec![ArgumentReference::new(Source::Query, "q")]);
}

#[rstest]
#[case("", SyntaxErrorKind::ExpectedArgument, "<EOF>", 0)]
#[case(r#""query.a","#, SyntaxErrorKind::ExpectedArgument, "<EOF>", 8)]
#[case(r#""query.a" "query.b""#, SyntaxErrorKind::ExpectedComma, "query.b", 7)]
#[case(r#", "query.a""#, SyntaxErrorKind::UnexpectedToken, ",", 0)]
#[case(r#""query.a",, "query.b""#, SyntaxErrorKind::UnexpectedToken, ",", 8)]
#[case(r#""query.a" == "b""#, SyntaxErrorKind::UnexpectedToken, "==", 7)]
#[case(r#"("query.a")"#, SyntaxErrorKind::UnexpectedToken, "(", 0)]
#[case(r#""nope""#, SyntaxErrorKind::Argument(ArgumentError::InvalidFormat), "nope", 0)]
fn reports_list_errors(
    #[case] input: &str,
    #[case] kind: SyntaxErrorKind,
    #[case] token: &str,
    #[case] position: usize,
) {
    let err = syntax_error(input);
    assert_eq!(err.kind, kind);
    assert_eq!(err.token, token);
    assert_eq!(err.position, position);
}

#[test]
fn argument_errors_render_with_detail_line() {
    let err = syntax_error(r#""query.a", "nope""#);
    assert_eq!(
        err.to_string(),
        "syntax error (token: nope, pos: 8)\n\targument literal must be in format: source.name"
    );
}

#[test]
fn standalone_reference_parser_matches_list_parser() {
    assert_eq!(
        parse_argument("header.X").unwrap(),
        ArgumentReference::new(Source::Header, "X")
    );
    assert_eq!(parse_argument("x.y"), Err(ArgumentError::InvalidSource("x".to_string())));
    assert_eq!(parse_argument("string."), Err(ArgumentError::InvalidName));
    assert_eq!(parse_argument(""), Err(ArgumentError::InvalidFormat));
}

#[test]
fn serializes_like_webhook_arguments() {
    let args = parse_arguments(r#""payload.ref", "header.X""#).unwrap();
    let json = arguments_to_json_string(&args, false).unwrap();
    assert_eq!(
        json,
        r#"[{"source":"payload","name":"ref"},{"source":"header","name":"X"}]"#
    );
}
