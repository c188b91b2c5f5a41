use crate::error::WritError;
use crate::parser::{parse, parse_bounded, SyntaxChunk, SyntaxRecord, ROOT_NAME};

fn text(s: &str) -> SyntaxChunk {
    SyntaxChunk::Text(s.to_string())
}

fn call(name: &str, brackets: &[&str], groups: Vec<Vec<SyntaxChunk>>) -> SyntaxChunk {
    SyntaxChunk::Call(SyntaxRecord {
        name: name.to_string(),
        brackets: brackets.iter().map(|b| b.to_string()).collect(),
        groups,
    })
}

/// Chunks of the root's only group
fn body(source: &str) -> Vec<SyntaxChunk> {
    let mut root = parse(source);
    assert_eq!(root.name, ROOT_NAME);
    assert_eq!(root.groups.len(), 1);
    root.groups.remove(0)
}

#[test]
fn test_plain_text() {
    assert_eq!(body("just prose"), vec![text("just prose")]);
}

#[test]
fn test_empty_document() {
    let root = parse("");
    assert_eq!(root.brackets, vec![String::new()]);
    assert_eq!(root.groups, vec![Vec::<SyntaxChunk>::new()]);
}

#[test]
fn test_simple_call() {
    assert_eq!(
        body("Hello, %em{world}!"),
        vec![
            text("Hello, "),
            call("em", &["{"], vec![vec![text("world")]]),
            text("!"),
        ]
    );
}

#[test]
fn test_several_groups() {
    assert_eq!(
        body("%section{Intro}[Body text]"),
        vec![call(
            "section",
            &["{", "["],
            vec![vec![text("Intro")], vec![text("Body text")]]
        )]
    );
}

#[test]
fn test_nested_calls() {
    assert_eq!(
        body("%em{a %rot(b) c}"),
        vec![call(
            "em",
            &["{"],
            vec![vec![
                text("a "),
                call("rot", &["("], vec![vec![text("b")]]),
                text(" c"),
            ]]
        )]
    );
}

#[test]
fn test_ladder_allows_single_closers_inside() {
    assert_eq!(
        body("%em{{a}b}}!"),
        vec![call("em", &["{{"], vec![vec![text("a}b")]]), text("!")]
    );
}

#[test]
fn test_double_opener_inside_single_keeps_outer_open() {
    assert_eq!(
        body("%a{x %b{{y}} z}w"),
        vec![
            call(
                "a",
                &["{"],
                vec![vec![
                    text("x "),
                    call("b", &["{{"], vec![vec![text("y")]]),
                    text(" z"),
                ]]
            ),
            text("w"),
        ]
    );
}

#[test]
fn test_single_opener_inside_double_keeps_outer_open() {
    assert_eq!(
        body("%a{{x %b{y} z}}w"),
        vec![
            call(
                "a",
                &["{{"],
                vec![vec![
                    text("x "),
                    call("b", &["{"], vec![vec![text("y")]]),
                    text(" z"),
                ]]
            ),
            text("w"),
        ]
    );
}

#[test]
fn test_quote_and_slash_openers() {
    assert_eq!(
        body("%em\"x\"%em/y/%em'z'"),
        vec![
            call("em", &["\""], vec![vec![text("x")]]),
            call("em", &["/"], vec![vec![text("y")]]),
            call("em", &["'"], vec![vec![text("z")]]),
        ]
    );
}

#[test]
fn test_terminator_is_consumed() {
    assert_eq!(
        body("%em{x};y"),
        vec![call("em", &["{"], vec![vec![text("x")]]), text("y")]
    );
    assert_eq!(body("%hr;rest"), vec![call("hr", &[], vec![]), text("rest")]);
}

#[test]
fn test_terminator_separates_name_from_text() {
    // Without the terminator the following letters would join the name
    assert_eq!(
        body("%em;{literal}"),
        vec![call("em", &[], vec![]), text("{literal}")]
    );
}

#[test]
fn test_whitespace_ends_name() {
    assert_eq!(
        body("%em\n{x}"),
        vec![call("em", &[], vec![]), text("\n{x}")]
    );
    assert_eq!(
        body("100% sure"),
        vec![text("100"), call("", &[], vec![]), text(" sure")]
    );
}

#[test]
fn test_angle_bracket_ends_name_without_opening() {
    assert_eq!(
        body("%em<b>"),
        vec![call("em", &[], vec![]), text("<b>")]
    );
}

#[test]
fn test_unicode_name() {
    assert_eq!(
        body("%ünï{x}"),
        vec![call("ünï", &["{"], vec![vec![text("x")]])]
    );
}

#[test]
fn test_unterminated_group_closes_at_end() {
    assert_eq!(
        body("see %em{this"),
        vec![text("see "), call("em", &["{"], vec![vec![text("this")]])]
    );
}

#[test]
fn test_stray_closer_is_text() {
    assert_eq!(body("a}b)c"), vec![text("a}b)c")]);
}

#[test]
fn test_empty_group() {
    assert_eq!(body("%em{}"), vec![call("em", &["{"], vec![vec![]])]);
}

#[test]
fn test_verbatim_group_is_raw() {
    assert_eq!(
        body("%mono`%em{x}` after"),
        vec![
            call("mono", &["`"], vec![vec![text("%em{x}")]]),
            text(" after"),
        ]
    );
}

#[test]
fn test_verbatim_ladder() {
    assert_eq!(
        body("%mono``a`b``c"),
        vec![call("mono", &["``"], vec![vec![text("a`b")]]), text("c")]
    );
}

#[test]
fn test_verbatim_closes_before_outer_group() {
    assert_eq!(
        body("%em{%mono`x`}y"),
        vec![
            call(
                "em",
                &["{"],
                vec![vec![call("mono", &["`"], vec![vec![text("x")]])]]
            ),
            text("y"),
        ]
    );
}

#[test]
fn test_depth_of_nested_records() {
    assert_eq!(parse("plain").depth(), 1);
    assert_eq!(parse("%a{%b{%c{x}}}").depth(), 4);
}

#[test]
fn test_bounded_parse_accepts_shallow_input() {
    let record = parse_bounded("%a{%b{%c{x}}}", 3).unwrap();
    assert_eq!(record, parse("%a{%b{%c{x}}}"));
}

#[test]
fn test_bounded_parse_rejects_deep_input() {
    let err = parse_bounded("%a{%b{%c{x}}}", 2).unwrap_err();
    match err {
        WritError::DepthExceeded { limit, offset } => {
            assert_eq!(limit, 2);
            assert_eq!(offset, 8);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_records_serialize() {
    let json = serde_json::to_value(parse("%em{x}")).unwrap();
    assert_eq!(json["name"], ROOT_NAME);
    assert_eq!(json["groups"][0][0]["Call"]["name"], "em");
}
