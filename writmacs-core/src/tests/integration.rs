use crate::*;

fn assert_expands(target: Target, cases: &[(&str, &str)]) {
    for (source, expected) in cases {
        let actual = expand(source, target).unwrap().text;
        assert_eq!(
            &actual, expected,
            "{target} expansion of {source:?} should be {expected:?}"
        );
    }
}

#[test]
fn test_html_cases() {
    assert_expands(
        Target::Html,
        &[
            ("Hello, %em{world}!", "Hello, <em>world</em>!"),
            ("monospaced", "monospaced"),
            (
                "<p>Hello,</p>\n<p>%rot{upside-down text}!</p>",
                "<p>Hello,</p>\n<p>ʇxǝʇ uʍop-ǝpᴉsdn!</p>",
            ),
            ("%sparkly(sparkly)", "✧⭒͙°sparkly✧ﾟ☆"),
            (
                "%underlined{underlined}",
                "<span class=\"underlined\">underlined</span>",
            ),
        ],
    );
}

#[test]
fn test_md_cases() {
    assert_expands(
        Target::Md,
        &[("the %smallcaps{smallest of Caps}", "the sᴍᴀʟʟᴇsᴛ ᴏғ Cᴀᴘs")],
    );
}

#[test]
fn test_txt_cases() {
    assert_expands(
        Target::Txt,
        &[
            ("the %smallcaps{smallest of Caps}", "the sᴍᴀʟʟᴇsᴛ ᴏғ Cᴀᴘs"),
            ("%rot(upside-down text!)", "¡ʇxǝʇ uʍop-ǝpᴉsdn"),
            ("%rot(¡ʇxǝʇ uʍop-ǝpᴉsdn)", "upside-down text!"),
        ],
    );
}

#[test]
fn test_studly_fixed_letters() {
    for _ in 0..20 {
        let studly = expand("%studly(Ievan Polkka)", Target::Md).unwrap().text;
        assert_eq!(studly.to_lowercase(), "ievan polkka");
        assert_eq!(studly.chars().next(), Some('i'));
        assert_eq!(studly.chars().nth(8), Some('L'));
    }
}

#[test]
fn test_undefined_snippet_degrades() {
    let out = expand("%snippet(9ece6796-b989-4137-b2d1-38d969f82c2a)", Target::Md).unwrap();
    assert_eq!(out.text, "9ece6796-b989-4137-b2d1-38d969f82c2a");
}

#[test]
fn test_undefined_snippet_is_an_error_when_strict() {
    let mut config = Config::default();
    config.strict = true;
    let mut session = Session::with_provider(config, DirectoryProvider::bundled()).unwrap();
    assert!(session
        .expand("%snippet(9ece6796-b989-4137-b2d1-38d969f82c2a)", Target::Md)
        .is_err());
}

#[test]
fn test_semantic_tree_is_deterministic() {
    let source = "%section{%em{A}}{b %rot(c)}";
    assert_eq!(semantic_tree(source).unwrap(), semantic_tree(source).unwrap());
}

#[test]
fn test_depth_limit_applies_to_sessions() {
    let mut config = Config::default();
    config.max_depth = 4;
    let mut session = Session::with_provider(config, DirectoryProvider::bundled()).unwrap();
    let deep = "%em{".repeat(10);
    assert!(matches!(
        session.expand(&deep, Target::Md),
        Err(WritError::DepthExceeded { limit: 4, .. })
    ));
    assert!(session.expand("%em{%em{x}}", Target::Md).is_ok());
}
