//! The built-in macros.

use super::combinators::{KeymapRule, Tag, TargetDispatch, Wrap};
use super::{Expander, MacroCall, MacroEnv, RegistryBuilder, RuleOutput};
use crate::error::{Result, WritError};
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use writmacs_types::{Builder, Fragment, Metadata, Target};

pub const ROTATED: &str = "rotated";
pub const SMALLCAPS: &str = "smallcaps";
pub const MONOSPACE: &str = "monospace";

pub const TITLE_KEY: &str = "title";

pub const SPARKLE_PREFIX: &str = "✧⭒͙°";
pub const SPARKLE_SUFFIX: &str = "✧ﾟ☆";

/// Chance that `studly` capitalizes a free letter
pub const STUDLY_UPPER: f64 = 0.4;

/// Combining low line
pub const UNDERLINE: char = '\u{332}';

/// Characters that get a combining underline in plain output
pub const UNDERLINABLE: &str = concat!(
    "0123456789ABCDEFGHIJKLMNOPRSTUVWXYZabcdefhiklmnorstuvwxz",
    "ĉĈĥĤŭŬêÊĴĜ().?!:-'\"+=*&^%$#@`~",
);

pub const ZALGO_MARKS: RangeInclusive<u32> = 0x300..=0x362;
pub const ZALGO_PER_CHAR: usize = 8;

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    let emphasis = TargetDispatch::new()
        .on(&[Target::Md, Target::Txt], Wrap::symmetric("*"))
        .on(&[Target::Html], Tag::new("em"));

    let monospace = TargetDispatch::new()
        .on(&[Target::Md], Wrap::symmetric("`"))
        .on(&[Target::Html], CodeTag)
        .on(&[Target::Txt], KeymapRule::new(MONOSPACE));

    let smallcaps = TargetDispatch::new()
        .on(&[Target::Md, Target::Txt], KeymapRule::new(SMALLCAPS))
        .on(&[Target::Html], Tag::with_class("span", "smallcaps"));

    builder
        .aliases(&["em"], Arc::new(emphasis))
        .aliases(&["map"], Arc::new(ApplyKeymap))
        .aliases(&["mono", "monospace"], Arc::new(monospace))
        .aliases(&["rot", "rotate"], Arc::new(Rotate))
        .aliases(&["section"], Arc::new(Section))
        .aliases(&["smallcap", "smallcaps"], Arc::new(smallcaps))
        .aliases(&["snip", "snippet"], Arc::new(Snippet))
        .aliases(
            &["sparkle", "sparkly"],
            Arc::new(Wrap::new(SPARKLE_PREFIX, SPARKLE_SUFFIX)),
        )
        .aliases(&["studly"], Arc::new(Studly))
        .aliases(&["title"], Arc::new(Title))
        .aliases(&["under", "underline", "underlined"], Arc::new(Underline))
        .aliases(&["void", "zalgo"], Arc::new(Zalgo))
}

/// `<pre>` for content with line breaks, `<code>` otherwise
struct CodeTag;

impl Expander for CodeTag {
    fn expand(&self, mut call: MacroCall<'_>, _env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let body = call.take(0);
        let tag = if body.contains_line_break() {
            Tag::new("pre")
        } else {
            Tag::new("code")
        };
        Ok(tag.wrap(body).into())
    }
}

/// `%map{table}{content}`
struct ApplyKeymap;

impl Expander for ApplyKeymap {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let table = call.take(0).text();
        let keymap = env.assets.require_table(&table)?;
        Ok(keymap.apply_builder(call.take(1)).into())
    }
}

/// Upside-down text: flip every glyph, then reverse the order
struct Rotate;

impl Expander for Rotate {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let keymap = env.assets.require_table(ROTATED)?;
        let mut flipped = Vec::new();
        for fragment in call.take(0) {
            match fragment {
                Fragment::Literal(text) => flipped.extend(
                    keymap
                        .pieces(&text)
                        .map(|piece| Fragment::Literal(piece.to_string())),
                ),
                markup @ Fragment::Markup(_) => flipped.push(markup),
            }
        }
        flipped.reverse();
        Ok(flipped.into_iter().collect::<Builder>().into())
    }
}

/// `%section{heading}{body}`
struct Section;

impl Expander for Section {
    fn expand(&self, call: MacroCall<'_>, _env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let target = call.target();
        let mut groups = call.groups.into_iter();
        let heading = groups.next().unwrap_or_default();
        let mut body = groups.next().unwrap_or_default();
        for extra in groups {
            body.append(extra);
        }

        let out = match target {
            Target::Md | Target::Txt => {
                let mut out = Builder::literal("## ");
                out.append(heading);
                out.push_literal("\n\n");
                out.append(body);
                out
            }
            Target::Html => {
                let mut inner = Tag::new("h3").wrap(heading);
                inner.append(body);
                Tag::new("section").wrap(inner)
            }
        };
        Ok(out.into())
    }
}

/// Escape the characters Markdown would read as formatting
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '_' | '*') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `%snippet{name}`
struct Snippet;

impl Expander for Snippet {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let name = call.take(0).literal_text();
        match env.assets.snippet(&name)? {
            Some(text) if call.target() == Target::Md => {
                Ok(Builder::literal(escape_markdown(&text)).into())
            }
            Some(text) => Ok(Builder::literal(&*text).into()),
            None if env.strict => Err(WritError::UnknownSnippet { name }),
            None => {
                tracing::warn!("Snippet {} not found, rendering its name", name);
                Ok(Builder::literal(name).into())
            }
        }
    }
}

/// Sets the document title without producing output
struct Title;

impl Expander for Title {
    fn expand(&self, mut call: MacroCall<'_>, _env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let mut metadata = Metadata::new();
        metadata.insert(TITLE_KEY.to_string(), call.take(0).text());
        Ok(RuleOutput::with_metadata(Builder::new(), metadata))
    }
}

/// Random capitals, except `i` is always small and `L` always big
pub fn studly_text<R: Rng>(text: &str, rng: &mut R) -> String {
    text.chars()
        .map(|c| match c {
            'I' | 'i' => 'i',
            'L' | 'l' => 'L',
            c if c.is_ascii_alphabetic() => {
                if rng.gen_bool(STUDLY_UPPER) {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            }
            c => c,
        })
        .collect()
}

struct Studly;

impl Expander for Studly {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let rng = &mut *env.rng;
        Ok(call.take(0).map_literals(|text| studly_text(text, &mut *rng)).into())
    }
}

/// Spaces become underscores, underlinable characters get a combining line
pub fn underline_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if c == ' ' {
            out.push('_');
        } else {
            out.push(c);
            if UNDERLINABLE.contains(c) {
                out.push(UNDERLINE);
            }
        }
    }
    out
}

struct Underline;

impl Expander for Underline {
    fn expand(&self, mut call: MacroCall<'_>, _env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let content = call.take(0);
        let out = match call.target() {
            Target::Html => Tag::with_class("span", "underlined").wrap(content),
            Target::Md | Target::Txt => content.map_literals(underline_text),
        };
        Ok(out.into())
    }
}

/// Bury every character under random combining marks
pub fn zalgo_text<R: Rng>(text: &str, rng: &mut R) -> String {
    let mut out = String::with_capacity(text.len() * (1 + 2 * ZALGO_PER_CHAR));
    for c in text.chars() {
        out.push(c);
        for _ in 0..ZALGO_PER_CHAR {
            out.extend(char::from_u32(rng.gen_range(ZALGO_MARKS)));
        }
    }
    out
}

struct Zalgo;

impl Expander for Zalgo {
    fn expand(&self, mut call: MacroCall<'_>, env: &mut MacroEnv<'_>) -> Result<RuleOutput> {
        let rng = &mut *env.rng;
        Ok(call.take(0).map_literals(|text| zalgo_text(text, &mut *rng)).into())
    }
}
