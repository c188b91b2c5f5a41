//! Shared types for writmacs
//!
//! This crate provides the document model passed between the parser, the
//! tree builder and the evaluator: nodes and forests flow down, builders and
//! extracted metadata flow back up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key under which the output target is exposed in a [`Context`]
pub const TARGET_KEY: &str = "target";

/// Output format a document is expanded into
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Rich markup (HTML)
    Html,
    /// Light markup (Markdown)
    #[default]
    Md,
    /// Plain text
    Txt,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Html, Target::Md, Target::Txt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Html => "html",
            Target::Md => "md",
            Target::Txt => "txt",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Target`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown target '{}'", self.0)
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Target::Html),
            "md" => Ok(Target::Md),
            "txt" => Ok(Target::Txt),
            other => Err(UnknownTarget(other.to_string())),
        }
    }
}

/// Bottom-up side channel produced by macros (e.g. a document title)
pub type Metadata = BTreeMap<String, String>;

/// Context overrides derived by a macro for its own subtree
pub type PartialContext = BTreeMap<String, String>;

/// A resolved piece of output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    /// Source text, still subject to substitution by enclosing macros
    Literal(String),
    /// Pre-rendered output, never re-scanned
    Markup(String),
}

impl Fragment {
    pub fn as_str(&self) -> &str {
        match self {
            Fragment::Literal(s) | Fragment::Markup(s) => s,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Fragment::Literal(_))
    }
}

/// Ordered output of evaluating a forest or expanding a macro
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder(Vec<Fragment>);

impl Builder {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A builder holding a single literal
    pub fn literal(text: impl Into<String>) -> Self {
        let mut builder = Self::new();
        builder.push_literal(text);
        builder
    }

    /// A builder holding a single markup token
    pub fn markup(text: impl Into<String>) -> Self {
        let mut builder = Self::new();
        builder.push_markup(text);
        builder
    }

    /// Append literal text; empty strings are dropped
    pub fn push_literal(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.0.push(Fragment::Literal(text));
        }
    }

    pub fn push_markup(&mut self, text: impl Into<String>) {
        self.0.push(Fragment::Markup(text.into()));
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.0.push(fragment);
    }

    /// Append every fragment of another builder
    pub fn append(&mut self, other: Builder) {
        self.0.extend(other.0);
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.0
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Join every fragment into one string
    pub fn text(&self) -> String {
        self.0.iter().map(Fragment::as_str).collect()
    }

    /// Join only the literal fragments
    pub fn literal_text(&self) -> String {
        self.0
            .iter()
            .filter(|f| f.is_literal())
            .map(Fragment::as_str)
            .collect()
    }

    /// Whether any literal fragment contains a line break
    pub fn contains_line_break(&self) -> bool {
        self.0
            .iter()
            .any(|f| matches!(f, Fragment::Literal(s) if s.contains('\n')))
    }

    /// Rewrite each literal fragment, leaving markup untouched
    pub fn map_literals<F>(self, mut f: F) -> Builder
    where
        F: FnMut(&str) -> String,
    {
        self.0
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Literal(s) => Fragment::Literal(f(&s)),
                markup @ Fragment::Markup(_) => markup,
            })
            .collect()
    }
}

impl FromIterator<Fragment> for Builder {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Fragment> for Builder {
    fn extend<I: IntoIterator<Item = Fragment>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Builder {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Builder {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.0 {
            f.write_str(fragment.as_str())?;
        }
        Ok(())
    }
}

/// One element of a forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Literal(String),
    Markup(String),
    /// A nested macro invocation
    Tree(Node),
}

/// Ordered contents of one bracket group
pub type Forest = Vec<Chunk>;

/// One parsed macro invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    children: Vec<Forest>,
    fields: BTreeMap<String, usize>,
}

impl Node {
    /// Create a node with positional children only
    pub fn new(name: impl Into<String>, children: Vec<Forest>) -> Self {
        Self {
            name: name.into(),
            children,
            fields: BTreeMap::new(),
        }
    }

    /// Create a node whose children are also addressable by field name
    pub fn with_fields(
        name: impl Into<String>,
        children: Vec<Forest>,
        fields: BTreeMap<String, usize>,
    ) -> Self {
        Self {
            name: name.into(),
            children,
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Forest] {
        &self.children
    }

    pub fn fields(&self) -> &BTreeMap<String, usize> {
        &self.fields
    }

    pub fn child(&self, index: usize) -> Option<&Forest> {
        self.children.get(index)
    }

    /// Look up a child by the field name an organizer assigned to it
    pub fn field(&self, name: &str) -> Option<&Forest> {
        self.fields.get(name).and_then(|&ix| self.children.get(ix))
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let rule = "-".repeat(depth);
        write!(f, "\n«{}:{}:", rule, self.name)?;
        for (ix, forest) in self.children.iter().enumerate() {
            write!(f, "\n{}[{}]\n", rule, ix)?;
            for chunk in forest {
                match chunk {
                    Chunk::Literal(s) | Chunk::Markup(s) => f.write_str(s)?,
                    Chunk::Tree(node) => node.write_tree(f, depth + 1)?,
                }
            }
        }
        f.write_str("»")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Top-down state inherited by every subtree
///
/// Contexts are never mutated in place: [`Context::overlay`] returns a new
/// context for a subtree and leaves the parent's untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    target: Target,
    vars: BTreeMap<String, String>,
}

impl Context {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            vars: BTreeMap::new(),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == TARGET_KEY {
            Some(self.target.as_str())
        } else {
            self.vars.get(key).map(String::as_str)
        }
    }

    /// Return a copy with one extra key set
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == TARGET_KEY {
            if let Ok(target) = value.parse() {
                self.target = target;
            }
        } else {
            self.vars.insert(key, value);
        }
        self
    }

    /// Merge derived keys over this context, derived keys winning
    ///
    /// A `target` key that names no known target is ignored.
    pub fn overlay(&self, partial: &PartialContext) -> Context {
        partial
            .iter()
            .fold(self.clone(), |context, (key, value)| {
                context.with(key.as_str(), value.as_str())
            })
    }
}
