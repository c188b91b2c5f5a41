//! Writmacs core library
//!
//! Expands `%name{...}` macros embedded in prose into Markdown, HTML or
//! plain Unicode text. The pipeline runs in three passes:
//!
//! 1. [`parser`] turns source text into nested syntax records,
//! 2. [`tree`] builds the semantic node tree, letting organizers name
//!    bracket groups,
//! 3. [`eval`] resolves the tree against a [`MacroRegistry`], threading
//!    context down and metadata up.
//!
//! [`Session`] ties the passes together with a configured asset cache.

pub mod assets;
pub mod config;
pub mod error;
pub mod eval;
pub mod keymap;
pub mod macros;
pub mod parser;
pub mod session;
pub mod tree;
pub mod tsv;

#[cfg(test)]
mod tests;

pub use assets::{AssetCache, AssetProvider, DirectoryProvider, MemoryProvider};
pub use config::Config;
pub use error::{Result, WritError};
pub use eval::Evaluator;
pub use keymap::Keymap;
pub use macros::{
    Contextualizer, Expander, MacroCall, MacroEnv, MacroRegistry, RegistryBuilder, RuleOutput,
};
pub use parser::{parse, parse_bounded, SyntaxChunk, SyntaxRecord};
pub use session::{Expansion, Session};
pub use tree::{Organized, Organizer};

pub use writmacs_types::{Builder, Chunk, Context, Forest, Fragment, Metadata, Node, Target};

/// Expand `text` for `target` using only the bundled tables
pub fn expand(text: &str, target: Target) -> Result<Expansion> {
    let mut session = Session::with_provider(Config::default(), DirectoryProvider::bundled())?;
    session.expand(text, target)
}

/// Parse `text` and build its node tree with the built-in rules
///
/// Nesting is limited to the default `max_depth`.
pub fn semantic_tree(text: &str) -> Result<Node> {
    let record = parse_bounded(text, Config::default().max_depth)?;
    Ok(tree::build(record, &MacroRegistry::builtin()))
}
