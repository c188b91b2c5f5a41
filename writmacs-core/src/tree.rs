//! Semantic tree construction from syntax records.

use crate::macros::MacroRegistry;
use crate::parser::{SyntaxChunk, SyntaxRecord};
use std::collections::BTreeMap;
use writmacs_types::{Chunk, Forest, Node};

/// Bracket groups after an organizer has given them roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organized {
    pub groups: Vec<Vec<SyntaxChunk>>,
    /// Field name to index into `groups`
    pub fields: BTreeMap<String, usize>,
}

/// Reshapes the raw bracket groups of one macro into named fields
pub trait Organizer: Send + Sync {
    fn organize(&self, groups: Vec<Vec<SyntaxChunk>>) -> Organized;
}

/// Build the node tree for a record, consulting the registry's organizers
pub fn build(record: SyntaxRecord, registry: &MacroRegistry) -> Node {
    let SyntaxRecord { name, groups, .. } = record;

    let Organized { groups, fields } = match registry.organizer(&name) {
        Some(organizer) => organizer.organize(groups),
        None => Organized {
            groups,
            fields: BTreeMap::new(),
        },
    };

    let children = groups
        .into_iter()
        .map(|group| build_forest(group, registry))
        .collect();

    Node::with_fields(name, children, fields)
}

fn build_forest(group: Vec<SyntaxChunk>, registry: &MacroRegistry) -> Forest {
    group
        .into_iter()
        .map(|chunk| match chunk {
            SyntaxChunk::Text(text) => Chunk::Literal(text),
            SyntaxChunk::Call(record) => Chunk::Tree(build(record, registry)),
        })
        .collect()
}
