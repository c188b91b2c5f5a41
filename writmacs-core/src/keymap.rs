//! Replacement tables and the longest-match substitution engine.

use crate::error::Result;
use crate::tsv;
use std::collections::{HashMap, HashSet};
use writmacs_types::Builder;

/// An immutable string-to-string table plus the proper prefixes of its keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    mapping: HashMap<String, String>,
    hints: HashSet<String>,
}

impl Keymap {
    pub fn new(mapping: HashMap<String, String>) -> Self {
        let mut hints = HashSet::new();
        for key in mapping.keys() {
            // every non-empty proper prefix, cut on char boundaries
            for (ix, _) in key.char_indices().skip(1) {
                hints.insert(key[..ix].to_string());
            }
        }
        Self { mapping, hints }
    }

    /// Load a table from the TSV asset format
    pub fn from_tsv(source: &str) -> Result<Self> {
        Ok(Self::new(tsv::parse_mapping(source)?))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.mapping.get(key).map(String::as_str)
    }

    /// Whether `prefix` begins some longer key
    pub fn is_hint(&self, prefix: &str) -> bool {
        self.hints.contains(prefix)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Split `text` into the output pieces of a substitution, in order
    ///
    /// Each piece is either the value of the longest key matched at the
    /// scan position or, when no key matches, the single character there.
    pub fn pieces<'a>(&'a self, text: &'a str) -> Pieces<'a> {
        Pieces {
            keymap: self,
            text,
            pos: 0,
        }
    }

    /// Substitute `text` left to right by greedy longest match
    pub fn apply(&self, text: &str) -> String {
        self.pieces(text).collect()
    }

    /// Substitute every literal of a builder; markup is never scanned
    pub fn apply_builder(&self, builder: Builder) -> Builder {
        builder.map_literals(|text| self.apply(text))
    }
}

/// Iterator returned by [`Keymap::pieces`]
pub struct Pieces<'a> {
    keymap: &'a Keymap,
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Pieces<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let text: &'a str = self.text;
        let rest = &text[self.pos..];
        let first = rest.chars().next()?;

        let mut best = None;
        for (ix, c) in rest.char_indices() {
            let window = &rest[..ix + c.len_utf8()];
            if let Some(value) = self.keymap.get(window) {
                best = Some((window.len(), value));
            }
            if !self.keymap.is_hint(window) {
                break;
            }
        }

        Some(match best {
            Some((len, value)) => {
                self.pos += len;
                value
            }
            None => {
                let len = first.len_utf8();
                self.pos += len;
                &rest[..len]
            }
        })
    }
}
