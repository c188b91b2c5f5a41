//! Bracket-aware reader that turns macro source text into syntax records.
//!
//! The reader never rejects input. An unterminated group is closed
//! implicitly at end of input, and stray closers are plain text. The only
//! failure is the optional nesting limit of [`parse_bounded`].

use crate::error::{Result, WritError};
use serde::Serialize;

/// Character that introduces a macro call
pub const INTERPOLATE: char = '%';

/// Optional character ending a macro call
pub const TERMINATE: char = ';';

/// Opener whose group is taken as raw text
pub const VERBATIM: char = '`';

/// Name of the record wrapping a whole document
pub const ROOT_NAME: &str = "<root>";

/// Closing character for a bracket opener
fn closer_for(opener: char) -> Option<char> {
    match opener {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '"' => Some('"'),
        '`' => Some('`'),
        '\'' => Some('\''),
        '/' => Some('/'),
        _ => None,
    }
}

/// Characters that end a macro name
fn ends_name(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '`' | '\'' | '/'
    ) || matches!(c, ' ' | '\n' | '\t')
        || c == TERMINATE
}

/// One element of a bracket group before tree construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyntaxChunk {
    Text(String),
    Call(SyntaxRecord),
}

/// A macro call as written: its name, the openers used and the raw groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxRecord {
    pub name: String,
    /// Opener strings exactly as written, one per group
    pub brackets: Vec<String>,
    pub groups: Vec<Vec<SyntaxChunk>>,
}

impl SyntaxRecord {
    /// Deepest chain of nested bracket groups below this record
    pub fn depth(&self) -> usize {
        self.groups
            .iter()
            .map(|group| {
                1 + group
                    .iter()
                    .map(|chunk| match chunk {
                        SyntaxChunk::Call(record) => record.depth(),
                        SyntaxChunk::Text(_) => 0,
                    })
                    .max()
                    .unwrap_or(0)
            })
            .max()
            .unwrap_or(0)
    }
}

/// Parse a whole document with no nesting limit
pub fn parse(text: &str) -> SyntaxRecord {
    match Reader::new(text, None).read_document() {
        Ok(record) => record,
        Err(_) => unreachable!("an unbounded read has no limit to exceed"),
    }
}

/// Parse a whole document, refusing to open more than `max_depth` nested groups
pub fn parse_bounded(text: &str, max_depth: usize) -> Result<SyntaxRecord> {
    Reader::new(text, Some(max_depth)).read_document()
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
    /// Closer strings of the groups currently open, innermost last
    ladders: Vec<String>,
    max_depth: Option<usize>,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str, max_depth: Option<usize>) -> Self {
        Self {
            text,
            pos: 0,
            ladders: Vec::new(),
            max_depth,
        }
    }

    fn read_document(mut self) -> Result<SyntaxRecord> {
        let body = self.read_prose()?;
        Ok(SyntaxRecord {
            name: ROOT_NAME.to_string(),
            brackets: vec![String::new()],
            groups: vec![body],
        })
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Only valid at a char boundary
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Length of the innermost closer if it starts here
    ///
    /// Closers are ASCII, so a byte match can only happen on a char boundary.
    fn at_ladder(&self) -> Option<usize> {
        let ladder = self.ladders.last()?;
        self.text.as_bytes()[self.pos..]
            .starts_with(ladder.as_bytes())
            .then_some(ladder.len())
    }

    fn read_prose(&mut self) -> Result<Vec<SyntaxChunk>> {
        let text: &'a str = self.text;
        let bytes = text.as_bytes();
        let mut chunks = Vec::new();
        let mut start = self.pos;

        loop {
            while !self.is_eof()
                && self.at_ladder().is_none()
                && bytes[self.pos] != INTERPOLATE as u8
            {
                self.pos += 1;
            }

            if self.pos > start {
                chunks.push(SyntaxChunk::Text(text[start..self.pos].to_string()));
            }

            if self.is_eof() {
                return Ok(chunks);
            }

            if let Some(len) = self.at_ladder() {
                self.pos += len;
                return Ok(chunks);
            }

            chunks.push(SyntaxChunk::Call(self.read_call()?));
            start = self.pos;
        }
    }

    fn read_call(&mut self) -> Result<SyntaxRecord> {
        self.pos += INTERPOLATE.len_utf8();
        let name_start = self.pos;
        while let Some(c) = self.peek() {
            if ends_name(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        let name = self.text[name_start..self.pos].to_string();

        let mut brackets = Vec::new();
        let mut groups = Vec::new();

        while let Some((opener, closer)) = self
            .peek()
            .and_then(|c| closer_for(c).map(|closer| (c, closer)))
        {
            let bracket_start = self.pos;
            while self.peek() == Some(opener) {
                self.pos += opener.len_utf8();
            }
            let bracket = &self.text[bracket_start..self.pos];
            let ladder = closer.to_string().repeat(bracket.len());

            if let Some(limit) = self.max_depth {
                if self.ladders.len() >= limit {
                    return Err(WritError::DepthExceeded {
                        limit,
                        offset: bracket_start,
                    });
                }
            }

            brackets.push(bracket.to_string());
            self.ladders.push(ladder);
            let group = if opener == VERBATIM {
                self.read_verbatim()
            } else {
                self.read_prose()?
            };
            self.ladders.pop();
            groups.push(group);
        }

        if self.peek() == Some(TERMINATE) {
            self.pos += TERMINATE.len_utf8();
        }

        Ok(SyntaxRecord {
            name,
            brackets,
            groups,
        })
    }

    /// Raw text up to the innermost closer, with no macro interpretation
    fn read_verbatim(&mut self) -> Vec<SyntaxChunk> {
        let start = self.pos;
        while !self.is_eof() && self.at_ladder().is_none() {
            self.pos += 1;
        }
        let body = &self.text[start..self.pos];
        if let Some(len) = self.at_ladder() {
            self.pos += len;
        }

        if body.is_empty() {
            Vec::new()
        } else {
            vec![SyntaxChunk::Text(body.to_string())]
        }
    }
}
