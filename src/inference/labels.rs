//! Class label maps.

use crate::detection::ClassId;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Maps model class ids to human-readable names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    names: BTreeMap<ClassId, String>,
}

impl LabelMap {
    /// Read a label map from disk, as pbtxt when the extension says so.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_pbtxt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pbtxt"));

        Ok(if is_pbtxt {
            Self::parse_pbtxt(&content)
        } else {
            Self::parse_lines(&content)
        })
    }

    /// Parse a plain list with one label per line.
    pub fn parse_lines(content: &str) -> Self {
        let names = content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let name = line.trim();
                if name.is_empty() {
                    return None;
                }
                let id = ClassId::try_from(index + 1).ok()?;
                Some((id, name.to_string()))
            })
            .collect();
        Self { names }
    }

    /// Parse the text protobuf label map format.
    ///
    /// Only the `id`, `name` and `display_name` fields of top-level `item`
    /// blocks are read; `display_name` wins over `name`. Items without an id
    /// or a name are skipped.
    pub fn parse_pbtxt(content: &str) -> Self {
        let mut names = BTreeMap::new();
        let mut tokens = tokenize(content).into_iter().peekable();
        let mut depth = 0_usize;

        while let Some(token) = tokens.next() {
            match token {
                Token::Open => depth += 1,
                Token::Close => depth = depth.saturating_sub(1),
                Token::Word(word) if depth == 0 && word == "item" => {
                    if tokens.next_if_eq(&Token::Open).is_some()
                        && let Some((id, label)) = parse_item(&mut tokens)
                    {
                        names.insert(id, label);
                    }
                }
                _ => {}
            }
        }

        Self { names }
    }

    /// Name for a class id, if known.
    pub fn name(&self, class_id: ClassId) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// Number of labelled classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no labels are known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Colon,
    Word(String),
    Quoted(String),
}

/// Split pbtxt into tokens; whitespace and commas separate, quotes group.
fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => tokens.push(Token::Open),
            '}' => tokens.push(Token::Close),
            ':' => tokens.push(Token::Colon),
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' | '\'' => {
                let mut text = String::new();
                while let Some(next) = chars.next() {
                    match next {
                        '\\' => text.extend(chars.next()),
                        q if q == c => break,
                        other => text.push(other),
                    }
                }
                tokens.push(Token::Quoted(text));
            }
            c if c.is_whitespace() || c == ',' => {}
            c => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '{' | '}' | ':' | ',' | '"' | '\'') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    tokens
}

/// Read `key: value` pairs up to the closing brace of an item.
fn parse_item(tokens: &mut impl Iterator<Item = Token>) -> Option<(ClassId, String)> {
    let mut id = None;
    let mut name = None;
    let mut display_name = None;
    let mut depth = 1_usize;
    let mut key: Option<String> = None;

    for token in tokens {
        match token {
            Token::Open => {
                depth += 1;
                key = None;
            }
            Token::Close => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Token::Colon => {}
            Token::Word(word) | Token::Quoted(word) if depth == 1 => match key.take() {
                None => key = Some(word),
                Some(field) => match field.as_str() {
                    "id" => id = word.parse::<ClassId>().ok(),
                    "name" => name = Some(word),
                    "display_name" => display_name = Some(word),
                    _ => {}
                },
            },
            _ => {}
        }
    }

    Some((id?, display_name.or(name)?))
}
