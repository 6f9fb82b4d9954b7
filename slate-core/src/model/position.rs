use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SlateError;

/// Granularity of addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Character,
    Token,
    Line,
    Document,
}

impl Scope {
    pub fn all() -> &'static [Scope] {
        &[Scope::Character, Scope::Token, Scope::Line, Scope::Document]
    }

    /// Number of components in a position at this scope
    pub fn arity(&self) -> usize {
        match self {
            Scope::Character => 3,
            Scope::Token => 2,
            Scope::Line => 1,
            Scope::Document => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Character => "character",
            Scope::Token => "token",
            Scope::Line => "line",
            Scope::Document => "document",
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Token
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = SlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::all()
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| SlateError::UnknownScope(s.to_string()))
    }
}

/// A location in a document: (line, token, char-in-token), truncated to
/// 0-3 components depending on scope.
///
/// Unused components are always zero, so equality and hashing only see the
/// components in use.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    parts: [usize; 3],
    len: u8,
}

impl Position {
    /// The whole-document position (no components)
    pub const DOCUMENT: Position = Position {
        parts: [0; 3],
        len: 0,
    };

    pub fn line(line: usize) -> Self {
        Self {
            parts: [line, 0, 0],
            len: 1,
        }
    }

    pub fn token(line: usize, token: usize) -> Self {
        Self {
            parts: [line, token, 0],
            len: 2,
        }
    }

    pub fn character(line: usize, token: usize, ch: usize) -> Self {
        Self {
            parts: [line, token, ch],
            len: 3,
        }
    }

    /// Build from up to three components; `None` for longer slices
    pub fn from_slice(parts: &[usize]) -> Option<Self> {
        match *parts {
            [] => Some(Self::DOCUMENT),
            [l] => Some(Self::line(l)),
            [l, t] => Some(Self::token(l, t)),
            [l, t, c] => Some(Self::character(l, t, c)),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        self.len as usize
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.parts[..self.arity()]
    }

    pub fn line_no(&self) -> Option<usize> {
        self.as_slice().first().copied()
    }

    pub fn token_no(&self) -> Option<usize> {
        self.as_slice().get(1).copied()
    }

    pub fn char_no(&self) -> Option<usize> {
        self.as_slice().get(2).copied()
    }

    /// Keep only the first `arity` components
    pub fn truncated(&self, arity: usize) -> Self {
        let len = arity.min(self.arity());
        let mut parts = [0; 3];
        parts[..len].copy_from_slice(&self.parts[..len]);
        Self {
            parts,
            len: len as u8,
        }
    }
}

/// Document-order comparison that tolerates differing specificity.
///
/// `Less` means `a` precedes `b`. Components are compared left to right; once
/// either position runs out of components the two are treated as equal, so
/// `(4,)` neither precedes nor follows `(4, 2, 1)`. This is not a total order
/// across arities.
pub fn compare_positions(a: &Position, b: &Position) -> Ordering {
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// `compare_positions` as a sign: +1 when `a` precedes `b`, -1 when it
/// follows, 0 otherwise.
pub(crate) fn precedence(a: &Position, b: &Position) -> i8 {
    match compare_positions(a, b) {
        Ordering::Less => 1,
        Ordering::Equal => 0,
        Ordering::Greater => -1,
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Tuple syntax used by the standoff files: `()`, `(4,)`, `(4, 2)`, `(4, 2, 1)`
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_slice() {
            [] => write!(f, "()"),
            [l] => write!(f, "({},)", l),
            parts => {
                let joined: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", joined.join(", "))
            }
        }
    }
}
