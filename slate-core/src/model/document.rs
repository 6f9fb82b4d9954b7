use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use super::Position;
use crate::error::{Result, SlateError};

/// Immutable tokenized view of one file's text.
///
/// Co-ordinates are (line number, token number, character number), with
/// (0, 0, 0) as the top left, tokens increasing left to right and lines
/// increasing top to bottom. Tokens are the whitespace-separated words of a
/// line; characters are counted in Unicode scalar values.
#[derive(Debug)]
pub struct Document {
    pub filepath: Option<String>,
    pub filename: Option<String>,
    raw_text: String,
    lines: Vec<String>,
    tokens: Vec<Vec<String>>,
    first_char: Position,
    last_char: Position,
    search_cache: RefCell<HashMap<String, Rc<[Position]>>>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Result<Self> {
        Self::build(content.into(), None)
    }

    /// Load a text file and tokenize it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SlateError::io(path, e))?;
        let doc = Self::build(content, Some(path))?;
        debug!(
            path = %path.display(),
            lines = doc.line_count(),
            "loaded document"
        );
        Ok(doc)
    }

    fn build(raw_text: String, path: Option<&Path>) -> Result<Self> {
        let lines: Vec<String> = raw_text.split('\n').map(String::from).collect();
        let tokens: Vec<Vec<String>> = lines
            .iter()
            .map(|line| line.split_whitespace().map(String::from).collect())
            .collect();

        let mut first_char = None;
        let mut last_char = None;
        for (line_no, line) in tokens.iter().enumerate() {
            if let Some(last) = line.last() {
                if first_char.is_none() {
                    first_char = Some(Position::character(line_no, 0, 0));
                }
                let last_len = last.chars().count();
                last_char = Some(Position::character(
                    line_no,
                    line.len() - 1,
                    last_len.saturating_sub(1),
                ));
            }
        }

        let name = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<text>".to_string());
        let (first_char, last_char) = match (first_char, last_char) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SlateError::EmptyDocument(name)),
        };

        Ok(Self {
            filepath: path.map(|p| p.display().to_string()),
            filename: path
                .and_then(|p| p.file_name())
                .map(|s| s.to_string_lossy().to_string()),
            raw_text,
            lines,
            tokens,
            first_char,
            last_char,
            search_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Tokens on a line (empty for blank or out-of-range lines)
    pub fn tokens(&self, line: usize) -> &[String] {
        self.tokens.get(line).map(|t| t.as_slice()).unwrap_or(&[])
    }

    pub fn token_count(&self, line: usize) -> usize {
        self.tokens(line).len()
    }

    /// Number of characters in a token (0 if it does not exist)
    pub fn token_len(&self, line: usize, token: usize) -> usize {
        self.tokens(line)
            .get(token)
            .map(|t| t.chars().count())
            .unwrap_or(0)
    }

    pub fn token_text(&self, line: usize, token: usize) -> Option<&str> {
        self.tokens(line).get(token).map(|t| t.as_str())
    }

    /// The earliest addressable character
    pub fn first_char(&self) -> Position {
        self.first_char
    }

    /// The latest addressable character
    pub fn last_char(&self) -> Position {
        self.last_char
    }

    fn first_line(&self) -> usize {
        self.first_char.as_slice()[0]
    }

    fn last_line(&self) -> usize {
        self.last_char.as_slice()[0]
    }

    /// Expand a partial position to a full (line, token, char) position,
    /// choosing the earliest or latest character it covers.
    pub fn get_3tuple(&self, partial: &Position, want_start: bool) -> Position {
        match *partial.as_slice() {
            [] => {
                if want_start {
                    self.first_char
                } else {
                    self.last_char
                }
            }
            [line] => {
                if want_start {
                    Position::character(line, 0, 0)
                } else {
                    let token = self.token_count(line).saturating_sub(1);
                    let ch = self.token_len(line, token).saturating_sub(1);
                    Position::character(line, token, ch)
                }
            }
            [line, token] => {
                let ch = if want_start {
                    0
                } else {
                    self.token_len(line, token).saturating_sub(1)
                };
                Position::character(line, token, ch)
            }
            _ => *partial,
        }
    }

    /// Shift a position, saturating at the first and last addressable
    /// positions. The result has the same arity as `pos`.
    ///
    /// `right` and `down` are signed step counts. With `max_jump` the
    /// position snaps to the extreme in each requested direction. Lines
    /// without tokens are never counted as a step for token and character
    /// positions; for line positions they are skipped when `skip_blank`.
    pub fn get_moved_pos(
        &self,
        pos: &Position,
        right: i64,
        down: i64,
        max_jump: bool,
        skip_blank: bool,
    ) -> Position {
        match *pos.as_slice() {
            [] => *pos,
            [line] => {
                // Left/right also mean up/down for lines
                let down = if down == 0 { right } else { down };
                Position::line(self.shift_line(line, down, max_jump, skip_blank))
            }
            [line, token] => {
                let nline = self.shift_line(line, down, max_jump, true);
                let (nline, ntok) = self.shift_token(nline, token, right, max_jump);
                Position::token(nline, ntok)
            }
            [line, token, ch] => {
                let nline = self.shift_line(line, down, max_jump, true);
                self.shift_char(nline, token, ch, right, max_jump)
            }
            _ => *pos,
        }
    }

    fn shift_line(&self, line: usize, down: i64, max_jump: bool, skip_blank: bool) -> usize {
        if max_jump {
            return match down.signum() {
                -1 => self.first_line(),
                1 => self.last_line(),
                _ => line,
            };
        }

        // Shift incrementally so we can optionally only count lines that
        // have tokens.
        let (first, last) = (self.first_line() as i64, self.last_line() as i64);
        let delta = if down > 0 { 1 } else { -1 };
        let mut shift = down;
        let mut nline = line as i64;
        while shift != 0 && first <= nline + delta && nline + delta <= last {
            nline += delta;
            if !skip_blank || self.token_count(nline as usize) > 0 {
                shift -= delta;
            }
        }
        nline as usize
    }

    /// Nearest line with tokens strictly after/before `line`
    fn next_token_line(&self, line: usize, forward: bool) -> Option<usize> {
        if forward {
            (line + 1..=self.last_line()).find(|&l| self.token_count(l) > 0)
        } else {
            (self.first_line()..line)
                .rev()
                .find(|&l| self.token_count(l) > 0)
        }
    }

    fn shift_token(&self, line: usize, token: usize, right: i64, max_jump: bool) -> (usize, usize) {
        let mut nline = line;
        let mut ntok = token.min(self.token_count(nline).saturating_sub(1));

        if max_jump {
            match right.signum() {
                -1 => ntok = 0,
                1 => ntok = self.token_count(nline).saturating_sub(1),
                _ => {}
            }
            return (nline, ntok);
        }

        let first = self.first_char.truncated(2);
        let last = self.last_char.truncated(2);
        let delta = if right > 0 { 1 } else { -1 };
        let mut shift = right;
        while shift != 0 {
            let here = Position::token(nline, ntok);
            if (delta < 0 && here == first) || (delta > 0 && here == last) {
                break;
            }
            let next = ntok as i64 + delta;
            if 0 <= next && (next as usize) < self.token_count(nline) {
                ntok = next as usize;
            } else {
                match self.next_token_line(nline, delta > 0) {
                    Some(l) => {
                        nline = l;
                        ntok = if delta > 0 {
                            0
                        } else {
                            self.token_count(l) - 1
                        };
                    }
                    None => break,
                }
            }
            shift -= delta;
        }
        (nline, ntok)
    }

    fn shift_char(&self, line: usize, token: usize, ch: usize, right: i64, max_jump: bool) -> Position {
        let mut nline = line;
        let mut ntok = token.min(self.token_count(nline).saturating_sub(1));
        let mut nchar = ch.min(self.token_len(nline, ntok).saturating_sub(1));

        if max_jump {
            match right.signum() {
                -1 => {
                    ntok = 0;
                    nchar = 0;
                }
                1 => {
                    ntok = self.token_count(nline).saturating_sub(1);
                    nchar = self.token_len(nline, ntok).saturating_sub(1);
                }
                _ => {}
            }
            return Position::character(nline, ntok, nchar);
        }

        let delta = if right > 0 { 1 } else { -1 };
        let mut shift = right;
        while shift != 0 {
            let here = Position::character(nline, ntok, nchar);
            if (delta < 0 && here == self.first_char) || (delta > 0 && here == self.last_char) {
                break;
            }
            let next = nchar as i64 + delta;
            if 0 <= next && (next as usize) < self.token_len(nline, ntok) {
                nchar = next as usize;
            } else if delta < 0 && ntok > 0 {
                ntok -= 1;
                nchar = self.token_len(nline, ntok).saturating_sub(1);
            } else if delta > 0 && ntok + 1 < self.token_count(nline) {
                ntok += 1;
                nchar = 0;
            } else {
                match self.next_token_line(nline, delta > 0) {
                    Some(l) => {
                        nline = l;
                        if delta > 0 {
                            ntok = 0;
                            nchar = 0;
                        } else {
                            ntok = self.token_count(l) - 1;
                            nchar = self.token_len(l, ntok).saturating_sub(1);
                        }
                    }
                    None => break,
                }
            }
            shift -= delta;
        }
        Position::character(nline, ntok, nchar)
    }

    /// One document-order step forward
    pub fn get_next_pos(&self, pos: &Position) -> Position {
        match pos.arity() {
            0 => *pos,
            1 => self.get_moved_pos(pos, 0, 1, false, true),
            _ => self.get_moved_pos(pos, 1, 0, false, true),
        }
    }

    /// One document-order step back
    pub fn get_previous_pos(&self, pos: &Position) -> Position {
        match pos.arity() {
            0 => *pos,
            1 => self.get_moved_pos(pos, 0, -1, false, true),
            _ => self.get_moved_pos(pos, -1, 0, false, true),
        }
    }

    /// Start positions of every literal occurrence of `text`, in document
    /// order. Results are cached per query for the life of the document.
    pub fn matches(&self, text: &str) -> Rc<[Position]> {
        if let Some(found) = self.search_cache.borrow().get(text) {
            return Rc::clone(found);
        }

        let mut positions = Vec::new();
        if !text.is_empty() {
            for (line_no, line) in self.lines.iter().enumerate() {
                for (offset, _) in line.match_indices(text) {
                    if let Some((token, ch)) = locate_in_line(line, offset) {
                        positions.push(Position::character(line_no, token, ch));
                    }
                }
            }
        }
        debug!(query = text, found = positions.len(), "search");

        let positions: Rc<[Position]> = positions.into();
        self.search_cache
            .borrow_mut()
            .insert(text.to_string(), Rc::clone(&positions));
        positions
    }
}

/// (token, char) of the byte `offset` in `line`. An offset inside
/// whitespace resolves to the start of the following token.
fn locate_in_line(line: &str, offset: usize) -> Option<(usize, usize)> {
    let mut token = 0;
    let mut token_start: Option<usize> = None;
    for (idx, c) in line.char_indices() {
        if c.is_whitespace() {
            if token_start.take().is_some() {
                token += 1;
            }
        } else if token_start.is_none() {
            token_start = Some(idx);
        }
        if idx == offset {
            return match token_start {
                Some(start) => Some((token, line[start..offset].chars().count())),
                None => (!line[offset..].trim_start().is_empty()).then_some((token, 0)),
            };
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new(text).unwrap()
    }

    #[test]
    fn test_empty_document_is_an_error() {
        assert!(matches!(
            Document::new("  \n\n \t"),
            Err(SlateError::EmptyDocument(_))
        ));
    }

    #[test]
    fn test_first_and_last_char() {
        let d = doc("\n  hello world\n\nfoo barbaz\n\n");
        assert_eq!(d.first_char(), Position::character(1, 0, 0));
        assert_eq!(d.last_char(), Position::character(3, 1, 5));
    }

    #[test]
    fn test_get_3tuple() {
        let d = doc("a bb ccc\ndd e\n");
        assert_eq!(
            d.get_3tuple(&Position::DOCUMENT, true),
            Position::character(0, 0, 0)
        );
        assert_eq!(
            d.get_3tuple(&Position::DOCUMENT, false),
            Position::character(1, 1, 0)
        );
        assert_eq!(
            d.get_3tuple(&Position::line(0), false),
            Position::character(0, 2, 2)
        );
        assert_eq!(
            d.get_3tuple(&Position::line(0), true),
            Position::character(0, 0, 0)
        );
        assert_eq!(
            d.get_3tuple(&Position::token(0, 1), false),
            Position::character(0, 1, 1)
        );
        assert_eq!(
            d.get_3tuple(&Position::token(0, 1), true),
            Position::character(0, 1, 0)
        );
    }

    #[test]
    fn test_document_scope_never_moves() {
        let d = doc("a b");
        assert_eq!(
            d.get_moved_pos(&Position::DOCUMENT, 5, -3, true, true),
            Position::DOCUMENT
        );
    }

    #[test]
    fn test_line_movement_skips_blank_lines() {
        let d = doc("a\n\nb\nc\n");
        assert_eq!(
            d.get_moved_pos(&Position::line(0), 0, 1, false, true),
            Position::line(2)
        );
        assert_eq!(
            d.get_moved_pos(&Position::line(0), 0, 1, false, false),
            Position::line(1)
        );
        // Right is folded into down for lines
        assert_eq!(
            d.get_moved_pos(&Position::line(0), 2, 0, false, true),
            Position::line(3)
        );
        // Saturates at the last line with content
        assert_eq!(
            d.get_moved_pos(&Position::line(2), 0, 10, false, true),
            Position::line(3)
        );
        assert_eq!(
            d.get_moved_pos(&Position::line(3), 0, -1, true, true),
            Position::line(0)
        );
    }

    #[test]
    fn test_token_movement_wraps_lines() {
        let d = doc("a b c\n\nd e\n");
        assert_eq!(
            d.get_moved_pos(&Position::token(0, 2), 1, 0, false, true),
            Position::token(2, 0)
        );
        assert_eq!(
            d.get_moved_pos(&Position::token(2, 0), -1, 0, false, true),
            Position::token(0, 2)
        );
        assert_eq!(
            d.get_moved_pos(&Position::token(0, 0), 4, 0, false, true),
            Position::token(2, 1)
        );
        // Saturates at the ends
        assert_eq!(
            d.get_moved_pos(&Position::token(2, 1), 3, 0, false, true),
            Position::token(2, 1)
        );
        assert_eq!(
            d.get_moved_pos(&Position::token(0, 1), -3, 0, false, true),
            Position::token(0, 0)
        );
    }

    #[test]
    fn test_token_vertical_clamps_token_index() {
        let d = doc("a b c\nd e\n");
        assert_eq!(
            d.get_moved_pos(&Position::token(0, 2), 0, 1, false, true),
            Position::token(1, 1)
        );
        assert_eq!(
            d.get_moved_pos(&Position::token(0, 1), 1, 0, true, true),
            Position::token(0, 2)
        );
        assert_eq!(
            d.get_moved_pos(&Position::token(0, 1), 0, 1, true, true),
            Position::token(1, 1)
        );
    }

    #[test]
    fn test_character_movement_crosses_tokens_and_lines() {
        let d = doc("ab c\nde\n");
        assert_eq!(
            d.get_moved_pos(&Position::character(0, 0, 1), 1, 0, false, true),
            Position::character(0, 1, 0)
        );
        assert_eq!(
            d.get_moved_pos(&Position::character(0, 1, 0), 1, 0, false, true),
            Position::character(1, 0, 0)
        );
        assert_eq!(
            d.get_moved_pos(&Position::character(1, 0, 0), -1, 0, false, true),
            Position::character(0, 1, 0)
        );
        assert_eq!(
            d.get_moved_pos(&Position::character(0, 0, 0), -1, 0, false, true),
            Position::character(0, 0, 0)
        );
        assert_eq!(
            d.get_moved_pos(&Position::character(1, 0, 0), 9, 0, false, true),
            Position::character(1, 0, 1)
        );
        assert_eq!(
            d.get_moved_pos(&Position::character(0, 0, 0), 1, 0, true, true),
            Position::character(0, 1, 0)
        );
    }

    #[test]
    fn test_saturating_max_jump_is_idempotent() {
        let d = doc("one two\n\nthree four five\nsix\n");
        for start in [
            Position::character(2, 1, 2),
            Position::token(2, 1),
            Position::line(2),
        ] {
            let mut pos = start;
            for _ in 0..3 {
                pos = d.get_moved_pos(&pos, 1, 1, true, true);
            }
            let end = d.last_char().truncated(start.arity());
            assert_eq!(pos, end);
            assert_eq!(d.get_moved_pos(&pos, 1, 1, true, true), end);

            for _ in 0..3 {
                pos = d.get_moved_pos(&pos, -1, -1, true, true);
            }
            let begin = d.first_char().truncated(start.arity());
            assert_eq!(pos, begin);
            assert_eq!(d.get_moved_pos(&pos, -1, -1, true, true), begin);
        }
    }

    #[test]
    fn test_next_and_previous_pos() {
        let d = doc("a b\nc\n");
        assert_eq!(d.get_next_pos(&Position::line(0)), Position::line(1));
        assert_eq!(d.get_next_pos(&Position::token(0, 1)), Position::token(1, 0));
        assert_eq!(
            d.get_previous_pos(&Position::token(1, 0)),
            Position::token(0, 1)
        );
        assert_eq!(d.get_next_pos(&Position::DOCUMENT), Position::DOCUMENT);
    }

    #[test]
    fn test_matches_counts_tokens_and_chars() {
        let d = doc("the cat sat\non the mat\n");
        let found = d.matches("at");
        assert_eq!(
            &found[..],
            &[
                Position::character(0, 1, 1),
                Position::character(0, 2, 1),
                Position::character(1, 2, 1),
            ]
        );

        let found = d.matches("the");
        assert_eq!(
            &found[..],
            &[Position::character(0, 0, 0), Position::character(1, 1, 0)]
        );
        assert!(d.matches("dog").is_empty());
        assert!(d.matches("").is_empty());
    }

    #[test]
    fn test_matches_are_cached() {
        let d = doc("a b a");
        let first = d.matches("a");
        let second = d.matches("a");
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_matches_with_leading_space_point_at_next_token() {
        let d = doc("  ab  cd");
        assert_eq!(&d.matches(" cd")[..], &[Position::character(0, 1, 0)]);
    }
}
