use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::position::{compare_positions, precedence};
use super::{Document, Position, Scope, SpanRelation};
use crate::error::{Result, SlateError};

/// Direction of an edit or step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Next,
    Previous,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "next" => Ok(Direction::Next),
            "previous" => Ok(Direction::Previous),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Document-order direction used by searches and navigation helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Next,
    Previous,
}

impl From<SearchDirection> for Direction {
    fn from(dir: SearchDirection) -> Self {
        match dir {
            SearchDirection::Next => Direction::Next,
            SearchDirection::Previous => Direction::Previous,
        }
    }
}

impl FromStr for SearchDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "next" => Ok(SearchDirection::Next),
            "previous" => Ok(SearchDirection::Previous),
            other => Err(format!("unknown search direction: {}", other)),
        }
    }
}

/// What an edit does to the span's endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Shift both ends
    Move,
    /// Push one end outwards
    Extend,
    /// Pull one end inwards
    Contract,
}

impl FromStr for Change {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "move" => Ok(Change::Move),
            "extend" => Ok(Change::Extend),
            "contract" => Ok(Change::Contract),
            other => Err(format!("unknown change: {}", other)),
        }
    }
}

/// Raw span components as written in a file, before they are checked
/// against a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanSpec {
    Point(Vec<usize>),
    Range(Vec<usize>, Vec<usize>),
}

fn write_tuple(f: &mut fmt::Formatter<'_>, parts: &[usize]) -> fmt::Result {
    match parts {
        [only] => write!(f, "({},)", only),
        _ => {
            let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", parts.join(", "))
        }
    }
}

impl fmt::Display for SpanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanSpec::Point(parts) => write_tuple(f, parts),
            SpanSpec::Range(start, end) => {
                f.write_str("(")?;
                write_tuple(f, start)?;
                f.write_str(", ")?;
                write_tuple(f, end)?;
                f.write_str(")")
            }
        }
    }
}

/// A continuous span of text at one scope.
///
/// All annotations are on spans, some of which just happen to have a single
/// element. `start` never follows `end` in document order.
#[derive(Clone)]
pub struct Span {
    scope: Scope,
    doc: Rc<Document>,
    start: Position,
    end: Position,
}

impl Span {
    /// A single-point span on the first addressable position
    pub fn new(scope: Scope, doc: &Rc<Document>) -> Self {
        let first = doc.first_char().truncated(scope.arity());
        Self {
            scope,
            doc: Rc::clone(doc),
            start: first,
            end: first,
        }
    }

    /// A single-point span
    pub fn at(scope: Scope, doc: &Rc<Document>, pos: Position) -> Result<Self> {
        Self::between(scope, doc, pos, pos)
    }

    pub fn between(scope: Scope, doc: &Rc<Document>, start: Position, end: Position) -> Result<Self> {
        for pos in [&start, &end] {
            if pos.arity() != scope.arity() {
                return Err(SlateError::InvalidSpan {
                    expected: scope.arity(),
                    found: pos.arity(),
                });
            }
        }
        if compare_positions(&start, &end) == Ordering::Greater {
            return Err(SlateError::InvertedSpan {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            scope,
            doc: Rc::clone(doc),
            start,
            end,
        })
    }

    /// Copy another span's endpoints, checking them against `scope`
    pub fn from_span(scope: Scope, other: &Span) -> Result<Self> {
        Self::between(scope, &other.doc, other.start, other.end)
    }

    pub fn from_spec(scope: Scope, doc: &Rc<Document>, spec: &SpanSpec) -> Result<Self> {
        let position = |parts: &[usize]| {
            Position::from_slice(parts)
                .filter(|p| p.arity() == scope.arity())
                .ok_or(SlateError::InvalidSpan {
                    expected: scope.arity(),
                    found: parts.len(),
                })
        };
        match spec {
            SpanSpec::Point(parts) => Self::at(scope, doc, position(parts)?),
            SpanSpec::Range(start, end) => Self::between(scope, doc, position(start)?, position(end)?),
        }
    }

    /// Rebuild with new endpoints; callers guarantee order and arity
    fn with_positions(&self, start: Position, end: Position) -> Self {
        Self {
            scope: self.scope,
            doc: Rc::clone(&self.doc),
            start,
            end,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn doc(&self) -> &Rc<Document> {
        &self.doc
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    /// Zero width: both ends on the same position
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    pub fn same_document(&self, other: &Span) -> bool {
        Rc::ptr_eq(&self.doc, &other.doc)
    }

    pub fn to_spec(&self) -> SpanSpec {
        if self.is_point() {
            SpanSpec::Point(self.start.as_slice().to_vec())
        } else {
            SpanSpec::Range(self.start.as_slice().to_vec(), self.end.as_slice().to_vec())
        }
    }

    /// The same text as a character-scope span
    pub fn to_character_span(&self) -> Span {
        let start = self.doc.get_3tuple(&self.start, true);
        let end = self.doc.get_3tuple(&self.end, false);
        Self {
            scope: Scope::Character,
            doc: Rc::clone(&self.doc),
            start,
            end,
        }
    }

    /// Classify how this span sits relative to `other`
    pub fn compare(&self, other: &Span) -> SpanRelation {
        let s0 = self.doc.get_3tuple(&self.start, true);
        let e0 = self.doc.get_3tuple(&self.end, false);
        let s1 = other.doc.get_3tuple(&other.start, true);
        let e1 = other.doc.get_3tuple(&other.end, false);

        let key = (
            precedence(&s0, &s1),
            precedence(&e0, &e1),
            precedence(&s0, &e1),
            precedence(&e0, &s1),
            precedence(&s0, &e0),
            precedence(&s1, &e1),
        );
        match SpanRelation::classify(key) {
            Some(relation) => relation,
            None => unreachable!("span endpoints out of order: {:?} vs {:?}", self, other),
        }
    }

    /// A changed copy of this span. Requests that cannot be honoured leave
    /// the span as it is.
    ///
    /// `next`/`previous` step both ends one position in document order.
    /// Otherwise `distance` steps in the given direction are applied: `move`
    /// shifts both ends and is dropped unless both actually change, while
    /// `extend`/`contract` shift the start (left, up) or the end (right,
    /// down) and are dropped if the span would invert.
    pub fn edited(&self, direction: Direction, change: Change, distance: usize, max_jump: bool) -> Span {
        let doc = &self.doc;
        match direction {
            Direction::Next => {
                return self.with_positions(doc.get_next_pos(&self.start), doc.get_next_pos(&self.end))
            }
            Direction::Previous => {
                return self.with_positions(
                    doc.get_previous_pos(&self.start),
                    doc.get_previous_pos(&self.end),
                )
            }
            _ => {}
        }

        let distance = i64::try_from(distance).unwrap_or(i64::MAX);
        let (mut right, mut down) = match direction {
            Direction::Left => (-distance, 0),
            Direction::Right => (distance, 0),
            Direction::Up => (0, -distance),
            Direction::Down => (0, distance),
            Direction::Next | Direction::Previous => (0, 0),
        };
        if change == Change::Contract {
            right = right.saturating_mul(-distance);
            down = down.saturating_mul(-distance);
        }

        let (nstart, nend) = match change {
            Change::Move => {
                let nstart = doc.get_moved_pos(&self.start, right, down, max_jump, true);
                let nend = doc.get_moved_pos(&self.end, right, down, max_jump, true);
                // Only move if it will change both (otherwise it is a shift)
                if nstart == self.start || nend == self.end {
                    return self.clone();
                }
                (nstart, nend)
            }
            Change::Extend | Change::Contract => {
                if matches!(direction, Direction::Left | Direction::Up) {
                    let moved = doc.get_moved_pos(&self.start, right, down, max_jump, true);
                    (moved, self.end)
                } else {
                    let moved = doc.get_moved_pos(&self.end, right, down, max_jump, true);
                    (self.start, moved)
                }
            }
        };

        if compare_positions(&nstart, &nend) == Ordering::Greater {
            return self.clone();
        }
        self.with_positions(nstart, nend)
    }

    /// Step once in document order
    pub fn stepped(&self, direction: SearchDirection) -> Span {
        self.edited(direction.into(), Change::Move, 1, false)
    }

    /// Move to an occurrence of `query` strictly after (next) or before
    /// (previous) the current start.
    ///
    /// `count` picks the count-th occurrence in that direction and
    /// `max_jump` the farthest; both saturate at the farthest occurrence.
    /// Without a match in that direction the span is returned unchanged.
    pub fn search(&self, query: &str, direction: SearchDirection, count: usize, max_jump: bool) -> Span {
        let options = self.doc.matches(query);
        let candidates: Vec<&Position> = match direction {
            SearchDirection::Next => options
                .iter()
                .filter(|option| precedence(&self.start, option) > 0)
                .collect(),
            SearchDirection::Previous => options
                .iter()
                .rev()
                .filter(|option| precedence(&self.start, option) < 0)
                .collect(),
        };

        let picked = if max_jump {
            candidates.last()
        } else {
            candidates
                .get(count.max(1) - 1)
                .or_else(|| candidates.last())
        };
        match picked {
            Some(found) => self.with_positions(
                found.truncated(self.scope.arity()),
                found.truncated(self.scope.arity()),
            ),
            None => self.clone(),
        }
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Span {}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Start first, then end. Positions are compared with
/// [`compare_positions`], so only spans of one scope are totally ordered.
impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_positions(&self.start, &other.start)
            .then_with(|| compare_positions(&self.end, &other.end))
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}, {})", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}
