use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::Datum;
use crate::config::AnnotationType;
use crate::model::{compare_positions, Document, Position, Span};

/// Where a marker applies: a position, or the gap before a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKey {
    Document,
    Line(usize),
    Token { line: usize, token: usize },
    Char { line: usize, token: usize, ch: usize },
    /// The space in front of a token
    Gap { line: usize, token: usize },
}

impl MarkKey {
    pub fn from_position(pos: &Position) -> Self {
        match *pos.as_slice() {
            [] => MarkKey::Document,
            [line] => MarkKey::Line(line),
            [line, token] => MarkKey::Token { line, token },
            [line, token, ch, ..] => MarkKey::Char { line, token, ch },
        }
    }

    /// Gaps sort before everything else on their token
    fn sort_key(&self) -> (usize, usize, u8, usize) {
        match *self {
            MarkKey::Document => (0, 0, 0, 0),
            MarkKey::Line(line) => (line, 0, 1, 0),
            MarkKey::Gap { line, token } => (line, token, 2, 0),
            MarkKey::Token { line, token } => (line, token, 3, 0),
            MarkKey::Char { line, token, ch } => (line, token, 3, ch),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            MarkKey::Document => 0,
            MarkKey::Line(_) => 1,
            MarkKey::Gap { .. } => 2,
            MarkKey::Token { .. } => 3,
            MarkKey::Char { .. } => 4,
        }
    }
}

impl Ord for MarkKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialOrd for MarkKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rendering hint for one position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Marker {
    Cursor,
    Link,
    /// A configured label
    Label(String),
    /// A label missing from the configuration
    UnknownLabel(String),
    Linked,
    /// Part of an item that the link span belongs to
    Ref,
    SelfLink,
    Compare {
        missing: usize,
        label: String,
        known: bool,
    },
    CompareRef {
        has_link: bool,
        missing: usize,
        last: bool,
    },
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Cursor => f.write_str("cursor"),
            Marker::Link => f.write_str("link"),
            Marker::Label(label) => f.write_str(label),
            Marker::UnknownLabel(label) => write!(f, "label:{}", label),
            Marker::Linked => f.write_str("linked"),
            Marker::Ref => f.write_str("ref"),
            Marker::SelfLink => f.write_str("self-link"),
            Marker::Compare {
                missing,
                label,
                known: true,
            } => write!(f, "compare-{}-{}", missing, label),
            Marker::Compare { missing, label, .. } => {
                write!(f, "compare-label-{}-{}", missing, label)
            }
            Marker::CompareRef {
                has_link,
                missing,
                last,
            } => write!(
                f,
                "compare-ref-{}-{}-{}",
                has_link,
                missing,
                if *last { "last" } else { "earlier" }
            ),
        }
    }
}

pub type Markings = BTreeMap<MarkKey, Vec<Marker>>;

/// Visit every position of `span` in document order. The flag is set for
/// the gap in front of each token after the first. An end the walk cannot
/// land on, such as a blank line, stops it at the last position before.
fn walk_span(doc: &Document, span: &Span, mut visit: impl FnMut(MarkKey, bool)) {
    let end = span.end();
    let mut pos = span.start();
    loop {
        visit(MarkKey::from_position(&pos), false);
        if pos == end {
            break;
        }
        let next = doc.get_next_pos(&pos);
        if next == pos || compare_positions(&next, &end) == Ordering::Greater {
            break;
        }
        pos = next;
        match *pos.as_slice() {
            [line, token] | [line, token, 0] => visit(MarkKey::Gap { line, token }, true),
            _ => {}
        }
    }
}

impl Datum {
    /// Everything a renderer needs to draw the document: the cursor, the
    /// link, stored items and comparison items, keyed by position.
    pub fn get_all_markings(&self, cursor: &Span, link: Option<&Span>) -> Markings {
        let mut markings = Markings::new();
        let doc = self.doc();
        let categorical = self.config.annotation_type != AnnotationType::Link;

        walk_span(doc, cursor, |key, _| {
            markings.entry(key).or_default().push(Marker::Cursor)
        });
        if let Some(link) = link {
            walk_span(doc, link, |key, _| {
                markings.entry(key).or_default().push(Marker::Link)
            });
        }

        for item in self.items() {
            let base: Vec<Marker> = if categorical {
                item.labels
                    .iter()
                    .map(|label| {
                        if self.config.is_known_label(label) {
                            Marker::Label(label.clone())
                        } else {
                            Marker::UnknownLabel(label.clone())
                        }
                    })
                    .collect()
            } else if self.config.show_linked {
                vec![Marker::Linked]
            } else {
                Vec::new()
            };
            let is_ref = item.is_link() && link.map_or(false, |l| item.contains_span(l));
            let self_link = item.is_self_link();

            for span in &item.spans {
                walk_span(doc, span, |key, gap| {
                    let entry = markings.entry(key).or_default();
                    entry.extend(base.iter().cloned());
                    if is_ref {
                        entry.push(Marker::Ref);
                        if self_link && !gap {
                            entry.push(Marker::SelfLink);
                        }
                    }
                });
            }
        }

        for disagreement in self.disagreements() {
            let item = &disagreement.item;
            let missing = disagreement.missing;
            let base: Vec<Marker> = if categorical {
                item.labels
                    .iter()
                    .map(|label| Marker::Compare {
                        missing,
                        label: label.clone(),
                        known: self.config.is_known_label(label),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            let has_link = link.map_or(false, |l| item.contains_span(l));
            let target = item.target();

            for span in &item.spans {
                let last = Some(span) == target;
                walk_span(doc, span, |key, gap| {
                    let entry = markings.entry(key).or_default();
                    entry.extend(base.iter().cloned());
                    if item.is_link() && (!gap || has_link) {
                        entry.push(Marker::CompareRef {
                            has_link,
                            missing,
                            last,
                        });
                    }
                });
            }
        }

        markings
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::Config;
    use crate::model::Scope;

    fn datum_with(text: &str, annotations: &str, config: &Config) -> (tempfile::TempDir, Datum) {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("doc.txt");
        let out = dir.path().join("doc.txt.annotations");
        fs::write(&raw, text).unwrap();
        fs::write(&out, annotations).unwrap();
        let datum = Datum::load(config, &raw, &out, &[]).unwrap();
        (dir, datum)
    }

    fn names(markings: &Markings, key: MarkKey) -> Vec<String> {
        markings
            .get(&key)
            .map(|markers| markers.iter().map(|m| m.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_cursor_and_labels() {
        let (_dir, datum) = datum_with("a b c\nd e\n", "(0, 1) - a\n(1, 0) - OTHER\n", &Config::default());
        let cursor = Span::at(Scope::Token, datum.doc(), Position::token(0, 0)).unwrap();
        let markings = datum.get_all_markings(&cursor, None);

        assert_eq!(names(&markings, MarkKey::Token { line: 0, token: 0 }), vec!["cursor"]);
        assert_eq!(names(&markings, MarkKey::Token { line: 0, token: 1 }), vec!["a"]);
        assert_eq!(
            names(&markings, MarkKey::Token { line: 1, token: 0 }),
            vec!["label:OTHER"]
        );
    }

    #[test]
    fn test_range_marks_gaps() {
        let (_dir, datum) = datum_with("a b c\nd e\n", "((0, 0), (0, 2)) - a\n", &Config::default());
        let cursor = Span::at(Scope::Token, datum.doc(), Position::token(1, 1)).unwrap();
        let markings = datum.get_all_markings(&cursor, None);

        for token in 0..3 {
            assert_eq!(names(&markings, MarkKey::Token { line: 0, token }), vec!["a"]);
        }
        assert_eq!(names(&markings, MarkKey::Gap { line: 0, token: 1 }), vec!["a"]);
        assert_eq!(names(&markings, MarkKey::Gap { line: 0, token: 2 }), vec!["a"]);
        assert!(names(&markings, MarkKey::Gap { line: 0, token: 0 }).is_empty());
    }

    #[test]
    fn test_link_markers() {
        let config = Config {
            annotation_type: AnnotationType::Link,
            ..Config::default()
        };
        let (_dir, datum) = datum_with("a b c\nd e\n", "[(1, 0), (0, 2)] - \n[(0, 1), (0, 1)] - \n", &config);
        let cursor = Span::at(Scope::Token, datum.doc(), Position::token(1, 0)).unwrap();
        let link = Span::at(Scope::Token, datum.doc(), Position::token(0, 2)).unwrap();
        let markings = datum.get_all_markings(&cursor, Some(&link));

        assert_eq!(
            names(&markings, MarkKey::Token { line: 0, token: 2 }),
            vec!["link", "linked", "ref"]
        );
        assert_eq!(
            names(&markings, MarkKey::Token { line: 1, token: 0 }),
            vec!["cursor", "linked", "ref"]
        );
        // Not connected to the current link
        assert_eq!(
            names(&markings, MarkKey::Token { line: 0, token: 1 }),
            vec!["linked", "linked"]
        );
    }

    #[test]
    fn test_link_range_marks_gaps() {
        let config = Config {
            annotation_type: AnnotationType::Link,
            ..Config::default()
        };
        let (_dir, datum) = datum_with("a b c\nd e\n", "", &config);
        let cursor = Span::at(Scope::Token, datum.doc(), Position::token(1, 1)).unwrap();
        let link = Span::between(
            Scope::Token,
            datum.doc(),
            Position::token(0, 0),
            Position::token(0, 1),
        )
        .unwrap();
        let markings = datum.get_all_markings(&cursor, Some(&link));

        assert_eq!(names(&markings, MarkKey::Gap { line: 0, token: 1 }), vec!["link"]);
        assert_eq!(names(&markings, MarkKey::Token { line: 0, token: 1 }), vec!["link"]);
        assert!(names(&markings, MarkKey::Gap { line: 0, token: 0 }).is_empty());
    }

    #[test]
    fn test_span_ending_on_blank_line_stops_there() {
        let config = Config {
            scope: Scope::Line,
            ..Config::default()
        };
        let (_dir, datum) = datum_with("a\n\nb\nc\n", "((0,), (1,)) - a\n", &config);
        let cursor = Span::at(Scope::Line, datum.doc(), Position::line(3)).unwrap();
        let markings = datum.get_all_markings(&cursor, None);

        assert_eq!(names(&markings, MarkKey::Line(0)), vec!["a"]);
        assert!(names(&markings, MarkKey::Line(2)).is_empty());
        assert_eq!(names(&markings, MarkKey::Line(3)), vec!["cursor"]);
    }

    #[test]
    fn test_comparison_markers() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("doc.txt");
        let other = dir.path().join("other.annotations");
        fs::write(&raw, "a b c").unwrap();
        fs::write(&other, "(0, 2) - a\n").unwrap();
        let datum = Datum::load(&Config::default(), &raw, dir.path().join("out"), &[other]).unwrap();

        let cursor = Span::at(Scope::Token, datum.doc(), Position::token(0, 0)).unwrap();
        let markings = datum.get_all_markings(&cursor, None);
        assert_eq!(
            names(&markings, MarkKey::Token { line: 0, token: 2 }),
            vec!["compare-0-a"]
        );
    }

    #[test]
    fn test_mark_key_order() {
        let mut keys = vec![
            MarkKey::Token { line: 1, token: 0 },
            MarkKey::Gap { line: 0, token: 2 },
            MarkKey::Token { line: 0, token: 2 },
            MarkKey::Token { line: 0, token: 1 },
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                MarkKey::Token { line: 0, token: 1 },
                MarkKey::Gap { line: 0, token: 2 },
                MarkKey::Token { line: 0, token: 2 },
                MarkKey::Token { line: 1, token: 0 },
            ]
        );
    }
}
