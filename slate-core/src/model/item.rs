use std::collections::BTreeSet;

use super::Span;

/// One stored annotation: one or more spans and a set of labels.
///
/// A single span with labels is a categorical annotation; two spans and no
/// labels is a link from the first span to the second.
#[derive(Debug, Clone)]
pub struct Item {
    pub spans: Vec<Span>,
    pub labels: BTreeSet<String>,
}

impl Item {
    pub fn new(spans: Vec<Span>, label: Option<&str>) -> Self {
        Self {
            spans,
            labels: label.map(String::from).into_iter().collect(),
        }
    }

    pub fn with_labels(spans: Vec<Span>, labels: BTreeSet<String>) -> Self {
        Self { spans, labels }
    }

    pub fn is_link(&self) -> bool {
        self.spans.len() > 1
    }

    /// A link whose two ends are the same span
    pub fn is_self_link(&self) -> bool {
        self.spans.len() == 2 && self.spans[0] == self.spans[1]
    }

    /// All spans are the same position
    pub fn is_degenerate(&self) -> bool {
        match (self.spans.iter().min(), self.spans.iter().max()) {
            (Some(min), Some(max)) => min == max,
            _ => false,
        }
    }

    /// The latest span, which is what a link is attached to
    pub fn target(&self) -> Option<&Span> {
        self.spans.iter().max()
    }

    pub fn earliest(&self) -> Option<&Span> {
        self.spans.iter().min()
    }

    pub fn contains_span(&self, span: &Span) -> bool {
        self.spans.iter().any(|s| s == span)
    }

    /// Exactly the given spans, ignoring order
    pub fn has_spans(&self, spans: &[Span]) -> bool {
        let forward = self.spans.iter().filter(|s| spans.contains(s)).count();
        let backward = spans.iter().filter(|s| self.spans.contains(s)).count();
        self.spans.len() == spans.len() && forward == self.spans.len() && backward == spans.len()
    }

    /// Any of the given spans
    pub fn shares_span(&self, spans: &[Span]) -> bool {
        self.spans.iter().any(|s| spans.contains(s))
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans
            && self.labels == other.labels
            && self
                .spans
                .iter()
                .zip(&other.spans)
                .all(|(a, b)| a.same_document(b))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::model::{Document, Position, Scope};

    fn span(doc: &Rc<Document>, line: usize, token: usize) -> Span {
        Span::at(Scope::Token, doc, Position::token(line, token)).unwrap()
    }

    #[test]
    fn test_link_properties() {
        let doc = Rc::new(Document::new("a b c").unwrap());
        let link = Item::new(vec![span(&doc, 0, 2), span(&doc, 0, 0)], None);
        assert!(link.is_link());
        assert!(!link.is_self_link());
        assert!(link.labels.is_empty());
        assert_eq!(link.target(), Some(&span(&doc, 0, 2)));
        assert_eq!(link.earliest(), Some(&span(&doc, 0, 0)));

        let self_link = Item::new(vec![span(&doc, 0, 1), span(&doc, 0, 1)], None);
        assert!(self_link.is_self_link());
        assert!(self_link.is_degenerate());
    }

    #[test]
    fn test_has_spans_ignores_order() {
        let doc = Rc::new(Document::new("a b c").unwrap());
        let item = Item::new(vec![span(&doc, 0, 0), span(&doc, 0, 1)], None);
        assert!(item.has_spans(&[span(&doc, 0, 1), span(&doc, 0, 0)]));
        assert!(!item.has_spans(&[span(&doc, 0, 1)]));
        assert!(item.shares_span(&[span(&doc, 0, 1)]));
        assert!(!item.shares_span(&[span(&doc, 0, 2)]));
    }

    #[test]
    fn test_equality_requires_same_document() {
        let doc = Rc::new(Document::new("a b c").unwrap());
        let other_doc = Rc::new(Document::new("a b c").unwrap());
        let a = Item::new(vec![span(&doc, 0, 0)], Some("BUY"));
        let b = Item::new(vec![span(&doc, 0, 0)], Some("BUY"));
        let c = Item::new(vec![span(&other_doc, 0, 0)], Some("BUY"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
