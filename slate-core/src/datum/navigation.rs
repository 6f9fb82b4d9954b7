use super::Datum;
use crate::model::{SearchDirection, Span};

/// Which span a movement command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mover {
    #[default]
    Cursor,
    Link,
}

/// Tracks the closest span in one direction plus the overall extremes
struct Nearest<'a> {
    direction: SearchDirection,
    best: Option<&'a Span>,
    first: Option<&'a Span>,
    last: Option<&'a Span>,
}

impl<'a> Nearest<'a> {
    fn new(direction: SearchDirection) -> Self {
        Self {
            direction,
            best: None,
            first: None,
            last: None,
        }
    }

    fn offer(&mut self, span: &'a Span, reference: &Span) {
        if self.first.map_or(true, |first| span < first) {
            self.first = Some(span);
        }
        if self.last.map_or(true, |last| span > last) {
            self.last = Some(span);
        }
        match self.direction {
            SearchDirection::Next if span > reference => {
                if self.best.map_or(true, |best| span < best) {
                    self.best = Some(span);
                }
            }
            SearchDirection::Previous if span < reference => {
                if self.best.map_or(true, |best| span > best) {
                    self.best = Some(span);
                }
            }
            _ => {}
        }
    }

    fn finish(self, cycle: bool) -> Option<Span> {
        let wrapped = match self.direction {
            SearchDirection::Next => self.first,
            SearchDirection::Previous => self.last,
        };
        self.best
            .or(if cycle { wrapped } else { None })
            .cloned()
    }
}

impl Datum {
    /// The span the mover would walk from, or `None` when a cursor move is
    /// requested while linking and so has nothing to search for.
    fn walk_origin<'a>(cursor: &'a Span, link: Option<&'a Span>, mover: Mover) -> Option<&'a Span> {
        match (mover, link) {
            (Mover::Link, Some(link)) => Some(link),
            (Mover::Cursor, Some(_)) => None,
            (_, None) => Some(cursor),
        }
    }

    /// The nearest span in `direction` that is not the target of any stored
    /// item. Stays put when every remaining span is annotated.
    pub fn get_next_unannotated(
        &self,
        cursor: &Span,
        link: Option<&Span>,
        direction: SearchDirection,
        mover: Mover,
    ) -> Span {
        let Some(origin) = Self::walk_origin(cursor, link, mover) else {
            return cursor.clone();
        };
        let annotated: Vec<&Span> = self.items.iter().filter_map(|item| item.target()).collect();
        let covered = |span: &Span| annotated.iter().any(|a| *a == span);

        let mut position = origin.stepped(direction);
        loop {
            if !covered(&position) {
                return position;
            }
            let next = position.stepped(direction);
            if next == position {
                return origin.clone();
            }
            position = next;
        }
    }

    /// The nearest span in `direction` carrying a self-link
    pub fn get_next_self_link(
        &self,
        cursor: &Span,
        link: Option<&Span>,
        direction: SearchDirection,
        mover: Mover,
    ) -> Span {
        let Some(origin) = Self::walk_origin(cursor, link, mover) else {
            return cursor.clone();
        };
        let self_links: Vec<&Span> = self
            .items
            .iter()
            .filter(|item| item.is_link() && item.is_degenerate())
            .filter_map(|item| item.earliest())
            .collect();
        if self_links.is_empty() {
            return origin.clone();
        }

        let mut position = origin.stepped(direction);
        let mut previous = origin.clone();
        while position != previous {
            if self_links.iter().any(|s| *s == &position) {
                return position;
            }
            previous = position;
            position = previous.stepped(direction);
        }
        origin.clone()
    }

    /// The nearest comparison disagreement in `direction`.
    ///
    /// Moving the link visits the target of each disputed item. Moving the
    /// cursor while linking visits the earlier spans of comparison items
    /// that include the link. Otherwise any span of a disputed item counts.
    /// With `cycle`, running off the end wraps to the first (or last) one.
    pub fn get_next_disagreement(
        &self,
        cursor: &Span,
        link: Option<&Span>,
        direction: SearchDirection,
        mover: Mover,
        cycle: bool,
    ) -> Option<Span> {
        let mut nearest = Nearest::new(direction);
        for disagreement in &self.disagreements {
            let item = &disagreement.item;
            match (mover, link) {
                (Mover::Link, Some(link)) => {
                    if !disagreement.is_disputed() {
                        continue;
                    }
                    if let Some(target) = item.target() {
                        nearest.offer(target, link);
                    }
                }
                (Mover::Cursor, Some(link)) => {
                    if !item.contains_span(link) {
                        continue;
                    }
                    for span in item.spans.iter().filter(|span| *span <= link) {
                        nearest.offer(span, cursor);
                    }
                }
                (_, None) => {
                    if !disagreement.is_disputed() {
                        continue;
                    }
                    for span in &item.spans {
                        nearest.offer(span, cursor);
                    }
                }
            }
        }
        nearest.finish(cycle)
    }
}
