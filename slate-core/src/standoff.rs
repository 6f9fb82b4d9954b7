//! Standoff annotation files.
//!
//! One item per line, `<spans> - <labels>`. Spans use tuple syntax: a bare
//! line number or `(4, 2)` for a single point, `((4, 2), (4, 5))` for a
//! range, and a bracketed list such as `[(4, 2), (4, 1)]` for links. Links
//! between lines may also be written as space-separated line numbers.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::rc::Rc;
use std::str::Chars;

use tracing::info;

use crate::config::AnnotationType;
use crate::error::{Result, SlateError};
use crate::model::{Document, Item, Scope, Span, SpanSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Int(usize),
    Tuple(Vec<Literal>),
    List(Vec<Literal>),
}

struct LiteralParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn parse_complete(mut self) -> std::result::Result<Literal, String> {
        let value = self.parse_value()?;
        self.skip_whitespace();
        match self.chars.next() {
            None => Ok(value),
            Some(c) => Err(format!("unexpected '{}' after spans", c)),
        }
    }

    fn parse_value(&mut self) -> std::result::Result<Literal, String> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('(') => {
                self.chars.next();
                let (items, trailing_comma) = self.parse_sequence(')')?;
                // `(4)` is just 4, `(4,)` is a one-element tuple
                if items.len() == 1 && !trailing_comma {
                    Ok(items.into_iter().next().unwrap_or(Literal::Tuple(Vec::new())))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            Some('[') => {
                self.chars.next();
                let (items, _) = self.parse_sequence(']')?;
                Ok(Literal::List(items))
            }
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = self.chars.next_if(|c| c.is_ascii_digit()) {
                    digits.push(d);
                }
                digits
                    .parse()
                    .map(Literal::Int)
                    .map_err(|e| format!("bad number {}: {}", digits, e))
            }
            Some(c) => Err(format!("unexpected '{}'", c)),
            None => Err("unexpected end of spans".to_string()),
        }
    }

    /// Comma-separated values up to `close`; also reports a trailing comma
    fn parse_sequence(&mut self, close: char) -> std::result::Result<(Vec<Literal>, bool), String> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.chars.next_if_eq(&close).is_some() {
                return Ok((items, trailing_comma));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => trailing_comma = true,
                Some(c) if c == close => return Ok((items, false)),
                Some(c) => return Err(format!("expected ',' or '{}', found '{}'", close, c)),
                None => return Err(format!("missing '{}'", close)),
            }
        }
    }
}

fn ints(items: &[Literal]) -> Option<Vec<usize>> {
    items
        .iter()
        .map(|item| match item {
            Literal::Int(n) => Some(*n),
            _ => None,
        })
        .collect()
}

fn tuple_spec(items: &[Literal]) -> std::result::Result<SpanSpec, String> {
    if let Some(parts) = ints(items) {
        return Ok(SpanSpec::Point(parts));
    }
    match items {
        [Literal::Tuple(start), Literal::Tuple(end)] => match (ints(start), ints(end)) {
            (Some(start), Some(end)) => Ok(SpanSpec::Range(start, end)),
            _ => Err("span ends must be tuples of integers".to_string()),
        },
        _ => Err("a span is a position or a pair of positions".to_string()),
    }
}

/// Parse the span side of a standoff line
pub fn parse_spans(text: &str) -> std::result::Result<Vec<SpanSpec>, String> {
    let text = text.trim();
    if !text.starts_with(['(', '[']) {
        if text.is_empty() {
            return Err("missing spans".to_string());
        }
        return text
            .split_whitespace()
            .map(|word| {
                word.parse::<usize>()
                    .map(|n| SpanSpec::Point(vec![n]))
                    .map_err(|_| format!("expected a line number, found '{}'", word))
            })
            .collect();
    }

    match LiteralParser::new(text).parse_complete()? {
        Literal::Int(n) => Ok(vec![SpanSpec::Point(vec![n])]),
        Literal::Tuple(items) => Ok(vec![tuple_spec(&items)?]),
        Literal::List(items) if items.is_empty() => Ok(vec![SpanSpec::Point(Vec::new())]),
        Literal::List(items) => items
            .iter()
            .map(|item| match item {
                Literal::Int(n) => Ok(SpanSpec::Point(vec![*n])),
                Literal::Tuple(parts) => tuple_spec(parts),
                Literal::List(_) => Err("nested lists are not spans".to_string()),
            })
            .collect(),
    }
}

/// Parse exactly one span, as used for start positions
pub fn parse_span(text: &str) -> std::result::Result<SpanSpec, String> {
    let mut specs = parse_spans(text)?;
    match specs.len() {
        1 => Ok(specs.remove(0)),
        n => Err(format!("expected one span, found {}", n)),
    }
}

/// Parse the label side of a standoff line
pub fn parse_labels(text: &str, annotation_type: AnnotationType) -> std::result::Result<BTreeSet<String>, String> {
    let labels: BTreeSet<String> = text.split_whitespace().map(String::from).collect();
    if annotation_type == AnnotationType::Link && !labels.is_empty() {
        return Err(format!("links carry no labels, found '{}'", text.trim()));
    }
    Ok(labels)
}

/// Parse one standoff line into an item
pub fn parse_item(
    line: &str,
    doc: &Rc<Document>,
    scope: Scope,
    annotation_type: AnnotationType,
) -> std::result::Result<Item, String> {
    let (span_text, label_text) = line
        .split_once('-')
        .ok_or_else(|| "missing ' - ' separator".to_string())?;
    let spans = parse_spans(span_text)?
        .iter()
        .map(|spec| Span::from_spec(scope, doc, spec).map_err(|e| e.to_string()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let labels = parse_labels(label_text, annotation_type)?;
    Ok(Item::with_labels(spans, labels))
}

/// Read an annotation file. A file that does not exist yet holds no items.
pub fn read_annotation_file(
    path: &Path,
    doc: &Rc<Document>,
    scope: Scope,
    annotation_type: AnnotationType,
) -> Result<Vec<Item>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| SlateError::io(path, e))?;
    let mut items = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item = parse_item(line, doc, scope, annotation_type)
            .map_err(|message| SlateError::syntax(path.display().to_string(), idx + 1, message))?;
        items.push(item);
    }
    info!(path = %path.display(), items = items.len(), "read annotations");
    Ok(items)
}

/// Replace the file with one line per item
pub fn write_annotation_file(path: &Path, items: &[Item]) -> Result<()> {
    let mut out = String::new();
    for item in items {
        out.push_str(&item.to_string());
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| SlateError::io(path, e))?;
    info!(path = %path.display(), items = items.len(), "wrote annotations");
    Ok(())
}

fn format_spans(spans: &[Span]) -> String {
    if let [span] = spans {
        if !span.is_point() {
            return span.to_string();
        }
        return match span.start().as_slice() {
            [line] => line.to_string(),
            _ => span.start().to_string(),
        };
    }

    if spans.iter().all(Span::is_point) {
        let lines: Option<Vec<String>> = spans
            .iter()
            .map(|s| match s.start().as_slice() {
                [line] => Some(line.to_string()),
                _ => None,
            })
            .collect();
        if let Some(lines) = lines {
            return lines.join(" ");
        }
        let starts: Vec<String> = spans.iter().map(|s| s.start().to_string()).collect();
        return format!("[{}]", starts.join(", "));
    }

    let all: Vec<String> = spans.iter().map(|s| s.to_string()).collect();
    format!("[{}]", all.join(", "))
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.labels.iter().map(|l| l.as_str()).collect();
        write!(f, "{} - {}", format_spans(&self.spans), labels.join(" "))
    }
}
