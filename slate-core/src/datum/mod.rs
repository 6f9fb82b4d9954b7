//! Annotation store for one document.

mod markings;
mod navigation;

pub use markings::{MarkKey, Marker, Markings};
pub use navigation::Mover;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info};

use crate::config::{AnnotationType, Config};
use crate::error::Result;
use crate::model::{Document, Item, Span};
use crate::standoff;

/// An item from the comparison files and how many of them lack it
#[derive(Debug, Clone, PartialEq)]
pub struct Disagreement {
    pub item: Item,
    pub missing: usize,
}

impl Disagreement {
    /// Some comparison file lacks this item
    pub fn is_disputed(&self) -> bool {
        self.missing > 0
    }
}

/// Storage for a single file's text and annotations, plus read-only
/// annotations of the same file from other annotators.
#[derive(Debug)]
pub struct Datum {
    pub filename: PathBuf,
    pub output_file: PathBuf,
    config: Config,
    doc: Rc<Document>,
    items: Vec<Item>,
    other_files: Vec<PathBuf>,
    other_annotations: Vec<Vec<Item>>,
    disagreements: Vec<Disagreement>,
}

impl Datum {
    /// Load the text, any existing output file, and the comparison files
    pub fn load(
        config: &Config,
        filename: impl Into<PathBuf>,
        output_file: impl Into<PathBuf>,
        other_files: &[PathBuf],
    ) -> Result<Self> {
        let filename = filename.into();
        let doc = Rc::new(Document::load(&filename)?);
        let mut datum = Self::from_document(config, doc, output_file, other_files)?;
        datum.filename = filename;
        Ok(datum)
    }

    pub fn from_document(
        config: &Config,
        doc: Rc<Document>,
        output_file: impl Into<PathBuf>,
        other_files: &[PathBuf],
    ) -> Result<Self> {
        let output_file = output_file.into();
        let items = standoff::read_annotation_file(
            &output_file,
            &doc,
            config.scope,
            config.annotation_type,
        )?;

        let other_annotations = other_files
            .iter()
            .map(|path| {
                standoff::read_annotation_file(path, &doc, config.scope, config.annotation_type)
            })
            .collect::<Result<Vec<_>>>()?;
        let disagreements = count_agreement(&other_annotations);
        info!(
            compared = other_annotations.len(),
            entries = disagreements.len(),
            "computed agreement"
        );

        Ok(Self {
            filename: doc.filepath.clone().map(PathBuf::from).unwrap_or_default(),
            output_file,
            config: config.clone(),
            doc,
            items,
            other_files: other_files.to_vec(),
            other_annotations,
            disagreements,
        })
    }

    pub fn doc(&self) -> &Rc<Document> {
        &self.doc
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn other_files(&self) -> &[PathBuf] {
        &self.other_files
    }

    pub fn other_annotations(&self) -> &[Vec<Item>] {
        &self.other_annotations
    }

    pub fn disagreements(&self) -> &[Disagreement] {
        &self.disagreements
    }

    fn matching_indices(&self, spans: &[Span], any_present: bool) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.has_spans(spans) || (any_present && item.shares_span(spans)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Items with exactly these spans, or with any of them when
    /// `any_present` is set
    pub fn get_item_with_spans(&self, spans: &[Span], any_present: bool) -> Vec<&Item> {
        self.matching_indices(spans, any_present)
            .into_iter()
            .map(|idx| &self.items[idx])
            .collect()
    }

    /// Toggle an annotation on these spans.
    ///
    /// With no item on exactly these spans one is created. Otherwise the
    /// label is toggled, and the item is dropped once it has no labels left.
    /// A `None` label removes an unlabelled item (a link) and leaves labelled
    /// ones alone. An empty span list changes nothing.
    pub fn modify_annotation(&mut self, spans: &[Span], label: Option<&str>) {
        if spans.is_empty() {
            return;
        }
        let matching = self.matching_indices(spans, false);
        if matching.is_empty() {
            debug!(spans = ?spans, label, "created item");
            self.items.push(Item::new(spans.to_vec(), label));
            return;
        }

        let mut emptied = Vec::new();
        for idx in matching {
            let item = &mut self.items[idx];
            match label {
                None => {
                    if item.labels.is_empty() {
                        emptied.push(idx);
                    }
                }
                Some(label) => {
                    if item.labels.remove(label) {
                        if item.labels.is_empty() {
                            emptied.push(idx);
                        }
                    } else {
                        item.labels.insert(label.to_string());
                    }
                }
            }
        }
        for idx in emptied.into_iter().rev() {
            debug!(item = %self.items[idx], "removed item");
            self.items.remove(idx);
        }
    }

    /// Delete every item on exactly these spans. In link mode any item
    /// touching one of the spans goes.
    pub fn remove_annotation(&mut self, spans: &[Span]) {
        if spans.is_empty() {
            return;
        }
        let permissive = self.config.annotation_type == AnnotationType::Link;
        for idx in self.matching_indices(spans, permissive).into_iter().rev() {
            debug!(item = %self.items[idx], "removed item");
            self.items.remove(idx);
        }
    }

    /// Rewrite the output file
    pub fn write_out(&self) -> Result<()> {
        self.write_to(&self.output_file)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        standoff::write_annotation_file(path, &self.items)
    }
}

/// Count, for every distinct item across the comparison files, how many
/// files lack it. Entries keep first-seen order.
fn count_agreement(other_annotations: &[Vec<Item>]) -> Vec<Disagreement> {
    let mut counted: Vec<(Item, usize)> = Vec::new();
    for annotations in other_annotations {
        let mut seen_here: Vec<&Item> = Vec::new();
        for item in annotations {
            if seen_here.contains(&item) {
                continue;
            }
            seen_here.push(item);
            match counted.iter_mut().find(|(known, _)| known == item) {
                Some((_, count)) => *count += 1,
                None => counted.push((item.clone(), 1)),
            }
        }
    }

    counted
        .into_iter()
        .map(|(item, count)| Disagreement {
            item,
            missing: other_annotations.len() - count,
        })
        .collect()
}
