//! The annotation controller: a file list, the open file, and the cursor and
//! link spans, driven one [`Command`] at a time.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{AnnotationType, Config};
use crate::datum::{Datum, Markings, Mover};
use crate::error::Result;
use crate::manifest::{self, ManifestEntry};
use crate::model::{Change, Direction, Scope, SearchDirection, Span};

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move {
        direction: Direction,
        distance: usize,
        jump: bool,
        mover: Mover,
    },
    Adjust {
        direction: Direction,
        change: Change,
        distance: usize,
        jump: bool,
        mover: Mover,
    },
    /// Find the query, or with no query the next disagreement (when
    /// comparing), unannotated span or self-link
    Search {
        query: Option<String>,
        direction: SearchDirection,
        count: usize,
        jump: bool,
        mover: Mover,
    },
    /// Toggle a label on the cursor span
    Label(String),
    /// Toggle a free-text label on the cursor span
    AssignText(String),
    Remove,
    CreateLink { and_move: bool },
    NextFile,
    PreviousFile,
    Save,
    Quit { save: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Where the session is in its file list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    BeforeFirst,
    File(usize),
    AfterLast,
}

/// The open file and the spans on it
#[derive(Debug)]
pub struct FileView {
    pub datum: Datum,
    pub cursor: Span,
    pub link: Option<Span>,
}

impl FileView {
    fn span(&self, mover: Mover) -> &Span {
        match (mover, &self.link) {
            (Mover::Link, Some(link)) => link,
            _ => &self.cursor,
        }
    }

    fn set_span(&mut self, mover: Mover, span: Span) {
        match mover {
            Mover::Link if self.link.is_some() => self.link = Some(span),
            _ => self.cursor = span,
        }
    }
}

pub struct Session {
    config: Config,
    entries: Vec<ManifestEntry>,
    place: Place,
    view: Option<FileView>,
    steps: usize,
}

impl Session {
    /// Start on the first file of the list
    pub fn new(config: Config, entries: Vec<ManifestEntry>) -> Result<Self> {
        let mut session = Self {
            config,
            entries,
            place: Place::BeforeFirst,
            view: None,
            steps: 0,
        };
        session.shift_file(1)?;
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn place(&self) -> Place {
        self.place
    }

    pub fn view(&self) -> Option<&FileView> {
        self.view.as_ref()
    }

    pub fn datum(&self) -> Option<&Datum> {
        self.view.as_ref().map(|view| &view.datum)
    }

    pub fn cursor(&self) -> Option<&Span> {
        self.view.as_ref().map(|view| &view.cursor)
    }

    pub fn link(&self) -> Option<&Span> {
        self.view.as_ref().and_then(|view| view.link.as_ref())
    }

    /// Rendering hints for the open file
    pub fn markings(&self) -> Option<Markings> {
        self.view
            .as_ref()
            .map(|view| view.datum.get_all_markings(&view.cursor, view.link.as_ref()))
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, place = ?self.place, "apply");
        self.steps += 1;
        if self.config.annotation_type == AnnotationType::Categorical
            && self.config.save_interval > 0
            && self.steps % self.config.save_interval == 0
        {
            self.write_annotations()?;
        }

        match command {
            Command::Move {
                direction,
                distance,
                jump,
                mover,
            } => self.move_span(direction, distance, jump, mover),
            Command::Adjust {
                direction,
                change,
                distance,
                jump,
                mover,
            } => {
                if let Some(view) = &self.view {
                    let changed = view.span(mover).edited(direction, change, distance, jump);
                    self.try_place(mover, changed);
                }
            }
            Command::Search {
                query,
                direction,
                count,
                jump,
                mover,
            } => self.search(query.as_deref(), direction, count, jump, mover),
            Command::Label(label) => {
                if self.config.annotation_type == AnnotationType::Categorical {
                    self.toggle_on_cursor(&label);
                }
            }
            Command::AssignText(text) => {
                let text = text.trim();
                if self.config.annotation_type == AnnotationType::Text && !text.is_empty() {
                    self.toggle_on_cursor(text);
                }
            }
            Command::Remove => {
                if let Some(view) = self.view.as_mut().filter(|_| !self.config.readonly) {
                    let span = view.link.clone().unwrap_or_else(|| view.cursor.clone());
                    view.datum.remove_annotation(&[span]);
                }
            }
            Command::CreateLink { and_move } => self.create_link(and_move),
            Command::NextFile => self.shift_file(1)?,
            Command::PreviousFile => self.shift_file(-1)?,
            Command::Save => self.save()?,
            Command::Quit { save } => {
                if save {
                    self.save()?;
                }
                return Ok(Outcome::Quit);
            }
        }
        Ok(Outcome::Continue)
    }

    /// Write the annotations and remember where annotation stopped
    pub fn save(&mut self) -> Result<()> {
        self.write_annotations()?;
        if let (Place::File(idx), Some(view)) = (self.place, &self.view) {
            let resume = view.link.as_ref().unwrap_or(&view.cursor);
            self.entries[idx].start = Some(resume.to_spec());
        }
        Ok(())
    }

    /// Write a file list that picks up from the current positions
    pub fn write_progress(&self, path: &Path) -> Result<()> {
        manifest::write_progress(path, &self.entries, self.config.scope)
    }

    fn write_annotations(&self) -> Result<()> {
        match &self.view {
            Some(view) if !self.config.readonly => view.datum.write_out(),
            _ => Ok(()),
        }
    }

    fn shift_file(&mut self, step: i64) -> Result<()> {
        if self.view.is_some() {
            self.save()?;
        }

        let target = match (self.place, step > 0) {
            (Place::BeforeFirst, true) => 0,
            (Place::AfterLast, false) => self.entries.len() as i64 - 1,
            (Place::File(idx), _) => idx as i64 + step,
            _ => return Ok(()),
        };
        if target < 0 {
            self.place = Place::BeforeFirst;
            self.view = None;
        } else if target as usize >= self.entries.len() {
            self.place = Place::AfterLast;
            self.view = None;
        } else {
            let idx = target as usize;
            self.view = Some(self.open(idx)?);
            self.place = Place::File(idx);
        }
        info!(place = ?self.place, "changed file");
        Ok(())
    }

    fn open(&self, idx: usize) -> Result<FileView> {
        let entry = &self.entries[idx];
        let datum = Datum::load(
            &self.config,
            &entry.raw_file,
            &entry.output_file,
            &entry.comparison_files,
        )?;
        let scope = self.config.scope;
        let start = match &entry.start {
            Some(spec) => Span::from_spec(scope, datum.doc(), spec)?,
            None => Span::new(scope, datum.doc()),
        };

        let link = match self.config.annotation_type {
            AnnotationType::Link if self.config.prevent_self_links => {
                Some(start.stepped(SearchDirection::Next))
            }
            AnnotationType::Link => Some(start.clone()),
            _ => None,
        };
        Ok(FileView {
            datum,
            cursor: start,
            link,
        })
    }

    fn is_move_allowed(&self, view: &FileView, mover: Mover, new_span: &Span) -> bool {
        let Some(link) = &view.link else {
            return true;
        };
        let moving_link = mover == Mover::Link;
        if self.config.prevent_forward_links {
            if moving_link && view.cursor > *new_span {
                return false;
            }
            if !moving_link && link < new_span {
                return false;
            }
        }
        if self.config.prevent_self_links {
            if moving_link && view.cursor == *new_span {
                return false;
            }
            if !moving_link && link == new_span {
                return false;
            }
        }
        true
    }

    /// Put the span in place if the link constraints allow it
    fn try_place(&mut self, mover: Mover, span: Span) -> bool {
        let Some(view) = &self.view else {
            return false;
        };
        if !self.is_move_allowed(view, mover, &span) {
            debug!(?mover, %span, "move rejected");
            return false;
        }
        if let Some(view) = self.view.as_mut() {
            view.set_span(mover, span);
        }
        true
    }

    fn move_span(&mut self, direction: Direction, distance: usize, jump: bool, mover: Mover) {
        let Some(view) = &self.view else {
            return;
        };
        let moved = view.span(mover).edited(direction, Change::Move, distance, jump);
        if self.try_place(mover, moved) {
            return;
        }

        // Go as far as the constraints allow
        let prevent_self_links = self.config.prevent_self_links;
        if let Some(view) = self.view.as_mut() {
            let Some(link) = view.link.clone() else {
                return;
            };
            match (mover, prevent_self_links) {
                (Mover::Link, true) => view.link = Some(view.cursor.stepped(SearchDirection::Next)),
                (Mover::Link, false) => view.link = Some(view.cursor.clone()),
                (Mover::Cursor, true) => view.cursor = link.stepped(SearchDirection::Previous),
                (Mover::Cursor, false) => view.cursor = link,
            }
        }
    }

    fn search(
        &mut self,
        query: Option<&str>,
        direction: SearchDirection,
        count: usize,
        jump: bool,
        mover: Mover,
    ) {
        let Some(view) = &self.view else {
            return;
        };
        let origin = view.span(mover);
        let found = match query.filter(|q| !q.is_empty()) {
            Some(query) => Some(origin.search(query, direction, count, jump)),
            None => {
                let datum = &view.datum;
                let link = view.link.as_ref();
                if datum.disagreements().is_empty() {
                    let unannotated = datum.get_next_unannotated(&view.cursor, link, direction, mover);
                    if unannotated == *origin {
                        Some(datum.get_next_self_link(&view.cursor, link, direction, mover))
                    } else {
                        Some(unannotated)
                    }
                } else {
                    datum.get_next_disagreement(&view.cursor, link, direction, mover, true)
                }
            }
        };
        if let Some(found) = found {
            self.try_place(mover, found);
        }
    }

    fn toggle_on_cursor(&mut self, label: &str) {
        if self.config.readonly {
            return;
        }
        if let Some(view) = self.view.as_mut() {
            let cursor = view.cursor.clone();
            view.datum.modify_annotation(&[cursor], Some(label));
        }
    }

    fn create_link(&mut self, and_move: bool) {
        if self.config.readonly {
            return;
        }
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let Some(link) = view.link.clone() else {
            warn!("no link span to connect");
            return;
        };
        let cursor = view.cursor.clone();
        view.datum.modify_annotation(&[cursor, link], None);

        if and_move {
            let direction = match self.config.scope {
                Scope::Line => Direction::Down,
                _ => Direction::Right,
            };
            self.move_span(direction, 1, false, Mover::Link);
            if let Some(view) = self.view.as_mut() {
                if let Some(link) = &view.link {
                    view.cursor = link.stepped(SearchDirection::Previous);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::model::Position;

    struct Fixture {
        dir: tempfile::TempDir,
        entries: Vec<ManifestEntry>,
    }

    fn fixture(texts: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let entries = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let raw = dir.path().join(format!("doc{}.txt", idx));
                fs::write(&raw, text).unwrap();
                ManifestEntry::new(raw)
            })
            .collect();
        Fixture { dir, entries }
    }

    fn right(mover: Mover) -> Command {
        Command::Move {
            direction: Direction::Right,
            distance: 1,
            jump: false,
            mover,
        }
    }

    fn link_config() -> Config {
        Config {
            annotation_type: AnnotationType::Link,
            ..Config::default()
        }
    }

    #[test]
    fn test_label_and_save() {
        let fx = fixture(&["a b c\nd e\n"]);
        let output = fx.entries[0].output_file.clone();
        let mut session = Session::new(Config::default(), fx.entries.clone()).unwrap();

        session.apply(Command::Label("BUY".to_string())).unwrap();
        assert_eq!(session.apply(Command::Quit { save: true }).unwrap(), Outcome::Quit);
        assert_eq!(fs::read_to_string(output).unwrap(), "(0, 0) - BUY\n");
        assert_eq!(session.entries()[0].start, Some(crate::model::SpanSpec::Point(vec![0, 0])));
    }

    #[test]
    fn test_readonly_never_writes() {
        let fx = fixture(&["a b c"]);
        let output = fx.entries[0].output_file.clone();
        let config = Config {
            readonly: true,
            ..Config::default()
        };
        let mut session = Session::new(config, fx.entries.clone()).unwrap();
        session.apply(Command::Label("a".to_string())).unwrap();
        session.apply(Command::Save).unwrap();
        assert!(session.datum().unwrap().items().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_file_switching() {
        let fx = fixture(&["a b", "c d"]);
        let mut session = Session::new(Config::default(), fx.entries.clone()).unwrap();
        assert_eq!(session.place(), Place::File(0));

        session.apply(right(Mover::Cursor)).unwrap();
        session.apply(Command::NextFile).unwrap();
        assert_eq!(session.place(), Place::File(1));
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 0));
        assert_eq!(session.entries()[0].start, Some(crate::model::SpanSpec::Point(vec![0, 1])));

        session.apply(Command::NextFile).unwrap();
        assert_eq!(session.place(), Place::AfterLast);
        assert!(session.view().is_none());
        // Commands without a file do nothing
        session.apply(right(Mover::Cursor)).unwrap();

        session.apply(Command::PreviousFile).unwrap();
        assert_eq!(session.place(), Place::File(1));
        session.apply(Command::PreviousFile).unwrap();
        assert_eq!(session.place(), Place::File(0));
        // Resumes where the cursor was left
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 1));
    }

    #[test]
    fn test_autosave_interval() {
        let fx = fixture(&["a b c"]);
        let output = fx.entries[0].output_file.clone();
        let config = Config {
            save_interval: 2,
            ..Config::default()
        };
        let mut session = Session::new(config, fx.entries.clone()).unwrap();
        session.apply(Command::Label("a".to_string())).unwrap();
        assert!(!output.exists());
        session.apply(right(Mover::Cursor)).unwrap();
        assert_eq!(fs::read_to_string(output).unwrap(), "(0, 0) - a\n");
    }

    #[test]
    fn test_create_link_and_move() {
        let fx = fixture(&["a b c d"]);
        let output = fx.entries[0].output_file.clone();
        let mut session = Session::new(link_config(), fx.entries.clone()).unwrap();

        session.apply(right(Mover::Link)).unwrap();
        assert_eq!(session.link().unwrap().start(), Position::token(0, 1));
        session.apply(Command::CreateLink { and_move: true }).unwrap();
        assert_eq!(session.link().unwrap().start(), Position::token(0, 2));
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 1));

        session.apply(Command::Save).unwrap();
        assert_eq!(fs::read_to_string(output).unwrap(), "[(0, 0), (0, 1)] - \n");
        assert_eq!(session.entries()[0].start, Some(crate::model::SpanSpec::Point(vec![0, 2])));
    }

    #[test]
    fn test_prevent_self_links() {
        let fx = fixture(&["a b c d"]);
        let config = Config {
            prevent_self_links: true,
            ..link_config()
        };
        let mut session = Session::new(config, fx.entries.clone()).unwrap();
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 0));
        assert_eq!(session.link().unwrap().start(), Position::token(0, 1));

        // Moving the cursor onto the link stops beside it
        session.apply(right(Mover::Cursor)).unwrap();
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 0));
    }

    #[test]
    fn test_prevent_forward_links() {
        let fx = fixture(&["a b c d"]);
        let config = Config {
            prevent_forward_links: true,
            ..link_config()
        };
        let mut session = Session::new(config, fx.entries.clone()).unwrap();
        session.apply(right(Mover::Link)).unwrap();
        session.apply(right(Mover::Link)).unwrap();
        session.apply(right(Mover::Cursor)).unwrap();
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 1));

        // The cursor may not pass the link
        for _ in 0..3 {
            session.apply(right(Mover::Cursor)).unwrap();
        }
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 2));
    }

    #[test]
    fn test_search_and_unannotated() {
        let fx = fixture(&["a b a c"]);
        let mut session = Session::new(Config::default(), fx.entries.clone()).unwrap();
        session
            .apply(Command::Search {
                query: Some("a".to_string()),
                direction: SearchDirection::Next,
                count: 1,
                jump: false,
                mover: Mover::Cursor,
            })
            .unwrap();
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 2));

        session.apply(Command::Label("a".to_string())).unwrap();
        session
            .apply(Command::Search {
                query: None,
                direction: SearchDirection::Previous,
                count: 1,
                jump: false,
                mover: Mover::Cursor,
            })
            .unwrap();
        assert_eq!(session.cursor().unwrap().start(), Position::token(0, 1));
    }

    #[test]
    fn test_text_labels() {
        let fx = fixture(&["a b"]);
        let config = Config {
            annotation_type: AnnotationType::Text,
            ..Config::default()
        };
        let mut session = Session::new(config, fx.entries.clone()).unwrap();
        session.apply(Command::AssignText("  a note ".to_string())).unwrap();
        session.apply(Command::Label("a".to_string())).unwrap();
        let items = session.datum().unwrap().items();
        assert_eq!(items.len(), 1);
        assert!(items[0].labels.contains("a note"));
    }

    #[test]
    fn test_write_progress_resumes() {
        let fx = fixture(&["a b c", "d e"]);
        let mut session = Session::new(Config::default(), fx.entries.clone()).unwrap();
        session.apply(right(Mover::Cursor)).unwrap();
        session.apply(Command::Save).unwrap();

        let todo: PathBuf = fx.dir.path().join("run.todo");
        session.write_progress(&todo).unwrap();
        let lines = manifest::read_file_list(&todo).unwrap();
        assert_eq!(lines.len(), 2);
        let resumed = ManifestEntry::parse(&lines[0]).unwrap().unwrap();
        assert_eq!(resumed.start, Some(crate::model::SpanSpec::Point(vec![0, 1])));
    }
}
