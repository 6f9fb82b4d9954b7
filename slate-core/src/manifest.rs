//! File lists: which files to annotate, where the annotations go, where to
//! start, and which other annotations to compare against.
//!
//! Each line reads `raw_file [output_file [start_position [comparison_file]*]]`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{FileListReport, Result, SlateError};
use crate::model::{Scope, SpanSpec};
use crate::standoff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub raw_file: PathBuf,
    pub output_file: PathBuf,
    pub start: Option<SpanSpec>,
    pub comparison_files: Vec<PathBuf>,
}

impl ManifestEntry {
    pub fn new(raw_file: impl Into<PathBuf>) -> Self {
        let raw_file = raw_file.into();
        let mut output_file = raw_file.clone().into_os_string();
        output_file.push(".annotations");
        Self {
            raw_file,
            output_file: output_file.into(),
            start: None,
            comparison_files: Vec::new(),
        }
    }

    /// Parse one line. Blank lines hold no entry.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(raw_file) = words.next() else {
            return Ok(None);
        };
        let mut entry = ManifestEntry::new(raw_file);
        if let Some(output_file) = words.next() {
            entry.output_file = output_file.into();
        }

        // The start position may contain spaces, so take words until the
        // parentheses balance
        if let Some(first) = words.next() {
            let mut text = first.to_string();
            let mut depth = paren_depth(first);
            while depth > 0 {
                let word = words
                    .next()
                    .ok_or_else(|| format!("unbalanced start position '{}'", text))?;
                depth += paren_depth(word);
                text.push(' ');
                text.push_str(word);
            }
            entry.start = Some(standoff::parse_span(&text)?);
        }

        entry.comparison_files = words.map(PathBuf::from).collect();
        Ok(Some(entry))
    }

    /// The entry as a file-list line. A missing start position is written as
    /// the top of the document when later fields need a placeholder.
    pub fn to_line(&self, scope: Scope) -> String {
        let mut parts = vec![
            self.raw_file.display().to_string(),
            self.output_file.display().to_string(),
        ];
        match &self.start {
            Some(start) => parts.push(start.to_string()),
            None if !self.comparison_files.is_empty() => {
                parts.push(SpanSpec::Point(vec![0; scope.arity()]).to_string())
            }
            None => {}
        }
        parts.extend(self.comparison_files.iter().map(|p| p.display().to_string()));
        parts.join(" ")
    }
}

fn paren_depth(word: &str) -> i64 {
    word.chars()
        .map(|c| match c {
            '(' => 1,
            ')' => -1,
            _ => 0,
        })
        .sum()
}

/// Parse a file list and check it against the file system.
///
/// Every missing input and every output that already exists (unless
/// overwriting) is collected into a single error.
pub fn process_file_list<S: AsRef<str>>(lines: &[S], config: &Config) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let entry = ManifestEntry::parse(line.as_ref())
            .map_err(|message| SlateError::syntax("file list", idx + 1, message))?;
        entries.extend(entry);
    }

    let mut report = FileListReport::default();
    for entry in &entries {
        if !entry.raw_file.exists() {
            report.missing.push(entry.raw_file.display().to_string());
        }
        if !config.overwrite && entry.output_file.exists() {
            report
                .existing_outputs
                .push(entry.output_file.display().to_string());
        }
        for other in &entry.comparison_files {
            if !other.exists() {
                report.missing.push(other.display().to_string());
            }
        }
    }
    if !report.is_empty() {
        warn!(
            missing = report.missing.len(),
            existing = report.existing_outputs.len(),
            "file list has errors"
        );
        return Err(SlateError::FileList(report));
    }

    info!(files = entries.len(), "processed file list");
    Ok(entries)
}

/// Lines of a file-list file
pub fn read_file_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| SlateError::io(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Write a file list that resumes where annotation stopped
pub fn write_progress(path: &Path, entries: &[ManifestEntry], scope: Scope) -> Result<()> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_line(scope));
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| SlateError::io(path, e))?;
    info!(path = %path.display(), files = entries.len(), "wrote progress");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let entry = ManifestEntry::parse("notes.txt").unwrap().unwrap();
        assert_eq!(entry.raw_file, PathBuf::from("notes.txt"));
        assert_eq!(entry.output_file, PathBuf::from("notes.txt.annotations"));
        assert_eq!(entry.start, None);
        assert!(entry.comparison_files.is_empty());

        assert_eq!(ManifestEntry::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_start_with_spaces() {
        let entry = ManifestEntry::parse("a.txt a.out ((0, 1), (0, 3)) b.ann c.ann")
            .unwrap()
            .unwrap();
        assert_eq!(entry.output_file, PathBuf::from("a.out"));
        assert_eq!(entry.start, Some(SpanSpec::Range(vec![0, 1], vec![0, 3])));
        assert_eq!(
            entry.comparison_files,
            vec![PathBuf::from("b.ann"), PathBuf::from("c.ann")]
        );

        let line_start = ManifestEntry::parse("a.txt a.out 4").unwrap().unwrap();
        assert_eq!(line_start.start, Some(SpanSpec::Point(vec![4])));
    }

    #[test]
    fn test_parse_unbalanced_start() {
        assert!(ManifestEntry::parse("a.txt a.out ((0, 1),").is_err());
        assert!(ManifestEntry::parse("a.txt a.out (0, x)").is_err());
    }

    #[test]
    fn test_to_line_round_trip() {
        let entry = ManifestEntry::parse("a.txt a.out ((0, 1), (0, 3)) b.ann")
            .unwrap()
            .unwrap();
        let line = entry.to_line(Scope::Token);
        assert_eq!(line, "a.txt a.out ((0, 1), (0, 3)) b.ann");
        assert_eq!(ManifestEntry::parse(&line).unwrap(), Some(entry));

        let mut placeholder = ManifestEntry::new("a.txt");
        placeholder.comparison_files.push("b.ann".into());
        assert_eq!(
            placeholder.to_line(Scope::Token),
            "a.txt a.txt.annotations (0, 0) b.ann"
        );
    }

    #[test]
    fn test_process_aggregates_errors() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        let taken = dir.path().join("taken.out");
        fs::write(&present, "a b").unwrap();
        fs::write(&taken, "").unwrap();
        let missing = dir.path().join("missing.txt");
        let missing_other = dir.path().join("missing.ann");

        let lines = vec![
            format!("{} {}", present.display(), taken.display()),
            format!(
                "{} {} 0 {}",
                missing.display(),
                dir.path().join("fresh.out").display(),
                missing_other.display()
            ),
        ];
        let err = process_file_list(&lines, &Config::default()).unwrap_err();
        let SlateError::FileList(report) = &err else {
            panic!("expected a file list error, got {:?}", err);
        };
        assert_eq!(
            report.missing,
            vec![missing.display().to_string(), missing_other.display().to_string()]
        );
        assert_eq!(report.existing_outputs, vec![taken.display().to_string()]);

        let message = err.to_string();
        assert!(message.starts_with("Input Filename List Has Errors"));
        assert!(message.contains("Unable to open:"));
        assert!(message.contains("Output file already exists:"));
    }

    #[test]
    fn test_process_with_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        let taken = dir.path().join("taken.out");
        fs::write(&present, "a b").unwrap();
        fs::write(&taken, "").unwrap();

        let config = Config {
            overwrite: true,
            ..Config::default()
        };
        let lines = [format!("{} {}", present.display(), taken.display())];
        let entries = process_file_list(&lines, &config).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].output_file, taken);
    }

    #[test]
    fn test_write_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.todo");
        let mut entry = ManifestEntry::new("a.txt");
        entry.start = Some(SpanSpec::Point(vec![2, 1]));
        write_progress(&path, &[entry, ManifestEntry::new("b.txt")], Scope::Token).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "a.txt a.txt.annotations (2, 1)\nb.txt b.txt.annotations\n"
        );
        assert_eq!(read_file_list(&path).unwrap().len(), 2);
    }
}
