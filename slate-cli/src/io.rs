//! File I/O for native CLI

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use slate_core::manifest::read_file_list;
use slate_core::{Config, LabelConfig};

use crate::SessionArgs;

/// Send logs to `<prefix>.log`
pub fn init_logging(prefix: &str, debug: bool) -> Result<()> {
    let path = format!("{}.log", prefix);
    let file = File::create(&path).with_context(|| format!("Failed to create log: {}", path))?;
    let default_level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Build the session configuration: the JSON file if given, then the label
/// file, then command-line flags
pub fn load_config(args: &SessionArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(path) = &args.labels {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels: {}", path.display()))?;
        config.labels = LabelConfig::parse_list(&text)
            .with_context(|| format!("Invalid labels in {}", path.display()))?;
    }

    if let Some(scope) = args.scope {
        config.scope = scope;
    }
    if let Some(annotation_type) = args.annotation_type {
        config.annotation_type = annotation_type;
    }
    config.readonly |= args.readonly;
    config.overwrite |= args.overwrite;
    config.prevent_self_links |= args.prevent_self_links;
    config.prevent_forward_links |= args.prevent_forward_links;
    Ok(config)
}

/// Record the effective configuration beside the log
pub fn write_config(prefix: &str, config: &Config) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}.config", prefix));
    let json = config.to_json().context("Failed to serialize config")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// File-list lines from positional files and list files
pub fn collect_file_list(data: &[PathBuf], data_lists: &[PathBuf]) -> Result<Vec<String>> {
    let mut lines: Vec<String> = data.iter().map(|p| p.display().to_string()).collect();
    for list in data_lists {
        lines.extend(
            read_file_list(Path::new(list))
                .with_context(|| format!("Failed to read file list: {}", list.display()))?,
        );
    }
    anyhow::ensure!(!lines.is_empty(), "No files to annotate");
    Ok(lines)
}
