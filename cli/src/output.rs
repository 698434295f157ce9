//! Rendering of command results.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Picks JSON when `json` is set, YAML otherwise.
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Yaml }
    }
}

/// Where and how a command result is printed.
pub struct Output {
    pub format: OutputFormat,
    /// Destination file; stdout when unset.
    pub file: Option<PathBuf>,
}

impl Output {
    pub fn new(format: OutputFormat, file: Option<impl Into<PathBuf>>) -> Self {
        Self {
            format,
            file: file.map(Into::into),
        }
    }

    /// Renders `value`, always ending in exactly one newline.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        let mut text = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Renders `value` into `sink`.
    pub fn write_to<T: Serialize>(&self, value: &T, sink: &mut dyn Write) -> anyhow::Result<()> {
        sink.write_all(self.render(value)?.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    /// Renders `value` into the configured file, or stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        match &self.file {
            Some(path) => self.write_to(value, &mut File::create(path)?),
            None => self.write_to(value, &mut io::stdout().lock()),
        }
    }
}

/// Prints a diagnostic line to stderr when `enabled`.
pub fn print_verbose(enabled: bool, message: &str) {
    if enabled {
        eprintln!("[verbose] {message}");
    }
}
