//! Embedding input loading.
//!
//! Embeddings are produced by the face model outside this tool and handed
//! over as YAML or JSON: either a bare list of floats or a mapping with an
//! `embedding` key.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Error type for embedding loading.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse embedding (tried YAML and JSON)")]
    ParseFailed,
    #[error("embedding is empty")]
    Empty,
    #[error("embedding contains a non-finite value at index {0}")]
    NonFinite(usize),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingFile {
    Bare(Vec<f32>),
    Wrapped { embedding: Vec<f32> },
}

impl EmbeddingFile {
    fn into_vec(self) -> Vec<f32> {
        match self {
            Self::Bare(v) | Self::Wrapped { embedding: v } => v,
        }
    }
}

/// Loads an embedding from a YAML or JSON file. `-` reads stdin.
pub fn load_embedding(path: impl AsRef<Path>) -> Result<Vec<f32>, EmbeddingError> {
    let path = path.as_ref();
    let data = if path.as_os_str() == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        data
    } else {
        fs::read(path)?
    };
    parse_embedding(&data, path)
}

/// Parses embedding data based on file extension or content.
pub fn parse_embedding(data: &[u8], path: impl AsRef<Path>) -> Result<Vec<f32>, EmbeddingError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    let file: EmbeddingFile = match ext.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_slice(data)?,
        Some("json") => serde_json::from_slice(data)?,
        _ => {
            // Try JSON first, then YAML
            if let Ok(v) = serde_json::from_slice(data) {
                v
            } else if let Ok(v) = serde_yaml::from_slice(data) {
                v
            } else {
                return Err(EmbeddingError::ParseFailed);
            }
        }
    };

    let v = file.into_vec();
    if v.is_empty() {
        return Err(EmbeddingError::Empty);
    }
    if let Some(i) = v.iter().position(|x| !x.is_finite()) {
        return Err(EmbeddingError::NonFinite(i));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_json_bare() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "[0.5, -1.0, 2.0]").unwrap();

        let v = load_embedding(file.path()).unwrap();
        assert_eq!(v, vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn test_load_yaml_wrapped() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "embedding:\n  - 0.25\n  - 0.75").unwrap();

        let v = load_embedding(file.path()).unwrap();
        assert_eq!(v, vec![0.25, 0.75]);
    }

    #[test]
    fn test_parse_unknown_extension() {
        let v = parse_embedding(br#"{"embedding": [1.0, 2.0]}"#, "face.emb").unwrap();
        assert_eq!(v, vec![1.0, 2.0]);
    }

    #[test]
    fn test_parse_invalid() {
        let result = parse_embedding(b"invalid data {{{{", "face.txt");
        assert!(matches!(result, Err(EmbeddingError::ParseFailed)));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            parse_embedding(b"[]", "face.json"),
            Err(EmbeddingError::Empty)
        ));
    }

    #[test]
    fn test_parse_non_finite() {
        assert!(matches!(
            parse_embedding(b"[1.0, .nan]", "face.yaml"),
            Err(EmbeddingError::NonFinite(1))
        ));
    }
}
