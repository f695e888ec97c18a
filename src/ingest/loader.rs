//! Document loading for ingestion.
//!
//! Sources are local files (`.txt`, `.md`, `.pdf`), directories of them,
//! or `http(s)` URLs. Loading is per-item fallible; directory walks log
//! and skip what they cannot read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

const WEB_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to extract text from {path}: {message}")]
    Pdf { path: PathBuf, message: String },
    #[error("unsupported file type: {path}")]
    Unsupported { path: PathBuf },
}

/// A loaded document before splitting. `page` is 1-based for paged
/// formats and 0 for unpaged ones.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub text: String,
    pub source: String,
    pub page: i64,
}

/// Load one source argument: URL, directory, or file.
pub async fn load_source(source: &str) -> Result<Vec<LoadedDocument>, IngestError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return load_url(source).await;
    }

    let path = Path::new(source);
    if path.is_dir() {
        Ok(load_dir(path))
    } else {
        load_file(path)
    }
}

/// Walk a directory tree collecting every supported file. Unreadable or
/// unsupported entries are skipped, not fatal.
pub fn load_dir(dir: &Path) -> Vec<LoadedDocument> {
    let mut documents = Vec::new();
    collect_dir(dir, &mut documents);
    documents
}

fn collect_dir(dir: &Path, documents: &mut Vec<LoadedDocument>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("cannot read directory {}: {}", dir.display(), err);
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            collect_dir(&path, documents);
            continue;
        }

        match load_file(&path) {
            Ok(docs) => documents.extend(docs),
            Err(IngestError::Unsupported { .. }) => {
                tracing::debug!("skipping unsupported file {}", path.display());
            }
            Err(err) => {
                tracing::warn!("skipping {}: {}", path.display(), err);
            }
        }
    }
}

pub fn load_file(path: &Path) -> Result<Vec<LoadedDocument>, IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => load_text_file(path),
        "pdf" => load_pdf(path),
        _ => Err(IngestError::Unsupported {
            path: path.to_path_buf(),
        }),
    }
}

fn load_text_file(path: &Path) -> Result<Vec<LoadedDocument>, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(vec![LoadedDocument {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        source: path.to_string_lossy().into_owned(),
        page: 0,
    }])
}

fn load_pdf(path: &Path) -> Result<Vec<LoadedDocument>, IngestError> {
    let text = pdf_extract::extract_text(path).map_err(|err| IngestError::Pdf {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let source = path.to_string_lossy().into_owned();

    // Extraction joins pages with form feeds when the file carries page
    // breaks; otherwise the whole document counts as page 1.
    let documents: Vec<LoadedDocument> = text
        .split('\u{c}')
        .enumerate()
        .filter(|(_, page_text)| !page_text.trim().is_empty())
        .map(|(i, page_text)| LoadedDocument {
            text: page_text.trim().to_string(),
            source: source.clone(),
            page: (i + 1) as i64,
        })
        .collect();

    Ok(documents)
}

/// Fetch a URL and strip markup down to readable text.
pub async fn load_url(url: &str) -> Result<Vec<LoadedDocument>, IngestError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(WEB_TIMEOUT_SECS))
        .build()
        .map_err(|source| IngestError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| IngestError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let body = response.text().await.map_err(|source| IngestError::Fetch {
        url: url.to_string(),
        source,
    })?;

    Ok(vec![LoadedDocument {
        text: strip_html_tags(&body),
        source: url.to_string(),
        page: 0,
    }])
}

/// Simple HTML tag stripper; drops script and style bodies entirely.
fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    let chars: Vec<char> = html.chars().collect();
    let chars_lower: Vec<char> = html.to_lowercase().chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if i + 7 <= chars_lower.len() {
            let tag: String = chars_lower[i..i + 7].iter().collect();
            if tag == "<script" {
                in_script = true;
            }
        }
        if i + 6 <= chars_lower.len() {
            let tag: String = chars_lower[i..i + 6].iter().collect();
            if tag == "<style" {
                in_style = true;
            }
        }

        if in_script && i + 9 <= chars_lower.len() {
            let tag: String = chars_lower[i..i + 9].iter().collect();
            if tag == "</script>" {
                in_script = false;
                i += 9;
                continue;
            }
        }
        if in_style && i + 8 <= chars_lower.len() {
            let tag: String = chars_lower[i..i + 8].iter().collect();
            if tag == "</style>" {
                in_style = false;
                i += 8;
                continue;
            }
        }

        if in_script || in_style {
            i += 1;
            continue;
        }

        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(c);
        }

        i += 1;
    }

    let lines: Vec<&str> = result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_stripping_keeps_text_drops_markup() {
        let html = r#"
            <html>
            <head><script>var x = 1;</script><style>body { color: red; }</style></head>
            <body>
                <h1>Refund policy</h1>
                <p>Refunds are processed within 7 days.</p>
            </body>
            </html>
        "#;

        let text = strip_html_tags(html);
        assert!(text.contains("Refund policy"));
        assert!(text.contains("Refunds are processed within 7 days."));
        assert!(!text.contains('<'));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn text_files_load_whole_with_page_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline two").unwrap();

        let docs = load_file(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "line one\nline two");
        assert_eq!(docs[0].page, 0);
        assert!(docs[0].source.ends_with("notes.txt"));
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        let err = load_file(Path::new("diagram.png")).unwrap_err();
        assert!(matches!(err, IngestError::Unsupported { .. }));
    }

    #[test]
    fn directory_walk_skips_what_it_cannot_use() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("b.md"), "beta").unwrap();
        std::fs::write(dir.path().join("c.png"), [0u8; 4]).unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("d.txt"), "delta").unwrap();

        let docs = load_dir(dir.path());
        let mut texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        texts.sort();
        assert_eq!(texts, vec!["alpha", "beta", "delta"]);
    }
}
