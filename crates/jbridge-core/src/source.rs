//! Source descriptors and reading source text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Prefix of the identity given to purely in-memory sources.
pub const VIRTUAL_SCHEME: &str = "mem:///";

/// Identity of a source in a resolve request: a normalized path or a
/// `mem:///` name.
pub type SourceId = Arc<str>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a text file", path.display())]
    Binary { path: PathBuf },
}

/// Text encoding of a source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceEncoding {
    /// UTF-16 when a byte order mark says so, UTF-8 otherwise.
    #[default]
    Auto,
    Utf8,
    Utf16Le,
    Utf16Be,
}

/// One unit to compile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// A file read from disk (or from a matching working copy).
    File { path: PathBuf, encoding: SourceEncoding },
    /// An open editor buffer for a file. Its text wins over the disk and
    /// over other working copies of the same file.
    Buffer { path: PathBuf, text: Arc<str> },
    /// A source with no file behind it.
    Virtual { name: String, text: Arc<str> },
}

impl SourceDescriptor {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::File {
            path: path.into(),
            encoding: SourceEncoding::Auto,
        }
    }

    pub fn buffer(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        SourceDescriptor::Buffer {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn virtual_source(name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        SourceDescriptor::Virtual {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Identity used as the key of the result map.
    pub fn id(&self) -> SourceId {
        match self {
            SourceDescriptor::File { path, .. } | SourceDescriptor::Buffer { path, .. } => {
                Arc::from(normalize_path(path))
            }
            SourceDescriptor::Virtual { name, .. } => {
                Arc::from(format!("{VIRTUAL_SCHEME}{}", name.trim_start_matches('/')))
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceDescriptor::File { path, .. } | SourceDescriptor::Buffer { path, .. } => Some(path),
            SourceDescriptor::Virtual { .. } => None,
        }
    }

    /// A file the front-end could open itself, as opposed to a virtual
    /// source. Only these are batched by project.
    pub fn is_native(&self) -> bool {
        !matches!(self, SourceDescriptor::Virtual { .. })
    }

    /// Text carried by the descriptor itself.
    pub fn own_text(&self) -> Option<&Arc<str>> {
        match self {
            SourceDescriptor::Buffer { text, .. } | SourceDescriptor::Virtual { text, .. } => Some(text),
            SourceDescriptor::File { .. } => None,
        }
    }
}

/// Slash-separated path text with `.` segments removed.
pub fn normalize_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let mut out: Vec<&str> = Vec::new();
    for segment in text.split('/') {
        match segment {
            "." => {}
            "" if !out.is_empty() => {}
            _ => out.push(segment),
        }
    }
    out.join("/")
}

/// Read a source file, decoding it per `encoding`.
pub fn read_source(path: &Path, encoding: SourceEncoding) -> Result<Arc<str>, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_source(&bytes, encoding).ok_or_else(|| SourceError::Binary {
        path: path.to_path_buf(),
    })
}

/// Decode source bytes. `None` when the content looks binary.
pub fn decode_source(bytes: &[u8], encoding: SourceEncoding) -> Option<Arc<str>> {
    let encoding = match (encoding, bytes) {
        (SourceEncoding::Auto, [0xFE, 0xFF, ..]) => SourceEncoding::Utf16Be,
        (SourceEncoding::Auto, [0xFF, 0xFE, ..]) => SourceEncoding::Utf16Le,
        (other, _) => other,
    };
    match encoding {
        SourceEncoding::Utf16Be | SourceEncoding::Utf16Le => {
            let body = match bytes {
                [0xFE, 0xFF, rest @ ..] | [0xFF, 0xFE, rest @ ..] => rest,
                _ => bytes,
            };
            let words: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| match encoding {
                    SourceEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                    _ => u16::from_le_bytes([pair[0], pair[1]]),
                })
                .collect();
            Some(Arc::from(String::from_utf16_lossy(&words)))
        }
        SourceEncoding::Auto | SourceEncoding::Utf8 => {
            if is_binary(bytes) {
                return None;
            }
            let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
            Some(Arc::from(String::from_utf8_lossy(body).as_ref()))
        }
    }
}

/// Content that is unlikely to be source text: many null bytes, a run of
/// nulls near the start, or repeated control bytes.
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let head = &bytes[..bytes.len().min(1024)];
    let nulls = memchr::memchr_iter(0, head).count();
    if nulls > 10 {
        return true;
    }
    let prefix = &bytes[..bytes.len().min(512)];
    if prefix.windows(4).any(|w| w == [0, 0, 0, 0]) {
        return true;
    }
    let control = head
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0C | 0))
        .count();
    control >= 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities() {
        assert_eq!(SourceDescriptor::file("./src//p/A.java").id().as_ref(), "src/p/A.java");
        assert_eq!(
            SourceDescriptor::virtual_source("A.java", "class A {}").id().as_ref(),
            "mem:///A.java"
        );
        assert!(!SourceDescriptor::virtual_source("A.java", "").is_native());
    }

    #[test]
    fn test_decoding() {
        let utf16: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain("class A {}".encode_utf16().flat_map(u16::to_le_bytes))
            .collect();
        assert_eq!(decode_source(&utf16, SourceEncoding::Auto).as_deref(), Some("class A {}"));
        assert_eq!(
            decode_source(b"\xEF\xBB\xBFclass B {}", SourceEncoding::Auto).as_deref(),
            Some("class B {}")
        );
        assert!(decode_source(&[0, 0, 0, 0, 1, 2, 3], SourceEncoding::Utf8).is_none());
    }
}
