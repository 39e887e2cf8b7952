//! Resolution of model sub-resources (OBJ, MTL, textures).
//!
//! Lookup order for every name:
//! 1. bundled in-memory resources keyed by the composed path `base/name`;
//! 2. the filesystem: absolute names as-is, relative names joined to `base`.
//!
//! Names ending in `.gz` are decompressed transparently.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, Cursor, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use flate2::bufread::MultiGzDecoder;

use crate::error::{AssetError, AssetResult};

/// Boxed line source handed to the parsers.
pub type SourceReader = Box<dyn BufRead + Send>;

#[derive(Clone, Debug, Default)]
pub struct ResourceLocator {
    bundled: HashMap<String, Arc<[u8]>>,
}

impl ResourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-memory resource under its composed path (e.g. `models/house.obj`).
    pub fn with_bundled(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert_bundled(path, bytes);
        self
    }

    pub fn insert_bundled(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.bundled.insert(normalize(path), Arc::from(bytes));
    }

    /// `true` if `name` resolves through either lookup.
    pub fn exists(&self, base: &str, name: &str) -> bool {
        self.bundled.contains_key(&compose(base, name)) || fs_path(base, name).is_file()
    }

    /// Open `name` for line reading, gunzipping `.gz` sources.
    pub fn open(&self, base: &str, name: &str) -> AssetResult<SourceReader> {
        let composed = compose(base, name);
        let raw: SourceReader = match self.bundled.get(&composed) {
            Some(bytes) => {
                log::debug!("Resolved {} from bundled resources", composed);
                Box::new(Cursor::new(Arc::clone(bytes)))
            }
            None => {
                let path = fs_path(base, name);
                let file = File::open(&path)
                    .map_err(|e| AssetError::io(path.display().to_string(), e))?;
                log::debug!("Resolved {} from {}", composed, path.display());
                Box::new(BufReader::new(file))
            }
        };

        if is_compressed(name) {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(raw))))
        } else {
            Ok(raw)
        }
    }

    /// Read the whole (decompressed) resource.
    pub fn read(&self, base: &str, name: &str) -> AssetResult<Vec<u8>> {
        let mut reader = self.open(base, name)?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| AssetError::io(compose(base, name), e))?;
        Ok(bytes)
    }
}

/// Numbered text lines of a source. Bytes that are not valid UTF-8 are
/// replaced, so only a failing read is an error.
pub struct SourceLines<R> {
    reader: R,
    file: String,
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> SourceLines<R> {
    pub fn new(reader: R, file: &str) -> Self {
        Self {
            reader,
            file: file.to_string(),
            line: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for SourceLines<R> {
    /// 1-based line number and the line without its terminator.
    type Item = AssetResult<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        let next_line = self.line + 1;
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line = next_line;
                let mut end = self.buf.len();
                while end > 0 && matches!(self.buf[end - 1], b'\n' | b'\r') {
                    end -= 1;
                }
                let text = String::from_utf8_lossy(&self.buf[..end]).into_owned();
                Some(Ok((next_line, text)))
            }
            Err(e) => Some(Err(AssetError::io(format!("{}:{}", self.file, next_line), e))),
        }
    }
}

/// Split a source id into `(base directory, file name)` at the last separator.
pub fn split_source(source: &str) -> (String, String) {
    let source = normalize(source);
    match source.rfind('/') {
        Some(i) => (source[..i].to_string(), source[i + 1..].to_string()),
        None => (String::new(), source),
    }
}

/// Source id with `\` separators turned into `/`.
pub fn normalize_source(source: &str) -> String {
    normalize(source)
}

pub fn is_compressed(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".gz")
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn compose(base: &str, name: &str) -> String {
    let name = normalize(name);
    if base.is_empty() || Path::new(&name).is_absolute() {
        name
    } else {
        format!("{}/{}", normalize(base).trim_end_matches('/'), name)
    }
}

fn fs_path(base: &str, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() || base.is_empty() {
        path.to_path_buf()
    } else {
        Path::new(base).join(path)
    }
}
