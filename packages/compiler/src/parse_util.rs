//! Parse Utilities
//!
//! Source files, stable file ids and source spans shared by every stage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Stable handle for a loaded source file. The id is an index into the
/// [`SourceMap`] arena; equal paths always intern to the same id.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Sentinel for spans synthesized outside any source file.
    pub const UNKNOWN: FileId = FileId(u32::MAX);
}

/// A source region: `(file, line, col, length)`.
/// Lines and columns are 1-based; `length` counts characters on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file: FileId,
    pub line: u32,
    pub col: u32,
    pub length: u32,
}

impl SourceSpan {
    pub fn new(file: FileId, line: u32, col: u32, length: u32) -> Self {
        SourceSpan { file, line, col, length }
    }

    /// Ordering key used by the diagnostic collector.
    pub fn sort_key(&self) -> (u32, u32, u32) {
        (self.file.0, self.line, self.col)
    }
}

/// A value together with the span it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Option<SourceSpan>,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Option<SourceSpan>) -> Self {
        Spanned { value, span }
    }
}

/// Arena of loaded files. Owns the normalized absolute path and the source
/// text for each [`FileId`] and renders display paths relative to the
/// compilation root so diagnostics are machine-independent.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFileEntry>,
    by_path: HashMap<PathBuf, FileId>,
    base: Option<PathBuf>,
}

#[derive(Debug)]
struct SourceFileEntry {
    path: PathBuf,
    content: String,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap::default()
    }

    /// Set the directory display paths are rendered relative to. Usually the
    /// entry file's parent.
    pub fn set_base(&mut self, base: PathBuf) {
        self.base = Some(normalize_path(&base));
    }

    /// Intern `path`, storing `content` for it. Re-interning the same
    /// normalized path returns the existing id without replacing the content.
    pub fn intern(&mut self, path: &Path, content: String) -> FileId {
        let normalized = normalize_path(path);
        if let Some(&id) = self.by_path.get(&normalized) {
            return id;
        }
        let id = FileId(self.files.len() as u32);
        self.by_path.insert(normalized.clone(), id);
        self.files.push(SourceFileEntry { path: normalized, content });
        id
    }

    /// Look up an already-interned path.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.by_path.get(&normalize_path(path)).copied()
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.files.get(id.0 as usize).map(|f| f.path.as_path())
    }

    pub fn content(&self, id: FileId) -> Option<&str> {
        self.files.get(id.0 as usize).map(|f| f.content.as_str())
    }

    /// Repo-relative display path for diagnostics and logs. Falls back to the
    /// full path (forward slashes) when the file is outside the base.
    pub fn display_path(&self, id: FileId) -> String {
        let Some(entry) = self.files.get(id.0 as usize) else {
            return "<unknown>".to_string();
        };
        let relative = self
            .base
            .as_deref()
            .and_then(|base| entry.path.strip_prefix(base).ok())
            .unwrap_or(&entry.path);
        relative.to_string_lossy().replace('\\', "/")
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.files.len() as u32).map(FileId)
    }
}

/// Lexically normalize a path: resolve `.` and `..` components without
/// touching the filesystem, so unloadable paths still get stable ids.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes_by_normalized_path() {
        let mut map = SourceMap::new();
        let a = map.intern(Path::new("/lib/./cell.asdl"), "a".into());
        let b = map.intern(Path::new("/lib/cell.asdl"), "b".into());
        assert_eq!(a, b);
        assert_eq!(map.content(a), Some("a"));
    }

    #[test]
    fn test_display_path_is_base_relative() {
        let mut map = SourceMap::new();
        map.set_base(PathBuf::from("/proj"));
        let id = map.intern(Path::new("/proj/lib/cell.asdl"), String::new());
        assert_eq!(map.display_path(id), "lib/cell.asdl");
    }

    #[test]
    fn test_normalize_resolves_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c.asdl")),
            PathBuf::from("/a/c.asdl")
        );
    }
}
