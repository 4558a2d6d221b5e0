// Loader: where spec source text comes from
//
// The resolver never touches the filesystem directly. It asks a SourceLoader
// to turn an import string into a path and the path into text, so tests and
// embedders can compile from memory.
//
// Paths are normalized lexically (`a/data/../commons.go` -> `a/commons.go`),
// without hitting the disk, so the same file reached through different
// relative imports gets one identity in the import graph.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Source of spec files for one compilation.
pub trait SourceLoader {
    /// Path of `import` written inside the file at `from`.
    fn resolve(&self, from: &Path, import: &str) -> PathBuf {
        let base = from.parent().unwrap_or_else(|| Path::new(""));
        normalize(&base.join(import))
    }

    /// Read the text of a (resolved) path.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Reads files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves files from an in-memory map keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no such file in memory loader")
        })
    }
}

/// Lexically resolve `.` and `..` components.
///
/// A `..` that would climb above the start of a relative path is kept, so
/// `../x` stays `../x`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/data/../commons.go")), PathBuf::from("a/commons.go"));
        assert_eq!(normalize(Path::new("./a/./b.go")), PathBuf::from("a/b.go"));
        assert_eq!(normalize(Path::new("../x.go")), PathBuf::from("../x.go"));
        assert_eq!(normalize(Path::new("/../x.go")), PathBuf::from("/x.go"));
    }

    #[test]
    fn test_resolve_relative_to_importer() {
        let loader = MemoryLoader::new();
        let p = loader.resolve(Path::new("spec/data/mood.go"), "../commons.go");
        assert_eq!(p, PathBuf::from("spec/commons.go"));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_file("spec/./a.go", "A { x string }");
        assert_eq!(loader.load(Path::new("spec/a.go")).unwrap(), "A { x string }");
        let err = loader.load(Path::new("spec/b.go")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_fs_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");
        std::fs::write(&path, "A { x string }").unwrap();
        assert_eq!(FsLoader.load(&path).unwrap(), "A { x string }");
        assert!(FsLoader.load(&dir.path().join("missing.go")).is_err());
    }
}
