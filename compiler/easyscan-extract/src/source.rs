//! Loading Go source files from disk.

use crate::error::{ExtractResult, SourceIoError};
use easyscan_diagnostics::ice;
use miette::NamedSource;
use std::fs;
use std::path::{Path, PathBuf};

/// A Go source file and its text.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a source file from disk.
    pub fn read(path: &Path) -> ExtractResult<Self> {
        let text = fs::read_to_string(path).map_err(|error| SourceIoError {
            path: path.to_path_buf(),
            error,
        })?;
        Ok(Self::new(path, text))
    }

    /// Get the source text named after its path, for rendering diagnostics.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.path.display().to_string(), self.text.clone()).with_language("go")
    }
}

/// Handle to a file in a [`SourceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

/// The source files loaded for one extraction, in load order.
#[derive(Debug, Default)]
pub struct SourceSet {
    files: Vec<SourceFile>,
}

impl SourceSet {
    pub fn add(&mut self, file: SourceFile) -> SourceId {
        self.files.push(file);
        SourceId(self.files.len() - 1)
    }

    pub fn get(&self, id: SourceId) -> &SourceFile {
        self.files
            .get(id.0)
            .unwrap_or_else(|| ice!(format!("source id {} is out of bounds", id.0)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &SourceFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(index, file)| (SourceId(index), file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Determine if a file name belongs to a Go test file.
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with("_test.go"))
}

/// List the Go files of a package directory, sorted by file name.
///
/// Every entry directly inside `dir` whose name ends in `.go` is listed unless it is a directory.
/// Symbolic links are followed. Test files are left out.
pub fn package_files(dir: &Path) -> ExtractResult<Vec<PathBuf>> {
    let io_error = |error| SourceIoError {
        path: dir.to_path_buf(),
        error,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_go = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".go"));
        if !is_go || is_test_file(&path) {
            continue;
        }
        let metadata = fs::metadata(&path).map_err(|error| SourceIoError {
            path: path.clone(),
            error,
        })?;
        if !metadata.is_dir() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use crate::source::{is_test_file, package_files, SourceFile, SourceSet};
    use easyscan_macros::assert_ok;
    use std::path::Path;

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("models/user_test.go")));
        assert!(!is_test_file(Path::new("models/user.go")));
        assert!(!is_test_file(Path::new("models/test.go")));
        assert!(!is_test_file(Path::new("models/user_test.go.orig")));
    }

    #[test]
    fn test_source_set_hands_out_ids_in_order() {
        let mut set = SourceSet::default();
        let a = set.add(SourceFile::new("a.go", "package a"));
        let b = set.add(SourceFile::new("b.go", "package b"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(a).text, "package a");
        assert_eq!(set.get(b).path, Path::new("b.go"));
        let paths = set
            .iter()
            .map(|(_, file)| file.path.clone())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec![Path::new("a.go"), Path::new("b.go")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_package_files_follow_symlinks_and_skip_directories() {
        use std::fs;
        use std::os::unix::fs::symlink;

        let root = std::env::temp_dir().join(format!("easyscan-links-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let dir = root.join("pkg");
        let shared = root.join("shared");
        assert_ok!(fs::create_dir_all(&dir));
        assert_ok!(fs::create_dir_all(shared.join("nested.go")));
        assert_ok!(fs::write(dir.join("plain.go"), "package pkg\n"));
        assert_ok!(fs::write(shared.join("model.go"), "package pkg\n"));
        assert_ok!(symlink(shared.join("model.go"), dir.join("linked.go")));
        assert_ok!(symlink(shared.join("nested.go"), dir.join("folder.go")));
        assert_ok!(fs::create_dir_all(dir.join("vendor.go")));

        let files = assert_ok!(package_files(&dir));
        let _ = fs::remove_dir_all(&root);
        let names = files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["linked.go", "plain.go"]);
    }
}
