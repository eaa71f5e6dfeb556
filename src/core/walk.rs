//! Source file enumeration.

use std::path::{Path, PathBuf};

use crate::utils::io::display_relative;

/// Directories to always skip at any depth (VCS, tool and dependency caches).
const ALWAYS_SKIP_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".dart_tool",
    ".pub-cache",
    ".idea",
    "node_modules",
];

/// Directories to skip only at the root level (build output).
/// Deeper `build/` directories may hold real sources.
const ROOT_ONLY_SKIP_DIRS: &[&str] = &["build"];

/// Which files take part in a run.
///
/// `include`/`exclude` are glob patterns matched against the path relative to
/// the root with `/` separators. An empty `include` admits everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub extension: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl FileFilter {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn matches(&self, relative: &str) -> bool {
        let ext_ok = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension);
        if !ext_ok {
            return false;
        }
        if !self.include.is_empty()
            && !self.include.iter().any(|p| glob_match::glob_match(p, relative))
        {
            return false;
        }
        !self.exclude.iter().any(|p| glob_match::glob_match(p, relative))
    }
}

/// Matching files under `root`, sorted by path so runs are reproducible.
pub fn collect_files(root: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_recursive(root, root, filter, &mut files);
    files.sort();
    files
}

fn walk_recursive(dir: &Path, root: &Path, filter: &FileFilter, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let is_root = dir == root;

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            if ALWAYS_SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            if is_root && ROOT_ONLY_SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            walk_recursive(&path, root, filter, files);
        } else if filter.matches(&display_relative(root, &path)) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn rels(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|f| display_relative(root, f)).collect()
    }

    #[test]
    fn walks_sorted_and_skips_tool_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "lib/b.dart");
        touch(root, "lib/a.dart");
        touch(root, "lib/readme.md");
        touch(root, ".dart_tool/gen.dart");
        touch(root, "build/out.dart");
        touch(root, "tool/build/script.dart");

        let files = collect_files(root, &FileFilter::new("dart"));
        assert_eq!(
            rels(root, &files),
            vec!["lib/a.dart", "lib/b.dart", "tool/build/script.dart"]
        );
    }

    #[test]
    fn include_and_exclude_patterns() {
        let mut filter = FileFilter::new("dart");
        filter.include = vec!["lib/**".to_string()];
        filter.exclude = vec!["lib/generated/**".to_string()];

        assert!(filter.matches("lib/main.dart"));
        assert!(!filter.matches("lib/generated/model.g.dart"));
        assert!(!filter.matches("test/main_test.dart"));
        assert!(!filter.matches("lib/notes.txt"));
    }
}
