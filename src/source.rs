use crate::error::{Error, Result};
use anyhow::Context;
use glob::Pattern;
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A parsed Rust source file together with the module it defines.
///
/// The module path is derived from the file's location below the crate's `src/`
/// directory: `src/models/user.rs` is `models::user`, while `lib.rs`, `main.rs` and
/// `mod.rs` name their enclosing directory.
#[derive(Debug)]
pub struct SourceFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Module segments below the crate root; empty for the root module
    pub module_path: Vec<String>,
    /// The parsed abstract syntax tree
    pub syntax: syn::File,
}

/// All parsed sources of a project.
#[derive(Debug, Default)]
pub struct SourceSet {
    pub files: Vec<SourceFile>,
    /// Inaccessible paths and files that failed to parse
    pub warnings: Vec<String>,
}

impl SourceFile {
    /// Read and parse one file of the project rooted at `root`
    pub fn parse_file(root: &Path, path: &Path) -> Result<SourceFile> {
        debug!("Parsing file: {}", path.display());
        let content = fs::read_to_string(path)?;
        let syntax = syn::parse_file(&content).map_err(|e| Error::Parse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(SourceFile {
            path: path.to_path_buf(),
            module_path: module_path_for(root, path),
            syntax,
        })
    }

    /// Parse source text as the module `module_path`
    pub fn parse_str(module_path: &[&str], code: &str) -> Result<SourceFile> {
        let path = PathBuf::from(format!("<{}>", module_path.join("::")));
        let syntax = syn::parse_file(code).map_err(|e| Error::Parse {
            file: path.clone(),
            message: e.to_string(),
        })?;
        Ok(SourceFile {
            path,
            module_path: module_path.iter().map(|s| s.to_string()).collect(),
            syntax,
        })
    }
}

impl SourceSet {
    /// Scan `root` for `.rs` files and parse each of them.
    ///
    /// Files that cannot be read or parsed are skipped and recorded as warnings so a
    /// partially broken project still produces a document.
    pub fn load(root: &Path) -> anyhow::Result<SourceSet> {
        Self::load_excluding(root, &[])
    }

    /// Like [`SourceSet::load`], leaving out files whose path relative to `root` matches
    /// one of the `excludes` globs
    pub fn load_excluding(root: &Path, excludes: &[String]) -> anyhow::Result<SourceSet> {
        let excludes = excludes
            .iter()
            .map(|raw| Pattern::new(raw).with_context(|| format!("invalid exclude pattern {}", raw)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let (paths, mut warnings) = scan(root, &excludes);
        debug!("Found {} Rust files under {}", paths.len(), root.display());

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            match SourceFile::parse_file(root, path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    warnings.push(e.to_string());
                }
            }
        }

        debug!(
            "Parsing complete: {} succeeded, {} failed",
            files.len(),
            paths.len() - files.len()
        );
        Ok(SourceSet { files, warnings })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Collect `.rs` files, skipping `target`, hidden directories and excluded paths
fn scan(root: &Path, excludes: &[Pattern]) -> (Vec<PathBuf>, Vec<String>) {
    let mut rust_files = Vec::new();
    let mut warnings = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.path() == root {
                return true;
            }
            let file_name = e.file_name().to_string_lossy();
            if file_name.starts_with('.') || file_name == "target" {
                return false;
            }
            let relative = relative_slash_path(root, e.path());
            if excludes.iter().any(|p| p.matches(&relative)) {
                debug!("Excluded {}", relative);
                return false;
            }
            true
        })
    {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                    rust_files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                let warning = format!("Failed to access path: {}", e);
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    (rust_files, warnings)
}

/// `path` below `root` with `/` separators, the form exclude globs are written in
fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Module segments for a file, relative to the last `src` directory above it
fn module_path_for(root: &Path, path: &Path) -> Vec<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(src) = segments.iter().rposition(|s| s == "src") {
        segments.drain(..=src);
    }

    let Some(file_name) = segments.pop() else {
        return segments;
    };
    let stem = file_name.strip_suffix(".rs").unwrap_or(&file_name);
    match stem {
        "lib" | "main" if segments.is_empty() => {}
        "mod" => {}
        other => segments.push(other.to_string()),
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_module_paths() {
        let root = Path::new("/project");
        let cases = [
            ("/project/src/lib.rs", vec![]),
            ("/project/src/main.rs", vec![]),
            ("/project/src/models.rs", vec!["models"]),
            ("/project/src/models/mod.rs", vec!["models"]),
            ("/project/src/models/user.rs", vec!["models", "user"]),
            ("/project/handlers.rs", vec!["handlers"]),
        ];
        for (path, expected) in cases {
            assert_eq!(module_path_for(root, Path::new(path)), expected, "{}", path);
        }
    }

    #[test]
    fn test_load_skips_target_hidden_and_broken_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/models")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        fs::write(root.join("src/lib.rs"), "pub mod models;").unwrap();
        fs::write(root.join("src/models/user.rs"), "pub struct User { pub id: u64 }").unwrap();
        fs::write(root.join("src/broken.rs"), "pub struct {").unwrap();
        fs::write(root.join("target/debug/build.rs"), "fn main() {}").unwrap();
        fs::write(root.join(".git/hook.rs"), "fn main() {}").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();

        let sources = SourceSet::load(root).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.warnings.len(), 1);
        assert!(sources.warnings[0].contains("broken.rs"));

        let modules: Vec<Vec<String>> = sources.files.iter().map(|f| f.module_path.clone()).collect();
        assert!(modules.contains(&vec![]));
        assert!(modules.contains(&vec!["models".to_string(), "user".to_string()]));
    }

    #[test]
    fn test_load_excluding_globs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/generated")).unwrap();
        fs::create_dir_all(root.join("legacy")).unwrap();

        fs::write(root.join("src/lib.rs"), "pub struct Kept;").unwrap();
        fs::write(root.join("src/generated/proto.rs"), "pub struct Proto;").unwrap();
        fs::write(root.join("src/generated_notes.rs"), "pub struct Notes;").unwrap();
        fs::write(root.join("legacy/old.rs"), "pub struct Old;").unwrap();

        let excludes = vec!["src/generated/*.rs".to_string(), "legacy/**".to_string()];
        let sources = SourceSet::load_excluding(root, &excludes).unwrap();
        let mut names: Vec<String> = sources
            .files
            .iter()
            .map(|f| relative_slash_path(root, &f.path))
            .collect();
        names.sort();
        assert_eq!(names, vec!["src/generated_notes.rs", "src/lib.rs"]);

        assert!(SourceSet::load_excluding(root, &["src/[".to_string()]).is_err());
    }

    #[test]
    fn test_parse_str() {
        let file = SourceFile::parse_str(&["api"], "pub struct Ping;").unwrap();
        assert_eq!(file.module_path, vec!["api"]);
        assert_eq!(file.syntax.items.len(), 1);
        assert!(SourceFile::parse_str(&[], "struct {").is_err());
    }
}
