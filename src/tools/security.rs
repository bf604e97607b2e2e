use std::path::{Path, PathBuf};

use anyhow::Result;

/// Confines tool paths to the directories the user opened up.
///
/// The workspace root is where relative paths are resolved and is always
/// allowed. Extra directories can be allowed on top of it.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    /// Base for relative paths (canonical)
    workspace_root: PathBuf,

    /// Allowed directories (canonical), the workspace root included
    allowed_dirs: Vec<PathBuf>,
}

impl SecurityContext {
    /// Context rooted at the process working directory, or `.` if it is unavailable
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::rooted_at(&cwd)
    }

    fn rooted_at(root: &Path) -> Self {
        let root = canonical_or_raw(root);
        Self {
            allowed_dirs: vec![root.clone()],
            workspace_root: root,
        }
    }

    /// Context rooted at the given directory (builder pattern)
    pub fn with_workspace_root(self, root: impl AsRef<Path>) -> Self {
        let mut context = Self::rooted_at(root.as_ref());
        for dir in self.allowed_dirs.into_iter().skip(1) {
            if !context.allowed_dirs.contains(&dir) {
                context.allowed_dirs.push(dir);
            }
        }
        context
    }

    /// Add an allowed directory (builder pattern)
    pub fn with_allowed_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let canonical = canonical_or_raw(dir.as_ref());
        if !self.allowed_dirs.contains(&canonical) {
            self.allowed_dirs.push(canonical);
        }
        self
    }

    /// Root the context at `dir`, failing if it does not exist
    pub fn for_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let canonical = dir.as_ref().canonicalize().map_err(|e| {
            anyhow::anyhow!("Cannot use {} as working directory: {}", dir.as_ref().display(), e)
        })?;
        if !canonical.is_dir() {
            return Err(anyhow::anyhow!("{} is not a directory", canonical.display()));
        }
        Ok(Self::rooted_at(&canonical))
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Check if a path is inside an allowed directory
    pub fn is_path_allowed(&self, path: &Path) -> bool {
        // Canonicalize to resolve symlinks and `..` before comparing
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(_) => return false,
        };

        self.allowed_dirs
            .iter()
            .any(|allowed| canonical.starts_with(allowed))
    }

    /// Resolve a tool-supplied path to an existing, allowed, canonical path.
    ///
    /// `None` resolves to the workspace root. The error is a human-readable
    /// reason meant for the caller.
    pub fn resolve_path(&self, path: Option<&str>) -> std::result::Result<PathBuf, String> {
        let Some(raw) = path else {
            return Ok(self.workspace_root.clone());
        };

        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace_root.join(candidate)
        };

        let canonical = joined
            .canonicalize()
            .map_err(|_| format!("\"{}\" does not exist", raw))?;

        if !self.is_path_allowed(&canonical) {
            return Err(format!(
                "\"{}\" is outside the allowed directories",
                raw
            ));
        }

        Ok(canonical)
    }
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_none_resolves_to_root() {
        let temp_dir = TempDir::new().unwrap();
        let context = SecurityContext::new().with_workspace_root(temp_dir.path());
        assert_eq!(
            context.resolve_path(None).unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_relative_path_resolved_against_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("App.sln"), "").unwrap();
        let context = SecurityContext::new().with_workspace_root(temp_dir.path());

        let resolved = context.resolve_path(Some("App.sln")).unwrap();
        assert_eq!(resolved, temp_dir.path().canonicalize().unwrap().join("App.sln"));
    }

    #[test]
    fn test_traversal_is_denied() {
        let temp_dir = TempDir::new().unwrap();
        let inner = temp_dir.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        let context = SecurityContext::new().with_workspace_root(&inner);

        let err = context.resolve_path(Some("..")).unwrap_err();
        assert!(err.contains("outside the allowed directories"));
    }

    #[test]
    fn test_missing_path_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let context = SecurityContext::new().with_workspace_root(temp_dir.path());
        let err = context.resolve_path(Some("Nope.csproj")).unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_extra_allowed_dir() {
        let root = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let context = SecurityContext::new()
            .with_allowed_dir(shared.path())
            .with_workspace_root(root.path());

        let resolved = context
            .resolve_path(Some(&shared.path().to_string_lossy()))
            .unwrap();
        assert_eq!(resolved, shared.path().canonicalize().unwrap());
    }

    #[test]
    fn test_for_directory_requires_existing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(SecurityContext::for_directory(temp_dir.path()).is_ok());
        assert!(SecurityContext::for_directory(temp_dir.path().join("missing")).is_err());

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(SecurityContext::for_directory(&file).is_err());
    }
}
