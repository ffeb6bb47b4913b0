//! Path classification and normalization.
//!
//! Directive arguments arrive as loose filesystem paths ("js", "public/css/app.css",
//! "resources\\assets\\app.scss"). Everything downstream works with two shapes:
//!
//! - physical paths: cleaned, resolved against the project root
//! - logical paths: URL-style keys relative to the public directory (`/js/app.js`)

use std::path::{Path, PathBuf};

use path_clean::PathClean;

/// A classified filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// The cleaned path as given
    pub path: PathBuf,
    /// File name including extension (empty for directories)
    pub file: String,
    /// File name without extension
    pub name: String,
    /// Extension without the leading dot
    pub ext: Option<String>,
    /// Whether the path denotes a directory
    pub is_dir: bool,
}

impl ParsedPath {
    /// Classify a path.
    ///
    /// A path is a directory when it exists as one on disk, or when it has no
    /// extension (`mix.js(.., "js")` targets the `js` directory).
    pub fn parse(path: impl AsRef<Path>) -> Self {
        let path = PathBuf::from(to_url_path(&path.as_ref().to_string_lossy())).clean();
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
        let is_dir = path.is_dir() || ext.is_none();

        let (file, name) = if is_dir {
            (String::new(), String::new())
        } else {
            (
                file_name(&path),
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        };

        Self {
            path,
            file,
            name,
            ext,
            is_dir,
        }
    }

    /// Place `file` inside this path when it is a directory; otherwise return self.
    pub fn or_file(self, file: &str) -> Self {
        if self.is_dir {
            ParsedPath::parse(self.path.join(file))
        } else {
            self
        }
    }

    /// The path without its extension, URL-style.
    pub fn without_ext(&self) -> String {
        to_url_path(&self.path.with_extension("").to_string_lossy())
    }

    /// Parent directory, URL-style (empty for a bare file name).
    pub fn base(&self) -> String {
        self.path
            .parent()
            .map(|parent| to_url_path(&parent.to_string_lossy()))
            .unwrap_or_default()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Force forward slashes.
pub fn to_url_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve(root: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        root.join(path).clean()
    }
}

/// Strip any of `prefixes` and return a path with exactly one leading slash.
///
/// ```
/// use mixer_core::paths::to_logical;
///
/// assert_eq!(to_logical("\\admin\\js/manifest.js", &["public"]), "/admin/js/manifest.js");
/// assert_eq!(to_logical("public/css/app.css", &["public"]), "/css/app.css");
/// assert_eq!(to_logical("//js/app.js", &[]), "/js/app.js");
/// ```
pub fn to_logical(path: &str, prefixes: &[&str]) -> String {
    let mut rest = to_url_path(path);
    for prefix in prefixes {
        let prefix = to_url_path(prefix);
        let prefix = prefix.trim_start_matches("./").trim_matches('/');
        if prefix.is_empty() || prefix == "." {
            continue;
        }
        let candidate = rest.trim_start_matches("./").trim_start_matches('/');
        if let Some(stripped) = candidate.strip_prefix(prefix) {
            if stripped.starts_with('/') {
                rest = stripped.to_string();
                break;
            }
        }
    }

    let trimmed = rest.trim_start_matches("./").trim_start_matches('/');
    format!("/{}", trimmed)
}

/// Logical key for a file on disk, when it lives under `public_dir`.
pub fn logical_from_physical(public_dir: &Path, physical: &Path) -> Option<String> {
    let physical = physical.to_path_buf().clean();
    let public_dir = public_dir.to_path_buf().clean();
    let relative = physical.strip_prefix(&public_dir).ok()?;
    Some(to_logical(&relative.to_string_lossy(), &[]))
}

/// Physical location of a logical key (any `?id=` suffix is ignored).
pub fn physical_from_logical(public_dir: &Path, logical: &str) -> PathBuf {
    let without_query = logical.split('?').next().unwrap_or(logical);
    public_dir
        .join(without_query.trim_start_matches('/'))
        .clean()
}
