//! Path and id normalization used by `resolveId`.
//!
//! A resolved id is either an external URL (kept verbatim) or a filesystem
//! path (normalized to use forward slashes and collapse `.`/`..` segments).

use std::path::{Path, PathBuf};

/// Find the project root by walking up from `cwd` looking for `package.json`
/// or `.git`.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if current.join("package.json").exists() || current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Recognized external URL schemes a resolved id is left untouched for.
const EXTERNAL_SCHEMES: &[&str] = &["http://", "https://", "data:", "virtual:", "//"];

/// True if `id` names an external resource — a recognized URL scheme is
/// kept as-is rather than treated as a filesystem path.
#[must_use]
pub fn is_external_url(id: &str) -> bool {
    EXTERNAL_SCHEMES.iter().any(|scheme| id.starts_with(scheme))
}

/// Normalize a resolved id. External URLs pass through unchanged; everything
/// else is treated as a filesystem path: backslashes become forward
/// slashes, and `.`/`..` segments are collapsed lexically (no filesystem
/// access, since the path may not exist yet during a crawl).
#[must_use]
pub fn normalize_id(id: &str) -> String {
    if is_external_url(id) {
        return id.to_string();
    }

    let slashed = id.replace('\\', "/");
    let is_absolute = slashed.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in slashed.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if matches!(segments.last(), Some(&s) if s != "..") {
                    segments.pop();
                } else if !is_absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if is_absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Join a base directory with a relative specifier the way a resolver would
/// when building a default `importer`.
#[must_use]
pub fn join_url(base: &str, relative: &str) -> String {
    if is_external_url(relative) {
        return relative.to_string();
    }
    if relative.starts_with('/') {
        return normalize_id(relative);
    }

    let base_dir = match base.rfind('/') {
        Some(idx) => &base[..idx],
        None => "",
    };
    normalize_id(&format!("{base_dir}/{relative}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_with_package_json() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(project_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn external_urls_pass_through() {
        assert_eq!(normalize_id("https://cdn.example/a.js"), "https://cdn.example/a.js");
        assert!(is_external_url("data:text/plain,hi"));
    }

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(normalize_id("/a/./b/../c"), "/a/c");
        assert_eq!(normalize_id("a//b\\c"), "a/b/c");
    }

    #[test]
    fn join_url_resolves_relative() {
        assert_eq!(join_url("/src/index.html", "./main.js"), "/src/main.js");
        assert_eq!(join_url("/src/index.html", "/abs.js"), "/abs.js");
        assert_eq!(
            join_url("/src/index.html", "https://cdn.example/a.js"),
            "https://cdn.example/a.js"
        );
    }
}
