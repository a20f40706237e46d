//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Destinations (relative, `/`-separated output paths carried by documents)
//! - URLs (where a destination is served, relative or absolute)
//! - Output file paths (where the save stage writes a destination)

use std::path::{Path, PathBuf};

/// File names HTTP servers serve implicitly for a directory request.
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Whether a file name is one a server serves for its directory.
pub fn is_index_file(name: &str) -> bool {
    INDEX_FILES.contains(&name)
}

/// Rewrite a destination so it is served from a directory URL.
///
/// # Examples
/// ```ignore
/// pretty_destination("about/contact.html") => "about/contact/index.html"
/// pretty_destination("feed.xml") => "feed/index.html"
/// pretty_destination("blog/index.html") => "blog/index.html"
/// pretty_destination("blog/") => "blog/index.html"
/// ```
pub fn pretty_destination(destination: &str) -> String {
    let destination = destination.trim_end_matches('/');
    if destination.is_empty() {
        return "index.html".to_string();
    }

    let (dir, name) = match destination.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, destination),
    };

    if is_index_file(name) {
        return destination.to_string();
    }

    // A leading dot marks a hidden file, not an extension.
    let stem = match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    };

    match dir {
        Some(dir) => format!("{dir}/{stem}/index.html"),
        None => format!("{stem}/index.html"),
    }
}

/// Join a base URL and a site-relative URL path.
///
/// # Examples
/// ```ignore
/// join_url("https://example.com/", "/about/") => "https://example.com/about/"
/// join_url("https://example.com", "/about/") => "https://example.com/about/"
/// ```
pub fn join_url(base_url: &str, url_path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        url_path.trim_start_matches('/')
    )
}

/// The directory part of a URL, including its trailing slash.
///
/// # Examples
/// ```ignore
/// url_directory("https://example.com/docs/sitemap.xml") => "https://example.com/docs/"
/// ```
pub fn url_directory(url: &str) -> &str {
    match url.rfind('/') {
        Some(pos) => &url[..=pos],
        None => "",
    }
}

/// Convert a destination to a file path under the output directory.
///
/// Leading slashes and `.`/`..` segments are dropped so a destination can
/// never escape the output directory.
pub fn destination_to_output_path(destination: &str, output_dir: &Path) -> PathBuf {
    destination
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .fold(output_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Convert a path relative to a source directory into a destination.
pub fn relative_path_to_destination(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_destination_nested() {
        assert_eq!(
            pretty_destination("about/contact.html"),
            "about/contact/index.html"
        );
    }

    #[test]
    fn test_pretty_destination_top_level() {
        assert_eq!(pretty_destination("feed.xml"), "feed/index.html");
        assert_eq!(pretty_destination("README"), "README/index.html");
    }

    #[test]
    fn test_pretty_destination_keeps_index_files() {
        assert_eq!(pretty_destination("index.html"), "index.html");
        assert_eq!(pretty_destination("blog/index.htm"), "blog/index.htm");
    }

    #[test]
    fn test_pretty_destination_directory_destinations() {
        assert_eq!(pretty_destination("blog/"), "blog/index.html");
        assert_eq!(pretty_destination("a/b//"), "a/b/index.html");
        assert_eq!(pretty_destination("/"), "index.html");
    }

    #[test]
    fn test_pretty_destination_dotted_names() {
        assert_eq!(
            pretty_destination("posts/v1.2.html"),
            "posts/v1.2/index.html"
        );
        assert_eq!(pretty_destination(".hidden"), ".hidden/index.html");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://x/", "/a"), "https://x/a");
        assert_eq!(join_url("https://x", "/a/"), "https://x/a/");
        assert_eq!(join_url("https://x", "/"), "https://x/");
    }

    #[test]
    fn test_url_directory() {
        assert_eq!(url_directory("https://x/sitemap.xml"), "https://x/");
        assert_eq!(url_directory("https://x/docs/sitemap.xml.gz"), "https://x/docs/");
        assert_eq!(url_directory("https://x/docs/"), "https://x/docs/");
    }

    #[test]
    fn test_destination_to_output_path() {
        let output = Path::new("/site");
        assert_eq!(
            destination_to_output_path("blog/post/index.html", output),
            PathBuf::from("/site/blog/post/index.html")
        );
        assert_eq!(
            destination_to_output_path("/../etc/passwd", output),
            PathBuf::from("/site/etc/passwd")
        );
    }

    #[test]
    fn test_base_path_from_config() {
        assert_eq!(
            base_path_from_config(Path::new("/project/siteflow.yaml")),
            PathBuf::from("/project")
        );
        assert_eq!(
            base_path_from_config(Path::new("siteflow.yaml")),
            PathBuf::from("")
        );
    }
}
