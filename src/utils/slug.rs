//! URL slugification and path utilities.

use deunicode::deunicode;

/// Convert text to a lowercase, dash-separated ASCII slug.
///
/// | Input | Slug |
/// |-------|------|
/// | `Hello World!` | `hello-world` |
/// | `Crème brûlée` | `creme-brulee` |
/// | `  --  ` | `` |
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Collapse repeated slashes and make the path start with `/`.
pub fn normalize_url_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    if path.len() > 1 && path.ends_with('/') && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
