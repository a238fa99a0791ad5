//! Link absolutization.

use url::Url;

/// Rewrites relative references in detail markup to absolute URLs.
///
/// Root-relative references (`/path`) resolve against the site root, other
/// relative references against the page they were found on. Fragments and
/// anything carrying a scheme (`mailto:`, `tel:`, `javascript:`, `data:`,
/// absolute `http(s)`) are left untouched.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    site_root: Url,
    page: Url,

    /// Literal path substitutions applied to root-relative references
    fixups: Vec<(String, String)>,
}

impl LinkRewriter {
    pub fn new(site_root: Url, page: Url) -> Self {
        Self {
            site_root,
            page,
            fixups: Vec::new(),
        }
    }

    pub fn with_fixups(mut self, fixups: impl IntoIterator<Item = (String, String)>) -> Self {
        self.fixups.extend(fixups);
        self
    }

    /// Absolute form of `value`, or `None` when it should stay as is.
    pub fn rewrite(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value.starts_with('#') || has_scheme(value) {
            return None;
        }

        if value.starts_with('/') && !value.starts_with("//") {
            let mut path = value.to_string();
            for (from, to) in &self.fixups {
                if path.contains(from.as_str()) {
                    path = path.replacen(from.as_str(), to, 1);
                }
            }
            return self.site_root.join(&path).ok().map(String::from);
        }

        self.page.join(value).ok().map(String::from)
    }
}

fn has_scheme(value: &str) -> bool {
    Url::parse(value).is_ok()
}
