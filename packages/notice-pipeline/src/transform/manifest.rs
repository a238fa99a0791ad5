//! Embedded attachment manifests.
//!
//! Some detail pages list their attachments in a script variable inside a
//! placeholder element, e.g.
//!
//! ```text
//! <td id="file-placeholder"><script>var _files = [{"FileName":"a.pdf","FileUrl":"https://x/a.pdf"}];</script></td>
//! ```
//!
//! Clients that do not run scripts would show nothing, so the placeholder's
//! children are replaced by plain anchors, with every `FileUrl` made absolute.

use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use tracing::debug;

use super::links::LinkRewriter;
use super::render::{escape_attr, escape_text, render_children, RenderOptions, RenderState};
use crate::error::TransformError;

/// One entry of an attachment manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttachmentFile {
    #[serde(rename = "FileName")]
    pub file_name: String,

    #[serde(rename = "FileUrl")]
    pub file_url: String,
}

/// Where to look for a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSpec {
    /// `id` of the placeholder element
    pub container_id: String,

    /// Script variable holding the JSON array
    pub variable: String,
}

impl ManifestSpec {
    pub fn new(container_id: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            variable: variable.into(),
        }
    }

    fn pattern(&self) -> Result<Regex, TransformError> {
        let pattern = format!(
            r"(?s){}\s*=\s*(\[.*?\])\s*;",
            regex::escape(&self.variable)
        );
        Ok(Regex::new(&pattern)?)
    }

    /// Parse the manifest out of the placeholder's text, if present.
    pub fn extract(&self, text: &str) -> Result<Option<Vec<AttachmentFile>>, TransformError> {
        let pattern = self.pattern()?;
        let Some(captures) = pattern.captures(text) else {
            return Ok(None);
        };
        let files: Vec<AttachmentFile> = serde_json::from_str(&captures[1])?;
        Ok(Some(files))
    }
}

/// Anchors for each file, separated by line breaks.
pub fn render_attachment_links(files: &[AttachmentFile], links: &LinkRewriter) -> String {
    let mut out = String::new();
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        let href = links
            .rewrite(&file.file_url)
            .unwrap_or_else(|| file.file_url.clone());
        out.push_str("<a href=\"");
        escape_attr(&href, &mut out);
        out.push_str("\" target=\"_blank\" rel=\"noopener\">");
        escape_text(&file.file_name, &mut out);
        out.push_str("</a>");
    }
    out
}

/// Replace a script-embedded manifest with plain links.
///
/// Returns `markup` unchanged (byte-identical) when there is no placeholder or
/// no manifest inside it. A manifest that is present but not valid JSON is an
/// error.
pub fn expand_manifest(
    markup: &str,
    spec: &ManifestSpec,
    links: &LinkRewriter,
) -> Result<String, TransformError> {
    let fragment = Html::parse_fragment(markup);
    let root = fragment.root_element();

    let Some(container) = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(spec.container_id.as_str()))
    else {
        return Ok(markup.to_string());
    };

    let text: String = container.text().collect();
    let Some(files) = spec.extract(&text)? else {
        return Ok(markup.to_string());
    };
    debug!(
        container = %spec.container_id,
        files = files.len(),
        "Expanding attachment manifest"
    );

    let anchors = render_attachment_links(&files, links);
    let options = RenderOptions {
        links: None,
        replace_children: Some((spec.container_id.as_str(), anchors.as_str())),
    };
    let mut out = String::new();
    render_children(root, root.value().name(), &options, &mut RenderState::default(), &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;
    use url::Url;

    fn spec() -> ManifestSpec {
        ManifestSpec::new("file-placeholder", "_files")
    }

    fn links() -> LinkRewriter {
        LinkRewriter::new(
            Url::parse("https://x.vn/").unwrap(),
            Url::parse("https://x.vn/van-ban/chi-tiet.htm").unwrap(),
        )
    }

    #[test]
    fn test_manifest_becomes_single_anchor() {
        let markup = r#"<table class="table-detail"><tbody><tr><td id="file-placeholder"><script>var _files = [{"FileName":"a.pdf","FileUrl":"https://x/a.pdf"}];</script></td></tr></tbody></table>"#;

        let out = expand_manifest(markup, &spec(), &links()).unwrap();

        let doc = Html::parse_fragment(&out);
        let td = doc
            .select(&Selector::parse("#file-placeholder").unwrap())
            .next()
            .unwrap();
        let children: Vec<_> = td.children().collect();
        assert_eq!(children.len(), 1);

        let anchor = ElementRef::wrap(children[0]).unwrap();
        assert_eq!(anchor.value().name(), "a");
        assert_eq!(anchor.value().attr("href"), Some("https://x/a.pdf"));
        assert_eq!(anchor.value().attr("target"), Some("_blank"));
        assert_eq!(anchor.text().collect::<String>(), "a.pdf");
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn test_multiple_files_are_separated_by_breaks() {
        let files = vec![
            AttachmentFile {
                file_name: "a.pdf".into(),
                file_url: "https://x/a.pdf".into(),
            },
            AttachmentFile {
                file_name: "b & c.docx".into(),
                file_url: "https://x/b.docx?x=1&y=2".into(),
            },
        ];
        assert_eq!(
            render_attachment_links(&files, &links()),
            concat!(
                r#"<a href="https://x/a.pdf" target="_blank" rel="noopener">a.pdf</a><br>"#,
                r#"<a href="https://x/b.docx?x=1&amp;y=2" target="_blank" rel="noopener">b &amp; c.docx</a>"#
            )
        );
    }

    #[test]
    fn test_relative_file_urls_are_made_absolute() {
        let files = vec![
            AttachmentFile {
                file_name: "a.pdf".into(),
                file_url: "/uploads/a.pdf".into(),
            },
            AttachmentFile {
                file_name: "b.pdf".into(),
                file_url: "tep/b.pdf".into(),
            },
        ];
        assert_eq!(
            render_attachment_links(&files, &links()),
            concat!(
                r#"<a href="https://x.vn/uploads/a.pdf" target="_blank" rel="noopener">a.pdf</a><br>"#,
                r#"<a href="https://x.vn/van-ban/tep/b.pdf" target="_blank" rel="noopener">b.pdf</a>"#
            )
        );
    }

    #[test]
    fn test_absent_manifest_is_byte_identical() {
        let without_container = "<div class=\"x\">  <p>Nội dung</p>\n</div>";
        assert_eq!(expand_manifest(without_container, &spec(), &links()).unwrap(), without_container);

        let without_variable =
            r#"<div><span id="file-placeholder"><script>var other = 1;</script></span></div>"#;
        assert_eq!(expand_manifest(without_variable, &spec(), &links()).unwrap(), without_variable);
    }

    #[test]
    fn test_malformed_manifest_is_error() {
        let markup = r#"<div id="file-placeholder"><script>var _files = [{"FileName": }];</script></div>"#;
        let err = expand_manifest(markup, &spec(), &links()).unwrap_err();
        assert!(matches!(err, TransformError::Manifest(_)));
    }
}
