//! Notification sinks: SMTP mail, local directory, Google Drive.

pub mod drive;
pub mod file;
pub mod mail;

pub use drive::DriveSink;
pub use file::FileSink;
pub use mail::MailSink;

use notice_pipeline::{Payload, PayloadBody};

const FORBIDDEN: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Replace characters that are not allowed in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// File name and content type a payload is stored under.
pub(crate) fn stored_file(payload: &Payload) -> (String, String) {
    match &payload.body {
        PayloadBody::Html(_) => (
            format!("{}.html", sanitize_file_name(&payload.title)),
            "text/html; charset=utf-8".to_string(),
        ),
        PayloadBody::File {
            file_name,
            content_type,
            ..
        } => (
            sanitize_file_name(file_name),
            content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        ),
    }
}

/// Raw bytes of a payload body.
pub(crate) fn body_bytes(payload: &Payload) -> &[u8] {
    match &payload.body {
        PayloadBody::Html(markup) => markup.as_bytes(),
        PayloadBody::File { bytes, .. } => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_forbidden_characters() {
        assert_eq!(
            sanitize_file_name(r#"a/b\c?d%e*f:g|h"i<j>k.pdf"#),
            "a_b_c_d_e_f_g_h_i_j_k.pdf"
        );
        assert_eq!(sanitize_file_name("Đề thi Toán 5.pdf"), "Đề thi Toán 5.pdf");
        assert_eq!(sanitize_file_name("  "), "unknown");
    }
}
