//! Detail content and deliverable payloads.

use bytes::Bytes;

/// Raw detail content as retrieved by a source adapter.
#[derive(Debug, Clone)]
pub enum Detail {
    /// An HTML page and the URL it was fetched from
    Html { url: String, markup: String },

    /// A downloaded document
    File {
        url: String,
        file_name: String,
        content_type: Option<String>,
        bytes: Bytes,
    },
}

/// Body of a deliverable payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadBody {
    /// Self-contained markup with every reference absolute
    Html(String),

    /// A document to store or attach
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Bytes,
    },
}

/// A titled payload ready for a Notification Sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub title: String,
    pub body: PayloadBody,

    /// Logical destination path for sinks that file things away
    /// (`[sheet, subject, slot]`); empty for flat sinks such as mail.
    pub folder: Vec<String>,
}

impl Payload {
    /// An HTML payload.
    pub fn html(title: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: PayloadBody::Html(markup.into()),
            folder: Vec::new(),
        }
    }

    /// A file payload.
    pub fn file(
        title: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Bytes,
    ) -> Self {
        Self {
            title: title.into(),
            body: PayloadBody::File {
                file_name: file_name.into(),
                content_type,
                bytes,
            },
            folder: Vec::new(),
        }
    }

    /// Set the destination folder path.
    pub fn with_folder(mut self, folder: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.folder = folder.into_iter().map(Into::into).collect();
        self
    }

    /// Markup content, if this is an HTML payload.
    pub fn markup(&self) -> Option<&str> {
        match &self.body {
            PayloadBody::Html(markup) => Some(markup),
            PayloadBody::File { .. } => None,
        }
    }
}
