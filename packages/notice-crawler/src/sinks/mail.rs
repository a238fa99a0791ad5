//! SMTP mail sink (STARTTLS, authenticated).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

use notice_pipeline::{NotificationSink, Payload, PayloadBody, SinkError, SinkResult};

use crate::config::SmtpConfig;

pub struct MailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
}

fn parse_mailboxes(values: &[String]) -> SinkResult<Vec<Mailbox>> {
    values
        .iter()
        .map(|v| {
            v.parse::<Mailbox>()
                .map_err(|e| SinkError::Rejected(format!("invalid address {}: {}", v, e)))
        })
        .collect()
}

impl MailSink {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> SinkResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(SinkError::transport)?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .timeout(Some(timeout))
            .build();

        let to = parse_mailboxes(&config.to)?;
        if to.is_empty() {
            return Err(SinkError::Rejected("no recipients configured".to_string()));
        }

        Ok(Self {
            transport,
            from: config
                .from
                .parse()
                .map_err(|e| SinkError::Rejected(format!("invalid sender {}: {}", config.from, e)))?,
            to,
            cc: parse_mailboxes(&config.cc)?,
        })
    }

    /// Build the message for a payload: HTML body, or a short note with the
    /// file attached.
    pub fn build_message(&self, payload: &Payload) -> SinkResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(payload.title.clone());
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        for cc in &self.cc {
            builder = builder.cc(cc.clone());
        }

        let message = match &payload.body {
            PayloadBody::Html(markup) => builder
                .header(ContentType::TEXT_HTML)
                .body(markup.clone()),
            PayloadBody::File {
                file_name,
                content_type,
                bytes,
            } => {
                let content_type =
                    ContentType::parse(content_type.as_deref().unwrap_or("application/octet-stream"))
                        .map_err(|e| SinkError::Rejected(format!("bad content type: {}", e)))?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::html(format!(
                            "<p>{}</p>",
                            escape_html(&payload.title)
                        )))
                        .singlepart(
                            Attachment::new(file_name.clone()).body(bytes.to_vec(), content_type),
                        ),
                )
            }
        };

        message.map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
impl NotificationSink for MailSink {
    fn name(&self) -> &str {
        "mail"
    }

    async fn deliver(&self, payload: &Payload) -> SinkResult<()> {
        let message = self.build_message(payload)?;
        self.transport
            .send(message)
            .await
            .map_err(SinkError::transport)?;

        info!(subject = %payload.title, recipients = self.to.len(), "Mail sent");
        Ok(())
    }
}
