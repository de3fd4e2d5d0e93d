//! SMTP mailer via `lettre`.

use crate::render::render;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use stagepass_core::notify::{Mailer, Notice};
use stagepass_core::{Error, Result};

/// Sends rendered notices over SMTP.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    ops_address: String,
}

impl SmtpMailer {
    /// Create an SMTP mailer relaying through `host:port` with the given
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the relay configuration is invalid.
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from_address: impl Into<String>,
        ops_address: impl Into<String>,
    ) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|err| Error::storage(format!("SMTP relay error: {err}")))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self {
            transport,
            from_address: from_address.into(),
            ops_address: ops_address.into(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, notice: &Notice) -> Result<()> {
        let rendered = render(notice, &self.ops_address);
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|err| Error::storage(format!("invalid from address: {err}")))?,
            )
            .to(rendered
                .to
                .parse()
                .map_err(|err| Error::storage(format!("invalid recipient address: {err}")))?)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .map_err(|err| Error::storage(format!("failed to build email: {err}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|err| Error::storage(format!("SMTP send failed: {err}")))?;
        Ok(())
    }
}
