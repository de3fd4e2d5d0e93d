//! Console mailer for development and testing.

use crate::render::render;
use async_trait::async_trait;
use stagepass_core::Result;
use stagepass_core::notify::{Mailer, Notice};

/// Logs rendered notices instead of sending them.
///
/// Useful in development where a real SMTP relay is not configured; the
/// full body lands in the log at info level.
#[derive(Clone, Debug)]
pub struct ConsoleMailer {
    ops_address: String,
}

impl ConsoleMailer {
    /// Create a console mailer routing operational notices to
    /// `ops_address`.
    #[must_use]
    pub fn new(ops_address: impl Into<String>) -> Self {
        Self { ops_address: ops_address.into() }
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn deliver(&self, notice: &Notice) -> Result<()> {
        let rendered = render(notice, &self.ops_address);
        tracing::info!(
            kind = notice.kind(),
            to = %rendered.to,
            subject = %rendered.subject,
            body = %rendered.body,
            "notification (console mode)"
        );
        Ok(())
    }
}
