//! Delivery channels for pipeline notices.
//!
//! Two [`stagepass_core::notify::Mailer`] implementations:
//!
//! - [`console::ConsoleMailer`] — renders notices to the log; development
//!   and test environments.
//! - [`smtp::SmtpMailer`] — real email over SMTP via `lettre`; production.
//!
//! Both render the same plain-text bodies through [`render`].

pub mod console;
pub mod render;
pub mod smtp;

pub use console::ConsoleMailer;
pub use smtp::SmtpMailer;
