//! # trumpeter-notify
//!
//! Outbound email for the Alert Bay Trumpeter site.
//!
//! The site sends mail in two places: the contact form (validated here,
//! delivery stubbed to logging) and the webhook reconciler's thank-you
//! note after a completed subscription checkout. Both go through the
//! [`Mailer`] trait so the delivery vendor stays swappable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trumpeter_notify::{LogMailer, Mailer, OutboundEmail};
//!
//! let mailer = LogMailer;
//! mailer.send(&OutboundEmail {
//!     to: "fan@example.com".into(),
//!     subject: "Thank you".into(),
//!     text: "Your support keeps the music going.".into(),
//! }).await?;
//! ```

mod contact;
mod error;
mod mailer;

pub use contact::{ContactMessage, DEFAULT_CONTACT_EMAIL, is_valid_email};
pub use error::{NotifyError, Result};
pub use mailer::{LogMailer, Mailer, OutboundEmail, ResendConfig, ResendMailer};
