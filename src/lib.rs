//! folio: contact form backend for a personal portfolio site.
//!
//! A visitor's message is validated, then delivered through the first strategy
//! that works: the transactional email provider, a development SMTP sandbox,
//! or a durable sink that records it for later.
//!
//! See `DESIGN.md` for the module-level design notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;

pub mod contact;
pub mod sink;
pub mod transport;

pub mod server;
