//! Server side of a small news site: public article pages, a contact form,
//! member accounts and an admin panel.
//!
//! A request is resolved by [`web::Router`] to a controller action, which
//! reads and writes SQLite through [`storage::TableGateway`], checks forms
//! with the [`validation`] rules and consults the [`session`] for the
//! logged-in user. Admin pages go through [`PolicyGate`] first.
//!
//! # Core Types
//!
//! - [`web::Site`]: owns the database, sessions and uploads and serves requests
//! - [`Ctx`]: what an action can reach while handling one request
//! - [`Secret<T>`]: redacts passwords in logs and debug output
//! - [`PolicyGate`]: turns a session into a [`Principal`] after checking tiers
//!
//! # Examples
//!
//! ```
//! use newsdesk::config::SiteConfig;
//! use newsdesk::web::{Request, Site};
//!
//! let site = Site::from_config(&SiteConfig::default()).unwrap();
//! let response = site.handle(&Request::get("/contact/inquiry"));
//! assert_eq!(response.page.form, Some("inquiry"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod context;
pub mod controllers;
mod error;
pub mod forms;
mod gate;
pub mod logging;
mod password;
mod policy;
mod secret;
pub mod session;
pub mod storage;
pub mod validation;
pub mod web;

pub use config::SiteConfig;
pub use context::{Ctx, FORM_TOKEN_FIELD};
pub use error::{Error, Violation, ViolationKind, GENERIC_FAILURE};
pub use gate::PolicyGate;
pub use logging::RequestLog;
pub use password::PasswordHasher;
pub use policy::{authorize_edit, Authenticated, Authorized, Permission, PolicyReq, EDIT_DENIED};
pub use secret::Secret;
pub use session::{Principal, SessionContext};
pub use storage::{record, Database, Record, RecordExt, Table, Value};
pub use validation::{ValidationError, ValidationErrorKind, ValidationErrors};
