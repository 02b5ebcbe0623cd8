//! Request boundary.
//!
//! HTTP frameworks stay outside this crate. An integration converts its own
//! request into a [`Request`], calls [`Site::handle`], and renders the
//! returned [`Page`] however it likes. Everything between those two points
//! (session lookup, routing, authorization, validation, storage) happens
//! here with no framework types involved.
//!
//! ```
//! use newsdesk::config::SiteConfig;
//! use newsdesk::web::{Request, Site};
//!
//! let site = Site::from_config(&SiteConfig::default()).unwrap();
//! let response = site.handle(&Request::get("/article/latest"));
//! assert_eq!(response.page.title, "Website - Latest Articles");
//! ```

mod page;
mod request;
mod router;
mod site;
mod upload;

pub use page::{NavLink, Page};
pub use request::{Method, Params, Request, Upload};
pub use router::{Action, Route, RouteKey, Router, FALLBACK};
pub use site::{Response, Site};
pub use upload::{DirectoryUploads, UploadOutcome, UploadRejection, UploadStore, ALLOWED_EXTENSIONS};
