//! # bfweb Core
//!
//! Shared types for the bfweb request pipeline.
//!
//! This crate holds the small vocabulary every other bfweb crate speaks:
//!
//! - [`RequestId`]: correlation identifier attached to each request
//! - [`ClientOrigin`]: transport-level origin (`host:port`) of a request
//! - [`ErrorPage`]: structured payload handed to error renderers
//! - [`ErrorCategory`]: classification of error statuses
//!
//! ## Example
//!
//! ```
//! use bfweb_core::{ErrorPage, RequestId};
//!
//! let id = RequestId::generate();
//! assert!(!id.as_str().is_empty());
//!
//! let page = ErrorPage::too_many_requests("/api/items");
//! assert_eq!(page.code, 429);
//! ```

#![doc(html_root_url = "https://docs.rs/bfweb-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod origin;
pub mod page;
pub mod request_id;

pub use error::ErrorCategory;
pub use origin::ClientOrigin;
pub use page::ErrorPage;
pub use request_id::{InvalidRequestId, RequestId};
