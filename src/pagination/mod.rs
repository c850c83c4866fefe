//! Pagination module
//!
//! Cursor pagination for the Web API listing methods.
//!
//! # Overview
//!
//! A [`Walker`] repeatedly calls a [`PageFetcher`], starting from an empty
//! [`Cursor`], appends each page's extracted values to the result and
//! follows the opaque continuation cursor until the server returns an empty
//! one. A fetch error ends the walk; whatever was gathered before it is
//! still returned, together with the error, in a [`Walk`].

mod types;
mod walker;

pub use types::{Continuation, Cursor, Page, PageFetcher, PageObserver, PaginationState, Walk};
pub use walker::Walker;
