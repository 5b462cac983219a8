//! HTTP request/response value objects for CGI-style hosts.
//!
//! A [`Request`] is resolved from a raw environment map, a [`Response`] is
//! reconciled with it through [`Response::prepare`] and written out.

pub mod config;
pub mod error;
pub mod http;

pub use config::RequestConfig;
pub use error::{HttpError, Result};
pub use http::request::Request;
pub use http::response::Response;
