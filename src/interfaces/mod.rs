//! External interfaces (HTTP/JSON API) exposed by the directory service.

pub mod http;

pub use http::{router, HttpState};
