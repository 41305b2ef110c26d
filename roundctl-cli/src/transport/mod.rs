//! Network transport to the game backend's REST API.

pub mod http;

pub use http::HttpTransport;
