//! HTTP transport for provider calls.

mod http;

pub use http::{HttpTransport, RawResponse, TransportError};
