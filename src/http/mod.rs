//! Minimal HTTP/1.1 framing for the search front end.
//!
//! Only what the server needs: pull pipelined request heads off a byte stream,
//! extract the resource path and headers, and write back a status line, two headers
//! and a body. There is no body parsing and no method handling.

pub(crate) mod connection;
pub(crate) mod escape;
pub(crate) mod request;
pub(crate) mod response;

pub use connection::Connection;
pub use escape::escape_html;
pub use request::Request;
pub use response::{Response, Status};
