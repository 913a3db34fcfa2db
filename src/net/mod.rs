//! Network access layer.
//!
//! Probes never talk to the network directly. Every request and DNS lookup
//! goes through the [`transport::Transport`] trait so runs can be scripted
//! in tests.

pub mod transport;
pub mod url;

pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
