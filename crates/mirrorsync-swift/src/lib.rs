//! MirrorSync Swift adapter
//!
//! Implements the `IObjectStore` port against an OpenStack-Swift-style
//! object storage HTTP API: token-authenticated requests against
//! `<endpoint>/<container>/<key>`, with plain-text marker pagination for
//! listings.

pub mod client;

pub use client::SwiftClient;
