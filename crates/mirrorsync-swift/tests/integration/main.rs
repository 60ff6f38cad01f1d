//! Integration tests for mirrorsync-swift
//!
//! Uses wiremock to simulate a Swift-style object store and verifies
//! end-to-end behavior of the SwiftClient: object transfer, listing
//! pagination, and failure classification.

mod common;

mod test_listing;
