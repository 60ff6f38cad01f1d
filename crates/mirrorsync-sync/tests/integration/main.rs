//! Integration tests for mirrorsync-sync
//!
//! Exercises the engine end to end against real backends: local
//! directory trees built with tempfile, and remote containers simulated
//! with the in-memory object store.


mod test_failures;
mod test_local_sync;
mod test_remote_sync;
