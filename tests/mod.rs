//! Integration tests for stillpoint
//!
//! Tests are organized by component:
//! - cache_test: Content cache over the in-memory store (load, writes, ordering)
//! - rest_store_test: HTTP store and cache against a mocked backend
//! - auth_test: Sign-in, session and role lookups
//! - search_test: Free-text filtering and section visibility
//! - resolver_test: Link normalization and media classification
//! - player_test: Playback controller state machine
//! - banner_test: Banner rotation and fallback
//! - upload_test: Upload-then-link workflows
//! - cli_test: Argument parsing, JSON output and command handlers

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
