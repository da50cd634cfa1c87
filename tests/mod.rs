//! Integration tests for twitchcast
//!
//! Tests are organized by component:
//! - auth_test: Token cache and refresh serialization
//! - helix_test: Helix chain and left joins (mockito)
//! - resolver_test: Quality fallback against a fake extractor
//! - dispatch_test: Background casting and outcomes
//! - server_test: HTTP routes end to end
//! - cli_test: Argument parsing and config files

// Note: Each test file is a separate integration test crate
// Shared fakes live in common/
