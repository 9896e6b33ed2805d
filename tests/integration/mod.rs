//! Integration test suite for cicomp
//!
//! End-to-end tests over the public API and the `cicomp` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolution**: Precedence tables, usage errors and determinism
//! - **caching**: Content cache behaviour through the fetch pipeline
//! - **inputs**: Component headers and input validation on fetched files
//! - **cli**: The `resolve` and `fetch` commands

mod common;

mod caching;
mod cli;
mod inputs;
mod resolution;
