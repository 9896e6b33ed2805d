//! Core types shared by every cicomp module.
//!
//! Currently this is the error vocabulary: [`ComponentError`] for typed
//! failures and [`ErrorContext`] for presenting them to users.

pub mod error;

pub use error::{ComponentError, ErrorContext, user_friendly_error};
