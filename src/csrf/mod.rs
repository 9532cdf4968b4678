//! CSRF token extraction.
//!
//! # Data Flow
//! ```text
//! "header:X-Csrf-Token"  → TokenLookup::parse
//! request parts + path params + form body
//!     → TokenLookup::extract → token | CsrfError
//! ```
//!
//! # Design Decisions
//! - Extractors are pure accessors; issuing and checking tokens is the
//!   caller's business
//! - An empty value is reported the same as a missing one

pub mod extractors;

pub use extractors::{CsrfError, TokenLookup};
