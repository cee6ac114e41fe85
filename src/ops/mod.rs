//! User-facing operations on secret files.
//!
//! Each operation drives the external binary through an [`Ejson`](crate::runner::Ejson)
//! client and validates documents before any subprocess is started.

pub mod decrypt;
pub mod edit;
pub mod encrypt;
pub mod keys;
pub mod status;

pub use decrypt::decrypt_file;
pub use edit::{edit_file, EditOutcome};
pub use encrypt::encrypt_file;
pub use keys::{ensure_key, generate_key, resolve_key, EnsureKeyOutcome, KeyDecision};
pub use status::{file_status, StatusReport};
