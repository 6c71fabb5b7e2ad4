//! # warden_core
//!
//! Core credential lifecycle logic for Warden: credential storage, signed
//! tokens, password hashing, notification dispatch and the password
//! lifecycle manager that ties them together.

pub mod auth;
pub mod lifecycle;
pub mod mail;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
