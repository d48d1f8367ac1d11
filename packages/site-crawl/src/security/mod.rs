//! Credential handling for the upstream API.

pub mod credentials;

pub use credentials::{CredentialStore, SecretString};
