pub mod client;
pub mod config;
pub mod constants;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod policy;
pub mod protection;
pub mod provider;
pub mod rest_client;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{BackupServiceClient, Submission};
pub use error::{Result, VaultError};
pub use protection::ProtectionManager;
pub use rest_client::RestClient;
