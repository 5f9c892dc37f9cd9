pub mod extract;
pub mod provider;

pub use provider::{IdentityProvider, ProviderClient, ProviderError, ProviderProfile, ProviderWork};
