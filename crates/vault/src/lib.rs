//! Named-secret resolution.
//!
//! Every [`SecretResolver::resolve`] call is a fresh round-trip: the Key Vault
//! adapter performs an AAD client-credential exchange and then fetches the
//! secret. Nothing is cached, so a rotated secret is picked up on the next
//! request.

pub mod error;
pub mod key_vault;
pub mod memory;
pub mod traits;

pub use {
    error::VaultError,
    key_vault::KeyVaultResolver,
    memory::InMemorySecrets,
    traits::SecretResolver,
};
