mod demo;
mod store;
mod traits;
mod types;

pub use demo::*;
pub use store::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create the credential verifier from config
pub fn create_verifier(config: &AuthConfig) -> Box<dyn CredentialVerifier> {
    Box::new(DemoVerifier::new(config))
}
