use thiserror::Error;

use super::types::User;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),
}

/// Checks login credentials.
pub trait CredentialVerifier: Send + Sync {
    /// Return the account for a matching email/password pair.
    fn verify(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Name of this verification method
    fn method_name(&self) -> &'static str;
}
