use super::{AuthError, CredentialVerifier, User};
use crate::config::AuthConfig;

/// Id given to every signed-in account.
pub const DEMO_USER_ID: u64 = 1;

/// Message returned for any rejected login.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Accepts exactly one configured demo account.
pub struct DemoVerifier {
    email: String,
    password: String,
    name: String,
}

impl DemoVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            email: config.demo_email.clone(),
            password: config.demo_password.clone(),
            name: config.demo_name.clone(),
        }
    }
}

impl CredentialVerifier for DemoVerifier {
    fn verify(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email == self.email && password == self.password {
            Ok(User {
                id: DEMO_USER_ID,
                name: self.name.clone(),
                email: self.email.clone(),
            })
        } else {
            Err(AuthError::InvalidCredentials(INVALID_CREDENTIALS.to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_demo_account() {
        let verifier = DemoVerifier::new(&AuthConfig::default());

        let user = verifier.verify("demo@example.com", "password").unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Demo User");
    }

    #[test]
    fn test_rejects_wrong_password_and_email() {
        let verifier = DemoVerifier::new(&AuthConfig::default());

        let expected = Err(AuthError::InvalidCredentials(
            "Invalid email or password".to_string(),
        ));
        assert_eq!(verifier.verify("demo@example.com", "wrong"), expected);
        assert_eq!(verifier.verify("DEMO@example.com", "password"), expected);
    }

    #[test]
    fn test_configured_account() {
        let config = AuthConfig {
            demo_email: "ada@example.com".to_string(),
            demo_password: "engine".to_string(),
            demo_name: "Ada".to_string(),
        };
        let verifier = DemoVerifier::new(&config);
        assert_eq!(verifier.verify("ada@example.com", "engine").unwrap().name, "Ada");
        assert!(verifier.verify("demo@example.com", "password").is_err());
    }
}
