use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::demo::DEMO_USER_ID;
use super::{AuthError, CredentialVerifier, User};
use crate::metrics::PERSIST_FAILURES;
use crate::store::{keys, load_json, save_json, KeyValueStore};

/// Current session, mirrored to the durable store (absent record = logged out).
pub struct AuthStore {
    user: Mutex<Option<User>>,
    verifier: Box<dyn CredentialVerifier>,
    store: Arc<dyn KeyValueStore>,
}

impl AuthStore {
    /// Rehydrate the session. A corrupt record is removed.
    pub fn new(verifier: Box<dyn CredentialVerifier>, store: Arc<dyn KeyValueStore>) -> Self {
        let user = match load_json::<User>(store.as_ref(), keys::USER) {
            Ok(user) => user,
            Err(e) => {
                warn!("Error parsing stored user, clearing it: {}", e);
                if let Err(e) = store.remove(keys::USER) {
                    warn!("Failed to remove stored user: {}", e);
                }
                None
            }
        };

        Self {
            user: Mutex::new(user),
            verifier,
            store,
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_some()
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.verifier.verify(email, password)?;
        info!("User {} logged in via {}", user.email, self.verifier.method_name());
        self.sign_in(user.clone());
        Ok(user)
    }

    /// Create an account and sign it in.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidRegistration(
                "name, email and password are required".to_string(),
            ));
        }

        let user = User {
            id: DEMO_USER_ID,
            name: name.to_string(),
            email: email.to_string(),
        };
        info!("Registered user {}", user.email);
        self.sign_in(user.clone());
        Ok(user)
    }

    pub fn logout(&self) {
        *self.lock() = None;
        if let Err(e) = self.store.remove(keys::USER) {
            warn!("Failed to remove stored user: {}", e);
            PERSIST_FAILURES.with_label_values(&[keys::USER]).inc();
        }
    }

    fn sign_in(&self, user: User) {
        if let Err(e) = save_json(self.store.as_ref(), keys::USER, &user) {
            warn!("Failed to persist session: {}", e);
            PERSIST_FAILURES.with_label_values(&[keys::USER]).inc();
        }
        *self.lock() = Some(user);
    }

    fn lock(&self) -> MutexGuard<'_, Option<User>> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
