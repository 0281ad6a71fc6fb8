use std::sync::Mutex;

use crate::auth::{SigninRequest, SignupRequest};
use crate::db::Profile;

use super::api::{Api, ApiError};

/// Persisted credential slot, the equivalent of the browser's local
/// storage: a token plus the remember-me flag.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str, remember: bool);
    fn clear(&self);
    fn remembered(&self) -> bool;
}

impl<T: TokenStore> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str, remember: bool) {
        (**self).save(token, remember)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn remembered(&self) -> bool {
        (**self).remembered()
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<(String, bool)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap()
            .as_ref()
            .map(|(token, _)| token.clone())
    }

    fn save(&self, token: &str, remember: bool) {
        *self.slot.lock().unwrap() = Some((token.to_owned(), remember));
    }

    fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }

    fn remembered(&self) -> bool {
        self.slot
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|(_, remember)| *remember)
    }
}

/// Explicit session object: owns the Api handle and the signed-in profile.
/// Callers pass it where they need it; there is no global context.
pub struct AuthSession<S: TokenStore> {
    api: Api,
    store: S,
    user: Option<Profile>,
}

impl<S: TokenStore> AuthSession<S> {
    pub fn new(api: Api, store: S) -> Self {
        Self {
            api,
            store,
            user: None,
        }
    }

    /// Exchanges the stored token for a profile on startup. A rejected
    /// exchange clears the stored token; transport failures leave it in
    /// place so a later retry can still succeed.
    pub async fn restore(&mut self) -> Result<Option<&Profile>, ApiError> {
        let Some(token) = self.store.load() else {
            return Ok(None);
        };

        self.api.set_token(token);
        match self.api.current_user().await {
            Ok(user) => {
                self.user = Some(user);
                Ok(self.user.as_ref())
            }
            Err(ApiError::Status { .. }) => {
                self.store.clear();
                self.api.clear_token();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn sign_up(
        &mut self,
        req: &SignupRequest,
        remember: bool,
    ) -> Result<&Profile, ApiError> {
        let auth = self.api.sign_up(req).await?;
        self.store.save(&auth.token, remember);
        self.api.set_token(auth.token);
        Ok(&*self.user.insert(auth.user))
    }

    pub async fn sign_in(
        &mut self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<&Profile, ApiError> {
        let auth = self
            .api
            .sign_in(&SigninRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .await?;
        self.store.save(&auth.token, remember);
        self.api.set_token(auth.token);
        Ok(&*self.user.insert(auth.user))
    }

    pub fn sign_out(&mut self) {
        self.store.clear();
        self.api.clear_token();
        self.user = None;
    }

    pub fn user(&self) -> Option<&Profile> {
        self.user.as_ref()
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn token_store(&self) -> &S {
        &self.store
    }
}
