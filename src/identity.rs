use serde::{Deserialize, Serialize};
use std::env;

pub const USER_ID_ENV: &str = "ATTENDANCE_USER_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    pub uid: String,
}

impl UserHandle {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

pub type AuthListener = Box<dyn Fn(Option<&UserHandle>) + Send + Sync>;

pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserHandle>;

    // Called once with the current state, then on every change.
    fn subscribe(&mut self, listener: AuthListener);
}

pub struct StaticIdentity {
    user: Option<UserHandle>,
    listeners: Vec<AuthListener>,
}

impl StaticIdentity {
    pub fn new(user: Option<UserHandle>) -> Self {
        Self {
            user,
            listeners: Vec::new(),
        }
    }

    pub fn resolve(configured: Option<&str>) -> Self {
        let uid = pick_uid(env::var(USER_ID_ENV).ok(), configured);
        Self::new(uid.map(UserHandle::new))
    }

    pub fn sign_out(&mut self) {
        self.user = None;
        self.listeners
            .iter()
            .for_each(|listener| listener(self.user.as_ref()));
    }
}

fn pick_uid(from_env: Option<String>, configured: Option<&str>) -> Option<String> {
    from_env
        .as_deref()
        .into_iter()
        .chain(configured)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserHandle> {
        self.user.clone()
    }

    fn subscribe(&mut self, listener: AuthListener) {
        listener(self.user.as_ref());
        self.listeners.push(listener);
    }
}
