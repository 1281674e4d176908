//! Session state and token persistence.
//!
//! `Session` is written only by login, logout and start-up restore. Route
//! guards and API calls read it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::User;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token restored from disk whose user has not been fetched yet
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            user: None,
            token: Some(token.into()),
        }
    }

    pub fn login(&mut self, user: User, token: impl Into<String>) {
        self.user = Some(user);
        self.token = Some(token.into());
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Route guards check for a user, not just a token
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Keeps the bearer token in a file between runs
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("reading session file {}", self.path.display())),
        }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("writing session file {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("removing session file {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn login_then_logout_clears_everything() {
        let mut session = Session::new();
        assert!(!session.is_authenticated());

        session.login(user(), "abc");
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("abc"));

        session.logout();
        assert_eq!(session, Session::new());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn restored_token_is_not_authenticated_until_user_known() {
        let session = Session::with_token("abc");
        assert_eq!(session.token(), Some("abc"));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn store_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::new(dir.path().join("nested").join("token"));

        assert_eq!(store.load()?, None);
        store.save("secret-token")?;
        assert_eq!(store.load()?.as_deref(), Some("secret-token"));
        store.clear()?;
        assert_eq!(store.load()?, None);
        // clearing twice is fine
        store.clear()?;
        Ok(())
    }

    #[test]
    fn blank_file_means_no_token() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::new(dir.path().join("token"));
        fs::write(store.path(), "  \n")?;
        assert_eq!(store.load()?, None);
        Ok(())
    }
}
