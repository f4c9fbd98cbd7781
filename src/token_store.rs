//! File-backed stand-in for the browser's `JWT` cookie.
//!
//! The file holds a single cookie line, `JWT=<token>; path=/; Secure`, so the
//! token is read back the same way a cookie header is searched.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::SubManagerError;

pub const COOKIE_NAME: &str = "JWT";

/// Finds the `JWT` value in a cookie string such as `theme=dark; JWT=abc`.
pub fn token_from_cookie(cookie: &str) -> Option<&str> {
    cookie
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("JWT="))
        .filter(|token| !token.is_empty())
}

/// Builds the cookie line persisted for a token.
pub fn cookie_for(token: &str) -> String {
    format!("{}={}; path=/; Secure", COOKIE_NAME, token)
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored token. A missing file means "not logged in".
    pub fn load(&self) -> Result<Option<String>, SubManagerError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(token_from_cookie(content.trim()).map(str::to_string)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, token: &str) -> Result<(), SubManagerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, cookie_for(token))?;
        tracing::debug!(path = %self.path.display(), "stored session cookie");
        Ok(())
    }

    /// Removes the cookie. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), SubManagerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "cleared session cookie");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_jwt_among_other_cookies() {
        assert_eq!(token_from_cookie("theme=dark; JWT=abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(token_from_cookie("JWT=xyz; path=/; Secure"), Some("xyz"));
        assert_eq!(token_from_cookie("theme=dark"), None);
        assert_eq!(token_from_cookie("JWT="), None);
        assert_eq!(token_from_cookie("NOTJWT=abc"), None);
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("cookie"));

        assert_eq!(store.load().unwrap(), None);

        store.save("token-123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("token-123"));
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "JWT=token-123; path=/; Secure"
        );

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }
}
