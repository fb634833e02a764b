//! User accounts backed by a single JSON file
//!
//! `<data_dir>/user_data/users.json` maps username to password hash and
//! creation time, matching the original front-end's file layout. Passwords
//! are hashed with argon2id. Accounts are created at registration and never
//! updated afterwards.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::utils::write_atomic;

/// One stored account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Password hash in PHC string format; key kept from the original file
    #[serde(rename = "password")]
    pub password_hash: String,
    /// Registration time, RFC 3339
    pub created_at: String,
}

/// Registry of user accounts
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Create a store rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join("user_data").join("users.json"),
        }
    }

    /// Register a new account
    pub fn register(&self, username: &str, password: &str) -> crate::Result<()> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(crate::Error::Validation(
                "username and password must not be empty".to_string(),
            ));
        }

        let mut users = self.load_users()?;
        if users.contains_key(username) {
            return Err(crate::Error::User(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| crate::Error::User(format!("failed to hash password: {}", e)))?
            .to_string();

        users.insert(
            username.to_string(),
            UserRecord {
                password_hash,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.save_users(&users)
    }

    /// Check a password against the stored hash.
    ///
    /// An unknown username, unreadable store, or malformed hash all come
    /// back as a plain "no"; callers cannot tell the cases apart.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let users = match self.load_users() {
            Ok(users) => users,
            Err(e) => {
                warn!("Failed to read user store: {}", e);
                return false;
            }
        };

        let Some(record) = users.get(username.trim()) else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(&record.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Whether an account exists
    pub fn exists(&self, username: &str) -> bool {
        self.load_users()
            .map(|users| users.contains_key(username.trim()))
            .unwrap_or(false)
    }

    fn load_users(&self) -> crate::Result<BTreeMap<String, UserRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let users = serde_json::from_str(&content)?;
        Ok(users)
    }

    fn save_users(&self, users: &BTreeMap<String, UserRecord>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(users)?;
        write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }
}
