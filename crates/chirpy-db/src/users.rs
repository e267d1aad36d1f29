use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use tracing::{debug, warn};

use chirpy_types::models::User;

use crate::models::Document;
use crate::{Database, DbError, Result};

const REFRESH_TOKEN_BYTES: usize = 32;
const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

impl Database {
    // -- Users --

    pub fn create_user(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        // Hash before taking the lock; argon2 is deliberately slow.
        let password_hash = hash_password(password)?;

        let user = self.write(|doc| {
            if find_by_email(doc, email).is_some() {
                return Err(DbError::Conflict(format!(
                    "a user with email {email} already exists"
                )));
            }

            let user = User {
                id: doc.next_user_id()?,
                email: email.to_string(),
                password_hash,
                refresh_token: None,
                refresh_token_expiry: None,
                is_upgraded: false,
            };
            doc.users.insert(user.id, user.clone());
            Ok(user)
        })?;

        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Check credentials and issue a fresh refresh token valid for 60 days.
    ///
    /// The password is verified outside the lock; only a successful login
    /// takes the exclusive side, and it re-checks that the hash is unchanged.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let (id, password_hash) = self.read(|doc| {
            find_by_email(doc, email)
                .and_then(|id| doc.users.get(&id))
                .map(|u| (u.id, u.password_hash.clone()))
                .ok_or_else(|| {
                    warn!("login attempt for unknown email");
                    DbError::Auth
                })
        })?;

        if !verify_password(password, &password_hash)? {
            warn!(user_id = id, "login attempt with wrong password");
            return Err(DbError::Auth);
        }

        self.write(|doc| {
            // Password changed or user removed since the check.
            let user = doc
                .users
                .get_mut(&id)
                .filter(|u| u.password_hash == password_hash)
                .ok_or(DbError::Auth)?;

            user.refresh_token = Some(generate_refresh_token());
            user.refresh_token_expiry = Some(Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS));
            debug!(user_id = id, "refresh token issued");
            Ok(user.clone())
        })
    }

    /// Change email and/or password. Empty values are left unchanged.
    pub fn update_user(
        &self,
        user_id: u64,
        new_email: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<User> {
        let new_email = new_email.map(str::trim).filter(|e| !e.is_empty());
        let password_hash = new_password
            .filter(|p| !p.is_empty())
            .map(hash_password)
            .transpose()?;

        self.write(|doc| {
            if !doc.users.contains_key(&user_id) {
                return Err(DbError::NotFound(format!("user {user_id}")));
            }

            if let Some(email) = new_email {
                if find_by_email(doc, email).is_some_and(|owner| owner != user_id) {
                    return Err(DbError::Conflict(format!(
                        "a user with email {email} already exists"
                    )));
                }
            }

            let user = doc
                .users
                .get_mut(&user_id)
                .ok_or_else(|| DbError::NotFound(format!("user {user_id}")))?;
            if let Some(email) = new_email {
                user.email = email.to_string();
            }
            if let Some(hash) = password_hash {
                user.password_hash = hash;
            }

            debug!(user_id, "user updated");
            Ok(user.clone())
        })
    }

    /// Clear the token and expire it now. Unknown tokens are ignored.
    pub fn revoke_refresh_token(&self, token: &str) -> Result<()> {
        self.write(|doc| {
            if let Some(user) = doc
                .users
                .values_mut()
                .find(|u| token_matches(u, token))
            {
                user.refresh_token = None;
                user.refresh_token_expiry = Some(Utc::now());
                debug!(user_id = user.id, "refresh token revoked");
            }
            Ok(())
        })
    }

    /// Look up the owner of a refresh token. `None` means no user holds it;
    /// expiry is left for the caller to judge.
    pub fn get_user_by_refresh_token(&self, token: &str) -> Result<Option<User>> {
        self.read(|doc| Ok(doc.users.values().find(|u| token_matches(u, token)).cloned()))
    }

    pub fn upgrade_user(&self, user_id: u64) -> Result<()> {
        self.write(|doc| {
            let user = doc
                .users
                .get_mut(&user_id)
                .ok_or_else(|| DbError::NotFound(format!("user {user_id}")))?;
            user.is_upgraded = true;
            Ok(())
        })?;

        debug!(user_id, "user upgraded");
        Ok(())
    }
}

fn find_by_email(doc: &Document, email: &str) -> Option<u64> {
    let wanted = email.trim().to_lowercase();
    doc.users
        .values()
        .find(|u| u.email.trim().to_lowercase() == wanted)
        .map(|u| u.id)
}

fn token_matches(user: &User, token: &str) -> bool {
    !token.is_empty()
        && user
            .refresh_token
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(token))
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
