use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, users};

/// Member data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub year: String,
    pub company: String,
    pub bio: String,
}

impl From<users::Model> for Member {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            year: model.year,
            company: model.company,
            bio: model.bio,
        }
    }
}

/// Fields for a new member; `email` must already be trimmed and lowercased,
/// `password_hash` is the opaque Argon2 output.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub year: String,
    pub company: String,
    pub bio: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, member: NewMember) -> Result<i32> {
        let active = users::ActiveModel {
            name: Set(member.name),
            email: Set(member.email),
            password_hash: Set(member.password_hash),
            year: Set(member.year),
            company: Set(member.company),
            bio: Set(member.bio),
            ..Default::default()
        };

        let res = Users::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(res.last_insert_id)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Member>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(Member::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Member>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(Member::from))
    }

    /// Verify password for a member identified by email. An unknown email
    /// verifies false, indistinguishable from a wrong password.
    /// Note: uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Substring search over name, company and graduation year, capped at
    /// `limit` rows. A blank query matches nothing.
    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<Member>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Name.contains(query))
                    .add(users::Column::Company.contains(query))
                    .add(users::Column::Year.contains(query)),
            )
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to search users")?;

        Ok(rows.into_iter().map(Member::from).collect())
    }
}

/// Hash a password using Argon2id with optional custom params.
/// The embedded random salt makes two hashes of the same password differ.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::PasswordVerifier;

    fn fast_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn hashes_of_same_password_differ_and_both_verify() {
        let cfg = fast_params();
        let a = hash_password("pw123", Some(&cfg)).unwrap();
        let b = hash_password("pw123", Some(&cfg)).unwrap();

        assert_ne!(a, b, "salted hashes must not repeat");

        for hash in [&a, &b] {
            let parsed = PasswordHash::new(hash).unwrap();
            assert!(
                Argon2::default()
                    .verify_password(b"pw123", &parsed)
                    .is_ok()
            );
        }
    }

    #[test]
    fn hash_is_not_plaintext() {
        let hash = hash_password("hunter2", Some(&fast_params())).unwrap();
        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = hash_password("correct", Some(&fast_params())).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"incorrect", &parsed)
                .is_err()
        );
    }
}
