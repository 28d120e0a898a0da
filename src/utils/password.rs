//! Hashing de contraseñas con bcrypt

use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, self.cost).map_err(|e| AppError::Hash(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> AppResult<bool> {
        bcrypt::verify(password, hash).map_err(|e| AppError::Hash(e.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
