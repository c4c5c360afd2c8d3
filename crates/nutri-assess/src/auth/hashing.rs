/// One-way password hashing seam.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError>;
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(#[from] bcrypt::BcryptError);

/// bcrypt adapter. Cost is validated by config loading (4..=31).
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcrypt_hash_verifies_only_the_original_password() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("secret1").expect("hash");

        assert_ne!(hash, "secret1");
        assert!(hasher.verify("secret1", &hash).expect("verify"));
        assert!(!hasher.verify("secret2", &hash).expect("verify"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = BcryptHasher::new(4);
        assert!(hasher.verify("secret1", "not-a-hash").is_err());
    }
}
