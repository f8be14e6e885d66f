use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// A plaintext password. The `Debug` impl is redacted so the value
/// never lands in logs.
#[derive(Clone)]
pub struct Password(String);

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash with Argon2id and a fresh random salt. The salt and the
    /// parameters are embedded in the PHC string.
    pub fn hash(&self) -> Result<PasswordHashString, anyhow::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(PasswordHashString(hash))
    }
}

/// A stored PHC-format hash string.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time verification of `password` against this hash.
    pub fn verify(&self, password: &Password) -> Result<(), anyhow::Error> {
        let parsed = PasswordHash::new(&self.0)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;
        Argon2::default()
            .verify_password(password.as_str().as_bytes(), &parsed)
            .map_err(|_| anyhow::anyhow!("Password verification failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_phc_string() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = password.hash().expect("Failed to hash password");

        assert!(!hash.as_str().is_empty());
        assert!(hash.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_verify_correct_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = password.hash().expect("Failed to hash password");

        assert!(hash.verify(&password).is_ok());
    }

    #[test]
    fn test_verify_incorrect_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = password.hash().expect("Failed to hash password");

        let wrong = Password::new("wrongPassword".to_string());
        assert!(hash.verify(&wrong).is_err());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash1 = password.hash().expect("Failed to hash password");
        let hash2 = password.hash().expect("Failed to hash password");

        // Random salt, so same password yields distinct hashes
        assert_ne!(hash1.as_str(), hash2.as_str());

        assert!(hash1.verify(&password).is_ok());
        assert!(hash2.verify(&password).is_ok());
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let password = Password::new("hunter2secret".to_string());
        let rendered = format!("{:?}", password);
        assert!(!rendered.contains("hunter2secret"));
    }
}
