use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Prefix of the legacy stored-password format.
pub const LEGACY_PREFIX: &str = "hashed_";

/// How new passwords are stored.
///
/// `Legacy` stores `hashed_<plaintext>` and exists only for compatibility with
/// databases written by the old service. It is not a hash and offers no
/// protection. `Argon2` stores a salted PHC string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordScheme {
    Legacy,
    #[default]
    Argon2,
}

impl std::str::FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "argon2" => Ok(Self::Argon2),
            other => anyhow::bail!("unknown PASSWORD_SCHEME {other:?}, expected legacy or argon2"),
        }
    }
}

impl PasswordScheme {
    pub fn hash(self, plain: &str) -> anyhow::Result<String> {
        match self {
            Self::Legacy => Ok(format!("{LEGACY_PREFIX}{plain}")),
            Self::Argon2 => hash_argon2(plain),
        }
    }
}

fn hash_argon2(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Checks `plain` against a stored value of either scheme.
///
/// The scheme is picked from the stored value itself, so records written under
/// different `PASSWORD_SCHEME` settings keep working.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    if let Some(rest) = stored.strip_prefix(LEGACY_PREFIX) {
        return Ok(rest == plain);
    }
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_scheme_prefixes_plaintext() {
        let stored = PasswordScheme::Legacy.hash("pw1").unwrap();
        assert_eq!(stored, "hashed_pw1");
        assert!(verify_password("pw1", &stored).unwrap());
        assert!(!verify_password("pw2", &stored).unwrap());
    }

    #[test]
    fn argon2_hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = PasswordScheme::Argon2.hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn argon2_salts_each_hash() {
        let a = PasswordScheme::Argon2.hash("same").unwrap();
        let b = PasswordScheme::Argon2.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("Legacy".parse::<PasswordScheme>().unwrap(), PasswordScheme::Legacy);
        assert_eq!(" argon2 ".parse::<PasswordScheme>().unwrap(), PasswordScheme::Argon2);
        assert!("bcrypt".parse::<PasswordScheme>().is_err());
    }
}
