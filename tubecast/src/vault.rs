//! Password hashing for channels with `Basic` access policy.
//!
//! Passwords are stored only as salted scrypt PHC strings; verifying a
//! password against its stored digest is the only equality check available.

use crate::{Error, ErrorKind, Result};

const PASSWORD_MAX_LENGTH: usize = 128;

pub fn hash_password(password: &str) -> Result<String> {
    use scrypt::password_hash::PasswordHasher;

    validate_password(password)?;
    let salt =
        scrypt::password_hash::SaltString::generate(&mut scrypt::password_hash::rand_core::OsRng);
    let password_hash = scrypt::Scrypt
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::with_source(ErrorKind::Internal, "failed to hash password", e))?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<()> {
    use scrypt::password_hash::PasswordVerifier;

    let parsed_hash = scrypt::password_hash::PasswordHash::new(password_hash)
        .map_err(|e| Error::with_source(ErrorKind::Internal, "invalid password hash", e))?;
    scrypt::Scrypt
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|e| Error::with_source(ErrorKind::Unauthorized, "invalid password", e))
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::new(ErrorKind::Invalid, "password must not be empty"));
    }
    if password.len() > PASSWORD_MAX_LENGTH {
        return Err(Error::new(
            ErrorKind::Invalid,
            format!(
                "password is too long (maximum length is {} characters)",
                PASSWORD_MAX_LENGTH
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        verify_password("hunter22", &hash).unwrap();
        assert!(verify_password("hunter23", &hash).is_err());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("hunter22").unwrap();
        let second = hash_password("hunter22").unwrap();
        assert_ne!(first, second);
        verify_password("hunter22", &first).unwrap();
        verify_password("hunter22", &second).unwrap();
    }

    #[test]
    fn empty_password_rejected() {
        assert!(hash_password("").is_err());
    }
}
