//! Credential generation for provisioned database users.

use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

pub const USERNAME_LEN: usize = 12;
pub const PASSWORD_LEN: usize = 16;

const LEADING_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const TRAILING_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("length must be greater than 0")]
    ZeroLength,
}

/// A freshly generated username/password pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn generate() -> Result<Self, CredentialError> {
        Ok(Self {
            username: random_identifier(USERNAME_LEN)?,
            password: random_identifier(PASSWORD_LEN)?,
        })
    }
}

/// Random string from the OS CSPRNG.
///
/// The first character is a lowercase letter so the result is a valid
/// identifier on every engine; the rest are lowercase alphanumerics.
pub fn random_identifier(len: usize) -> Result<String, CredentialError> {
    if len == 0 {
        return Err(CredentialError::ZeroLength);
    }

    let mut rng = OsRng;
    let identifier = (0..len)
        .map(|i| {
            let charset = if i == 0 { LEADING_CHARSET } else { TRAILING_CHARSET };
            charset[rng.gen_range(0..charset.len())] as char
        })
        .collect();
    Ok(identifier)
}
