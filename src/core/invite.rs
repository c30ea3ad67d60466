use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::errors::SantaError;

pub const INVITE_CODE_LEN: usize = 6;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Six base-36 characters, always held upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InviteCode(String);

impl InviteCode {
    pub fn generate() -> Self {
        let mut bits = Uuid::new_v4().as_u128();
        let mut code = String::with_capacity(INVITE_CODE_LEN);
        for _ in 0..INVITE_CODE_LEN {
            code.push(ALPHABET[(bits % 36) as usize] as char);
            bits /= 36;
        }
        InviteCode(code.to_ascii_uppercase())
    }

    /// Accepts user input: surrounding whitespace is ignored and case folded.
    pub fn parse(input: &str) -> Result<Self, SantaError> {
        let code = input.trim().to_ascii_uppercase();
        if code.len() != INVITE_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SantaError::InvalidInviteCode);
        }
        Ok(InviteCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for InviteCode {
    type Err = SantaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InviteCode::parse(s)
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
