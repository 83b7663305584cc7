use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{ArchiveError, Result};

pub(crate) const SESSION_PREFIX: &str = "SESSION_";
/// 128 bits
const SESSION_ID_BYTES: usize = 16;

/// `SESSION_` followed by 32 lowercase hex digits from the OS CSPRNG.
pub(crate) fn generate_session_id() -> Result<String> {
    generate_with(&mut OsRng)
}

pub(crate) fn generate_with(rng: &mut dyn RngCore) -> Result<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| ArchiveError::EntropyUnavailable(e.to_string()))?;
    Ok(format!("{SESSION_PREFIX}{}", hex::encode(bytes)))
}
