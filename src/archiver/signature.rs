use subtle::ConstantTimeEq;

use crate::error::Result;
use crate::secrets::{MASTER_SIGNATURE, SecretStore};

/// Constant-time equality. Different lengths compare unequal immediately;
/// for equal lengths the time does not depend on where the inputs differ.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Compare `candidate` with the `master_signature` secret.
pub(crate) fn validate_signature(secrets: &dyn SecretStore, candidate: &str) -> Result<bool> {
    let reference = secrets.fetch(MASTER_SIGNATURE)?;
    let valid = constant_time_eq(candidate.as_bytes(), reference.expose().as_bytes());
    tracing::debug!(valid, len = candidate.len(), "signature checked");
    Ok(valid)
}
