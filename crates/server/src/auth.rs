//! Bearer credential check.

use crate::error::ServerError;
use subtle::ConstantTimeEq;

/// Validates `Authorization` header values against the configured secret.
///
/// The full header value is compared with `Bearer <secret>` in constant time,
/// so response latency does not reveal how many leading bytes matched.
#[derive(Clone)]
pub struct AuthGuard {
    expected: Vec<u8>,
}

impl AuthGuard {
    pub fn new(secret: &str) -> Self {
        Self {
            expected: format!("Bearer {secret}").into_bytes(),
        }
    }

    /// `Ok(())` when `header` is exactly `Bearer <secret>`.
    pub fn authorize(&self, header: Option<&[u8]>) -> Result<(), ServerError> {
        let Some(presented) = header else {
            return Err(ServerError::Authentication(
                "missing Authorization header; expected 'Bearer <key>'".to_string(),
            ));
        };

        if bool::from(presented.ct_eq(self.expected.as_slice())) {
            Ok(())
        } else {
            Err(ServerError::Authentication("invalid API key".to_string()))
        }
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard").finish_non_exhaustive()
    }
}
