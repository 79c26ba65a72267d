//! Staff passes.
//!
//! A successful staff login issues a pass for one store: the hex HMAC-SHA256
//! of `staff:<store_id>` under a server-side key. Every `/admin/*` request
//! carries `store_id` and `pass`, and a pass only verifies for the store it
//! was issued for.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct StaffKey {
    mac: HmacSha256,
}

impl std::fmt::Debug for StaffKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaffKey(<REDACTED>)")
    }
}

impl StaffKey {
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| anyhow!("staff pass key rejected: {e}"))?;
        Ok(Self { mac })
    }

    /// Per-process key. Passes it issued stop verifying after a restart.
    pub fn random() -> Result<Self> {
        let mut secret = Vec::with_capacity(32);
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        Self::from_secret(&secret)
    }

    fn keyed(&self, store_id: i32) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("staff:{store_id}").as_bytes());
        mac
    }

    pub fn issue(&self, store_id: i32) -> String {
        hex::encode(self.keyed(store_id).finalize().into_bytes())
    }

    /// Constant-time check of `pass` against the pass for `store_id`.
    pub fn verify(&self, store_id: i32, pass: &str) -> bool {
        match hex::decode(pass.trim()) {
            Ok(bytes) => self.keyed(store_id).verify_slice(&bytes).is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_verifies_only_for_its_store() {
        let key = StaffKey::from_secret(b"unit-test-key").unwrap();
        let pass = key.issue(3);
        assert_eq!(pass.len(), 64);
        assert!(key.verify(3, &pass));
        assert!(!key.verify(4, &pass));
    }

    #[test]
    fn pass_from_another_key_is_rejected() {
        let a = StaffKey::from_secret(b"key-a").unwrap();
        let b = StaffKey::from_secret(b"key-b").unwrap();
        assert!(!b.verify(3, &a.issue(3)));
    }

    #[test]
    fn garbage_and_empty_passes_are_rejected() {
        let key = StaffKey::random().unwrap();
        assert!(!key.verify(3, ""));
        assert!(!key.verify(3, "not-hex"));
        assert!(!key.verify(3, "abcd"));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = StaffKey::from_secret(b"super-secret").unwrap();
        assert!(!format!("{key:?}").contains("super-secret"));
    }
}
