//! Key and IV bytes for one transform operation. Zeroized on drop.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A key byte sequence and an IV byte sequence, sized per [`CipherSpec`].
///
/// Generated fresh on encryption, loaded verbatim from the key file on
/// decryption. Owned by exactly one operation and never reused; the
/// backing buffers are zeroized when the value drops.
///
/// [`CipherSpec`]: crate::registry::CipherSpec
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(key: Vec<u8>, iv: Vec<u8>) -> Self {
        Self { key, iv }
    }

    /// Fresh random material from the OS CSPRNG.
    pub fn generate(key_len: usize, iv_len: usize) -> Self {
        let mut key = vec![0u8; key_len];
        let mut iv = vec![0u8; iv_len];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}
