//! Fixed table of supported cipher families, keyed by canonical name.

use fcrypt_core::{FcryptError, FcryptResult};

use crate::material::KeyMaterial;
use crate::transform::{self, CipherTransform};

/// The backing primitive for a registry entry.
///
/// The original tool exposed Rijndael alongside AES; at its default
/// 128-bit block size Rijndael *is* AES-256, so both entries share the
/// same backing cipher while keeping distinct canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherFamily {
    Aes,
    Des,
    Rc2,
    Rijndael,
}

/// Immutable description of one symmetric cipher family.
///
/// One static instance exists per supported family; [`resolve`] hands out
/// references at invocation time. The block length doubles as the IV
/// length.
#[derive(Debug, Clone, Copy)]
pub struct CipherSpec {
    name: &'static str,
    family: CipherFamily,
    key_len: usize,
    block_len: usize,
}

/// The closed set of supported families. No plugin mechanism; four
/// entries, canonical uppercase names.
pub const CIPHERS: [CipherSpec; 4] = [
    CipherSpec {
        name: "AES",
        family: CipherFamily::Aes,
        key_len: 32,
        block_len: 16,
    },
    CipherSpec {
        name: "DES",
        family: CipherFamily::Des,
        key_len: 8,
        block_len: 8,
    },
    CipherSpec {
        name: "RC2",
        family: CipherFamily::Rc2,
        key_len: 16,
        block_len: 8,
    },
    CipherSpec {
        name: "RIJNDAEL",
        family: CipherFamily::Rijndael,
        key_len: 32,
        block_len: 16,
    },
];

/// Look up a cipher family by name, case-insensitively.
///
/// Pure lookup with no side effects; `None` is the caller's cue to report
/// an unknown-algorithm error before touching any stream.
pub fn resolve(name: &str) -> Option<&'static CipherSpec> {
    CIPHERS.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}

impl CipherSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn family(&self) -> CipherFamily {
        self.family
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// IV length equals the block length for every supported family.
    pub fn iv_len(&self) -> usize {
        self.block_len
    }

    /// Fresh random key material sized for this family.
    pub fn generate_material(&self) -> KeyMaterial {
        KeyMaterial::generate(self.key_len, self.block_len)
    }

    /// Build an encrypting transform bound to `material`.
    pub fn encryptor(&self, material: &KeyMaterial) -> FcryptResult<Box<dyn CipherTransform>> {
        self.check_material(material)?;
        match self.family {
            CipherFamily::Aes | CipherFamily::Rijndael => {
                transform::cbc_encryptor::<aes::Aes256>(material)
            }
            CipherFamily::Des => transform::cbc_encryptor::<des::Des>(material),
            CipherFamily::Rc2 => transform::cbc_encryptor::<rc2::Rc2>(material),
        }
    }

    /// Build a decrypting transform bound to `material`.
    pub fn decryptor(&self, material: &KeyMaterial) -> FcryptResult<Box<dyn CipherTransform>> {
        self.check_material(material)?;
        match self.family {
            CipherFamily::Aes | CipherFamily::Rijndael => {
                transform::cbc_decryptor::<aes::Aes256>(material)
            }
            CipherFamily::Des => transform::cbc_decryptor::<des::Des>(material),
            CipherFamily::Rc2 => transform::cbc_decryptor::<rc2::Rc2>(material),
        }
    }

    /// Key and IV lengths must match this spec exactly before a transform
    /// is built, and therefore before any output byte is written.
    fn check_material(&self, material: &KeyMaterial) -> FcryptResult<()> {
        if material.key().len() != self.key_len {
            return Err(FcryptError::MalformedKeyMaterial(format!(
                "{} expects a {}-byte key, got {} bytes",
                self.name,
                self.key_len,
                material.key().len()
            )));
        }
        if material.iv().len() != self.block_len {
            return Err(FcryptError::MalformedKeyMaterial(format!(
                "{} expects a {}-byte IV, got {} bytes",
                self.name,
                self.block_len,
                material.iv().len()
            )));
        }
        Ok(())
    }
}
