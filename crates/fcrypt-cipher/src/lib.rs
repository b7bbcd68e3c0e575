//! fcrypt-cipher: the algorithm registry and CBC byte transforms
//!
//! A closed set of four symmetric cipher families, looked up by
//! case-insensitive canonical name:
//!
//! ```text
//! name      backing cipher   key   block/IV
//! AES       AES-256          32    16
//! DES       DES              8     8
//! RC2       RC2-128          16    8
//! RIJNDAEL  AES-256          32    16
//! ```
//!
//! All families run in CBC mode with PKCS#7 padding. A [`CipherSpec`]
//! builds encrypting/decrypting [`CipherTransform`]s from a
//! [`KeyMaterial`]; the transform carries the chaining state across
//! chunks so callers can stream arbitrarily large inputs.

pub mod material;
pub mod registry;
pub mod transform;

pub use material::KeyMaterial;
pub use registry::{resolve, CipherFamily, CipherSpec, CIPHERS};
pub use transform::CipherTransform;
