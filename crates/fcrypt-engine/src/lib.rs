//! fcrypt-engine: the streaming transform engine
//!
//! Drives one encrypt-or-decrypt operation end to end with bounded
//! memory: read a fixed-size chunk, feed it through the cipher transform,
//! write the result, report progress, repeat. The operation owns its
//! three streams and its key material for exactly one run; nothing is
//! retained across invocations.
//!
//! Key file contract (the one format other tools must honor):
//! ```text
//! <Base64(key-bytes)>\n
//! <Base64(IV-bytes)>\n
//! ```

pub mod engine;
pub mod keyfile;
pub mod progress;

pub use engine::{decrypt, encrypt, TransformOptions, DEFAULT_CHUNK_SIZE};
pub use progress::{Progress, ProgressFn};
