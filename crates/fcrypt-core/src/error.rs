use thiserror::Error;

pub type FcryptResult<T> = Result<T, FcryptError>;

/// Failure modes of a transform operation.
///
/// Every error is returned as a typed result to the immediate caller; the
/// engine never retries. A failed decrypt may have written plaintext to the
/// output stream before the failure was detected; callers own cleanup of
/// the partial file.
#[derive(Debug, Error)]
pub enum FcryptError {
    /// Requested cipher name is not in the registry. Raised before any
    /// stream I/O happens.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Key file missing a line, not valid Base64, or decoding to a length
    /// that disagrees with the cipher's key/IV size. Raised before any
    /// output bytes are written.
    #[error("malformed key material: {0}")]
    MalformedKeyMaterial(String),

    /// Padding or block-alignment failure while finalizing a decrypt.
    #[error("corrupt ciphertext: {0}")]
    CorruptCiphertext(String),

    /// Read/write failure on one of the three streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller-requested cancellation observed between chunks.
    #[error("operation cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),
}
