//! Chunked read→transform→write loop for one operation.
//!
//! One operation runs on one task and suspends at each read/write
//! boundary. Chunks are processed strictly in input order with at most
//! one chunk in flight; CBC chaining state makes reordering unsound.
//! Cancellation is observed between chunks; key material is dropped
//! (zeroized) on every exit path, and owned streams close when they drop.

use fcrypt_cipher::{CipherSpec, CipherTransform};
use fcrypt_core::{FcryptError, FcryptResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::keyfile;
use crate::progress::{Progress, ProgressFn};

/// Default chunk size: large enough to amortize per-call overhead, small
/// enough to bound memory independent of input size.
pub const DEFAULT_CHUNK_SIZE: usize = 100 * 1024;

/// Per-operation tuning handed in by the caller.
pub struct TransformOptions<'a> {
    /// Bytes read per cycle (default 100 KiB).
    pub chunk_size: usize,
    /// Total input size when known; `None` yields indeterminate progress.
    pub total_len: Option<u64>,
    /// Invoked after each chunk, on the operation's own task.
    pub progress: Option<&'a ProgressFn>,
    /// Checked between chunks; cancelling yields `FcryptError::Cancelled`.
    pub cancel: CancellationToken,
}

impl Default for TransformOptions<'_> {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            total_len: None,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// Encrypt `input` into `output`, writing fresh key material to `key_out`.
///
/// Generates a random key and IV sized for `spec`, streams the input
/// through the encrypting transform, finalizes the padding, shuts the
/// output down, and only then serializes the key file. A key file on
/// disk therefore always describes a completely written ciphertext.
pub async fn encrypt<R, W, K>(
    spec: &'static CipherSpec,
    mut input: R,
    mut output: W,
    mut key_out: K,
    opts: &TransformOptions<'_>,
) -> FcryptResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    K: AsyncWrite + Unpin,
{
    let material = spec.generate_material();
    let transform = spec.encryptor(&material)?;
    let processed = run_stream(transform, &mut input, &mut output, opts).await?;

    keyfile::write_material(&mut key_out, &material).await?;
    key_out.shutdown().await?;

    debug!(algorithm = spec.name(), bytes = processed, "encrypt complete");
    Ok(())
}

/// Decrypt `input` into `output` using key material read from `key_in`.
///
/// The key file is read and validated in full before the first output
/// byte; a padding failure at the end surfaces as `CorruptCiphertext`,
/// and plaintext already written stays written. The caller owns cleanup
/// of the partial file.
pub async fn decrypt<R, W, K>(
    spec: &'static CipherSpec,
    mut input: R,
    mut output: W,
    key_in: K,
    opts: &TransformOptions<'_>,
) -> FcryptResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    K: AsyncRead + Unpin,
{
    let material = keyfile::read_material(key_in, spec).await?;
    let transform = spec.decryptor(&material)?;
    let processed = run_stream(transform, &mut input, &mut output, opts).await?;

    debug!(algorithm = spec.name(), bytes = processed, "decrypt complete");
    Ok(())
}

/// The shared chunk loop. Returns cumulative input bytes processed.
async fn run_stream<R, W>(
    mut transform: Box<dyn CipherTransform>,
    input: &mut R,
    output: &mut W,
    opts: &TransformOptions<'_>,
) -> FcryptResult<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let chunk_size = opts.chunk_size.max(1);
    let mut buf = vec![0u8; chunk_size];
    let mut processed: u64 = 0;
    let mut chunks: u64 = 0;

    loop {
        if opts.cancel.is_cancelled() {
            return Err(FcryptError::Cancelled);
        }
        let n = read_chunk(input, &mut buf).await?;
        if n == 0 {
            break;
        }
        let ready = transform.update(&buf[..n]);
        if !ready.is_empty() {
            output.write_all(&ready).await?;
        }
        processed += n as u64;
        chunks += 1;
        emit(opts, processed);
    }

    let tail = transform.finalize()?;
    if !tail.is_empty() {
        output.write_all(&tail).await?;
    }
    output.flush().await?;
    output.shutdown().await?;

    if chunks == 0 {
        // Zero-length input still reports completion exactly once.
        emit(opts, 0);
    }

    debug!(bytes = processed, chunks, "stream finalized");
    Ok(processed)
}

/// Fill `buf` as far as the source allows; a short count means EOF.
/// Reading whole chunks keeps the progress cadence at one callback per
/// `chunk_size` bytes regardless of how the source fragments reads.
async fn read_chunk<R>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn emit(opts: &TransformOptions<'_>, processed: u64) {
    if let Some(callback) = opts.progress {
        callback(signal(processed, opts.total_len));
    }
}

fn signal(processed: u64, total: Option<u64>) -> Progress {
    match total {
        Some(0) => Progress::Fraction(1.0),
        Some(total) => Progress::Fraction((processed as f64 / total as f64).min(1.0)),
        None => Progress::Indeterminate(processed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_zero_total_is_complete() {
        assert_eq!(signal(0, Some(0)), Progress::Fraction(1.0));
    }

    #[test]
    fn test_signal_clamps_overshoot() {
        // A caller-supplied total smaller than reality must not push the
        // fraction past 1.0.
        assert_eq!(signal(300, Some(200)), Progress::Fraction(1.0));
    }

    #[test]
    fn test_signal_unknown_total_is_indeterminate() {
        assert_eq!(signal(512, None), Progress::Indeterminate(512));
    }
}
