//! The two-line Base64 key file: key on line 1, IV on line 2.
//!
//! Decoding tolerates a missing trailing newline and CRLF endings, but
//! rejects anything that is not exactly two standard-Base64 lines whose
//! decoded lengths match the cipher spec.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fcrypt_cipher::{CipherSpec, KeyMaterial};
use fcrypt_core::{FcryptError, FcryptResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use zeroize::Zeroize;

/// Serialize key material as two newline-terminated Base64 lines.
pub async fn write_material<W>(out: &mut W, material: &KeyMaterial) -> FcryptResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut text = format!(
        "{}\n{}\n",
        BASE64.encode(material.key()),
        BASE64.encode(material.iv())
    );
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    text.zeroize();
    Ok(())
}

/// Read exactly two Base64 lines and validate decoded lengths against
/// `spec`. Any defect fails with `MalformedKeyMaterial` before the caller
/// writes a single output byte.
pub async fn read_material<R>(key_in: R, spec: &CipherSpec) -> FcryptResult<KeyMaterial>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(key_in);
    let key = read_b64_line(&mut reader, "key", spec.key_len()).await?;
    let iv = read_b64_line(&mut reader, "IV", spec.iv_len()).await?;
    Ok(KeyMaterial::new(key, iv))
}

async fn read_b64_line<R>(
    reader: &mut BufReader<R>,
    what: &str,
    expected_len: usize,
) -> FcryptResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut raw = Vec::new();
    let n = reader.read_until(b'\n', &mut raw).await?;
    if n == 0 {
        return Err(FcryptError::MalformedKeyMaterial(format!(
            "missing {what} line"
        )));
    }
    while matches!(raw.last(), Some(b'\n') | Some(b'\r')) {
        raw.pop();
    }

    let text = std::str::from_utf8(&raw).map_err(|_| {
        FcryptError::MalformedKeyMaterial(format!("{what} line is not valid Base64 text"))
    })?;
    let decoded = BASE64.decode(text).map_err(|e| {
        FcryptError::MalformedKeyMaterial(format!("{what} line is not valid Base64: {e}"))
    });
    raw.zeroize();
    let mut decoded = decoded?;

    if decoded.len() != expected_len {
        let got = decoded.len();
        decoded.zeroize();
        return Err(FcryptError::MalformedKeyMaterial(format!(
            "{what} decodes to {got} bytes, expected {expected_len}"
        )));
    }
    Ok(decoded)
}
