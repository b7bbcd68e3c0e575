//! End-to-end round-trips over real files, the way the CLI drives the
//! engine: open input/output/key files, stream, compare.

use fcrypt_cipher::resolve;
use fcrypt_core::FcryptError;
use fcrypt_engine::{decrypt, encrypt, TransformOptions};
use std::path::Path;
use tempfile::TempDir;

fn write_test_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

#[tokio::test]
async fn file_to_file_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let spec = resolve("AES").unwrap();

    let original: Vec<u8> = (0..300_000u32).map(|i| (i % 256) as u8).collect();
    let plain_path = write_test_file(tmp.path(), "document.bin", &original);
    let cipher_path = tmp.path().join("document.bin.enc");
    let key_path = tmp.path().join("document.bin.enc.key");
    let out_path = tmp.path().join("document.out");

    let input = tokio::fs::File::open(&plain_path).await.unwrap();
    let total = input.metadata().await.unwrap().len();
    let output = tokio::fs::File::create(&cipher_path).await.unwrap();
    let key_out = tokio::fs::File::create(&key_path).await.unwrap();

    encrypt(
        spec,
        input,
        output,
        key_out,
        &TransformOptions {
            total_len: Some(total),
            ..TransformOptions::default()
        },
    )
    .await
    .expect("encrypt should succeed");

    // Ciphertext on disk differs from the plaintext and is block-aligned.
    let ciphertext = std::fs::read(&cipher_path).unwrap();
    assert_ne!(ciphertext, original);
    assert_eq!(ciphertext.len() % spec.block_len(), 0);

    let input = tokio::fs::File::open(&cipher_path).await.unwrap();
    let output = tokio::fs::File::create(&out_path).await.unwrap();
    let key_in = tokio::fs::File::open(&key_path).await.unwrap();

    decrypt(spec, input, output, key_in, &TransformOptions::default())
        .await
        .expect("decrypt should succeed");

    assert_eq!(std::fs::read(&out_path).unwrap(), original);
}

#[tokio::test]
async fn decrypt_with_wrong_algorithms_key_file_fails_before_output() {
    let tmp = TempDir::new().unwrap();

    // Encrypt with DES, then present its 8-byte key to the AES spec.
    let des = resolve("DES").unwrap();
    let plain_path = write_test_file(tmp.path(), "note.txt", b"short secret note");
    let cipher_path = tmp.path().join("note.enc");
    let key_path = tmp.path().join("note.enc.key");

    encrypt(
        des,
        tokio::fs::File::open(&plain_path).await.unwrap(),
        tokio::fs::File::create(&cipher_path).await.unwrap(),
        tokio::fs::File::create(&key_path).await.unwrap(),
        &TransformOptions::default(),
    )
    .await
    .unwrap();

    let aes = resolve("AES").unwrap();
    let out_path = tmp.path().join("note.out");
    let err = decrypt(
        aes,
        tokio::fs::File::open(&cipher_path).await.unwrap(),
        tokio::fs::File::create(&out_path).await.unwrap(),
        tokio::fs::File::open(&key_path).await.unwrap(),
        &TransformOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FcryptError::MalformedKeyMaterial(_)));
    assert_eq!(std::fs::metadata(&out_path).unwrap().len(), 0);
}
