//! Legacy MD5 fingerprints for PEM-encoded RSA private keys.
//!
//! CircleCI identifies deploy keys by the MD5 fingerprint of the public half,
//! written as colon-separated lowercase hex (`d5:70:7c:...`).

use md5::{Digest, Md5};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

use crate::error::ProviderError;

const PEM_END_PREFIX: &str = "-----END ";
const SSH_RSA: &[u8] = b"ssh-rsa";

/// Compute the legacy MD5 fingerprint of the public key matching a PKCS#1
/// PEM private key.
pub fn legacy_md5_fingerprint(private_key_pem: &str) -> Result<String, ProviderError> {
    let pem = single_pem_block(private_key_pem)?;
    let key = RsaPrivateKey::from_pkcs1_pem(pem)
        .map_err(|e| ProviderError::Validation(format!("invalid RSA private key: {}", e)))?;

    let blob = ssh_rsa_public_blob(&key);
    Ok(colon_hex(&Md5::digest(&blob)))
}

/// Lowercase hex with a colon between each byte.
fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Return the first PEM block, rejecting anything but whitespace after it.
fn single_pem_block(input: &str) -> Result<&str, ProviderError> {
    let start = input
        .find("-----BEGIN ")
        .ok_or_else(|| ProviderError::Validation("no PEM block found in private key".to_string()))?;
    let end_marker = input[start..]
        .find(PEM_END_PREFIX)
        .map(|i| start + i)
        .ok_or_else(|| ProviderError::Validation("unterminated PEM block in private key".to_string()))?;

    // The END line runs up to the closing dashes of its label.
    let after_label = end_marker + PEM_END_PREFIX.len();
    let end = input[after_label..]
        .find("-----")
        .map(|i| after_label + i + "-----".len())
        .ok_or_else(|| ProviderError::Validation("unterminated PEM block in private key".to_string()))?;

    let rest = input[end..].trim();
    if !rest.is_empty() {
        return Err(ProviderError::Validation(format!(
            "found {} stray bytes in private key",
            rest.len()
        )));
    }

    Ok(&input[start..end])
}

/// SSH wire encoding of an RSA public key: string "ssh-rsa", mpint e, mpint n.
fn ssh_rsa_public_blob(key: &RsaPrivateKey) -> Vec<u8> {
    let mut blob = Vec::new();
    put_string(&mut blob, SSH_RSA);
    put_mpint(&mut blob, &key.e().to_bytes_be());
    put_mpint(&mut blob, &key.n().to_bytes_be());
    blob
}

fn put_string(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buf.extend_from_slice(data);
}

fn put_mpint(buf: &mut Vec<u8>, magnitude: &[u8]) {
    let trimmed: &[u8] = match magnitude.iter().position(|&b| b != 0) {
        Some(i) => &magnitude[i..],
        None => &[],
    };
    if trimmed.first().is_some_and(|&b| b & 0x80 != 0) {
        buf.extend_from_slice(&((trimmed.len() + 1) as u32).to_be_bytes());
        buf.push(0);
        buf.extend_from_slice(trimmed);
    } else {
        put_string(buf, trimmed);
    }
}
