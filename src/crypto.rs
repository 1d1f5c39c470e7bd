use std::io::{self, Read, Write};

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CoreError;

type HmacSha256 = Hmac<Sha256>;

const BACKUP_KEY_ENV: &str = "MB_BACKUP_KEY_HEX";

/// Length of the MAC trailer appended to a backup file.
pub const MAC_LEN: usize = 32;

pub struct BackupKey(Zeroizing<[u8; 32]>);

impl BackupKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut key[..]);
        BackupKey(key)
    }

    pub fn from_hex(raw: &str) -> Result<Self, CoreError> {
        let bytes = Zeroizing::new(
            hex::decode(raw.trim()).map_err(|_| CoreError::Crypto("backup key is not valid hex".to_string()))?,
        );
        if bytes.len() != 32 {
            return Err(CoreError::Crypto("backup key must be 32 bytes".to_string()));
        }
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&bytes);
        Ok(BackupKey(key))
    }

    /// Reads the key from `MB_BACKUP_KEY_HEX`, if set.
    pub fn from_env() -> Result<Option<Self>, CoreError> {
        match std::env::var(BACKUP_KEY_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_hex(&raw).map(Some),
            _ => Ok(None),
        }
    }
}

/// Purpose-specific derived key.
pub struct DerivedKey(Zeroizing<[u8; 32]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Key purposes for HKDF domain separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Key for the MAC trailer over the frame stream
    FileMac,
}

impl KeyPurpose {
    fn info(&self) -> &'static [u8] {
        match self {
            KeyPurpose::FileMac => b"message-backup-file-mac-v1",
        }
    }
}

/// Derives a purpose-specific key from the backup key using HKDF-SHA256.
pub fn derive_key(key: &BackupKey, purpose: KeyPurpose) -> Result<DerivedKey, CoreError> {
    let hk = Hkdf::<Sha256>::new(None, key.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(purpose.info(), &mut okm)
        .map_err(|_| CoreError::Crypto("HKDF expand failed".to_string()))?;
    Ok(DerivedKey(Zeroizing::new(okm)))
}

fn file_mac_state(key: &BackupKey) -> Result<HmacSha256, CoreError> {
    let derived = derive_key(key, KeyPurpose::FileMac)?;
    <HmacSha256 as Mac>::new_from_slice(derived.as_bytes()).map_err(|_| CoreError::Crypto("invalid mac key".to_string()))
}

fn finalize(mac: HmacSha256) -> [u8; MAC_LEN] {
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

pub fn file_mac(key: &BackupKey, data: &[u8]) -> Result<[u8; MAC_LEN], CoreError> {
    let mut mac = file_mac_state(key)?;
    mac.update(data);
    Ok(finalize(mac))
}

/// Constant-time check of a MAC trailer.
pub fn verify_file_mac(key: &BackupKey, data: &[u8], expected: &[u8]) -> Result<bool, CoreError> {
    let mut mac = file_mac_state(key)?;
    mac.update(data);
    Ok(mac.verify_slice(expected).is_ok())
}

/// Checks the trailer of a stream whose last `MAC_LEN` bytes are the MAC
/// over everything before them. `len` is the total stream length.
pub fn verify_file_mac_stream(key: &BackupKey, mut source: impl Read, len: u64) -> Result<bool, CoreError> {
    if len < MAC_LEN as u64 {
        return Ok(false);
    }
    let mut mac = file_mac_state(key)?;
    let mut remaining = len - MAC_LEN as u64;
    let mut buf = [0u8; 8192];
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = source.read(&mut buf[..want])?;
        if n == 0 {
            return Ok(false);
        }
        mac.update(&buf[..n]);
        remaining -= n as u64;
    }
    let mut expected = [0u8; MAC_LEN];
    source.read_exact(&mut expected)?;
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Writer that MACs everything passing through it.
pub struct MacWriter<W: Write> {
    inner: W,
    mac: HmacSha256,
}

impl<W: Write> MacWriter<W> {
    pub fn new(key: &BackupKey, inner: W) -> Result<Self, CoreError> {
        Ok(Self {
            inner,
            mac: file_mac_state(key)?,
        })
    }

    /// Appends the MAC trailer and returns the inner writer.
    pub fn finish(mut self) -> Result<W, CoreError> {
        let tag = finalize(self.mac);
        self.inner.write_all(&tag)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for MacWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.mac.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_round_trip_and_tamper() {
        let key = BackupKey::generate();
        let mac = file_mac(&key, b"frames").expect("mac");
        assert!(verify_file_mac(&key, b"frames", &mac).expect("verify"));
        assert!(!verify_file_mac(&key, b"framez", &mac).expect("verify"));
    }

    #[test]
    fn mac_writer_matches_stream_check() {
        let key = BackupKey::from_hex(&"33".repeat(32)).expect("key");
        let mut writer = MacWriter::new(&key, Vec::new()).expect("writer");
        writer.write_all(b"header").expect("write");
        writer.write_all(b"frames").expect("write");
        let bytes = writer.finish().expect("finish");
        assert_eq!(bytes.len(), 12 + MAC_LEN);
        assert!(verify_file_mac_stream(&key, bytes.as_slice(), bytes.len() as u64).expect("verify"));

        let mut tampered = bytes.clone();
        tampered[0] ^= 1;
        assert!(!verify_file_mac_stream(&key, tampered.as_slice(), tampered.len() as u64).expect("verify"));
        let other = BackupKey::from_hex(&"44".repeat(32)).expect("key");
        assert!(!verify_file_mac_stream(&other, bytes.as_slice(), bytes.len() as u64).expect("verify"));
    }

    #[test]
    fn from_hex_rejects_short_keys() {
        assert!(BackupKey::from_hex("abcd").is_err());
        assert!(BackupKey::from_hex(&"11".repeat(32)).is_ok());
    }

    #[test]
    fn derived_key_differs_from_backup_key() {
        let key = BackupKey::from_hex(&"22".repeat(32)).expect("key");
        let derived = derive_key(&key, KeyPurpose::FileMac).expect("derive");
        assert_ne!(derived.as_bytes(), key.as_bytes());
    }
}
