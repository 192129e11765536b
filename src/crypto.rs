use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Well-known key every device ships with; replaced by the session key
/// after a successful handshake.
pub(crate) const DEFAULT_KEY: [u8; 16] = [
    0x09, 0x76, 0x28, 0x34, 0x3f, 0xe9, 0x9e, 0x23, 0x76, 0x5c, 0x15, 0x13, 0xac, 0xcf, 0x8b,
    0x02,
];

/// Fixed vendor IV, used for every exchange regardless of key.
pub(crate) const IV: [u8; 16] = [
    0x56, 0x2e, 0x17, 0x99, 0x6d, 0x09, 0x3d, 0x28, 0xdd, 0xb3, 0xba, 0x69, 0x5a, 0x2e, 0x6f,
    0x58,
];

const BLOCK: usize = 16;

/// AES-128-CBC encrypt with zero padding to the block size. The frame's
/// length field carries the true payload length, so the receiver trims
/// the padding after decryption.
pub(crate) fn encrypt(key: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let mut padded = plaintext.to_vec();
    let rem = padded.len() % BLOCK;
    if rem != 0 {
        padded.resize(padded.len() + BLOCK - rem, 0);
    }
    Aes128CbcEnc::new(key.into(), (&IV).into()).encrypt_padded_vec_mut::<NoPadding>(&padded)
}

pub(crate) fn decrypt(key: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK != 0 {
        return Err(Error::Protocol(format!(
            "ciphertext length {} is not a multiple of the block size",
            ciphertext.len()
        )));
    }
    Aes128CbcDec::new(key.into(), (&IV).into())
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| Error::Protocol("block decryption failed".to_string()))
}
