use crate::crypto;
use crate::{Error, Result};

/// Cryptographic context for one device: the session id and key issued by
/// the authentication handshake. Starts out on the vendor default key so
/// the handshake itself can be encrypted.
pub(crate) struct Session {
    device_id: [u8; 4],
    key: [u8; 16],
    authenticated: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            device_id: [0; 4],
            key: crypto::DEFAULT_KEY,
            authenticated: false,
        }
    }

    /// Drop back to the default key, as required before re-running the
    /// handshake.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn device_id(&self) -> [u8; 4] {
        self.device_id
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        crypto::encrypt(&self.key, plaintext)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        crypto::decrypt(&self.key, ciphertext)
    }

    /// Take the session id and key out of a decrypted auth response body:
    /// id at [0x00..0x04), key at [0x04..0x14).
    pub fn apply_auth_response(&mut self, body: &[u8]) -> Result<()> {
        if body.len() < 0x14 {
            return Err(Error::Protocol(format!(
                "auth response too short: {} bytes",
                body.len()
            )));
        }

        let mut key = [0u8; 16];
        key.copy_from_slice(&body[0x04..0x14]);
        if key.iter().all(|b| *b == 0) {
            return Err(Error::Auth);
        }

        self.device_id.copy_from_slice(&body[0x00..0x04]);
        self.key = key;
        self.authenticated = true;
        Ok(())
    }
}
