mod error;

pub use error::{Error, Result};

use base64::Engine;
use chacha20poly1305::{
	ChaCha20Poly1305, Key, Nonce,
	aead::{Aead, AeadCore, KeyInit, OsRng},
};

const NONCE_LEN: usize = 12;

/// Authenticated encryption for provider secrets: ChaCha20-Poly1305 under a server-held
/// 32-byte master key, a fresh random nonce per row, blobs stored as
/// `base64(nonce || ciphertext)`.
///
/// Key rotation: build a `Cipher` for the old and the new key, decrypt every active credential
/// row under the old one and re-encrypt under the new one inside a single transaction. Rotation
/// is operator-driven and must not be auto-retried; a partial failure rolls back and surfaces.
pub struct Cipher {
	inner: ChaCha20Poly1305,
}
impl Cipher {
	pub fn new(master_key: [u8; 32]) -> Self {
		Self { inner: ChaCha20Poly1305::new(Key::from_slice(&master_key)) }
	}

	pub fn encrypt(&self, plaintext: &str) -> Result<String> {
		let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
		let ciphertext = self
			.inner
			.encrypt(&nonce, plaintext.as_bytes())
			.map_err(|_| Error::Encrypt)?;
		let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());

		blob.extend_from_slice(&nonce);
		blob.extend_from_slice(&ciphertext);

		Ok(base64::engine::general_purpose::STANDARD.encode(blob))
	}

	pub fn decrypt(&self, blob: &str) -> Result<String> {
		let raw = base64::engine::general_purpose::STANDARD
			.decode(blob)
			.map_err(|_| Error::Malformed { message: "Blob is not valid base64.".to_string() })?;

		if raw.len() <= NONCE_LEN {
			return Err(Error::Malformed {
				message: "Blob is too short to hold a nonce and ciphertext.".to_string(),
			});
		}

		let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
		let plaintext = self
			.inner
			.decrypt(Nonce::from_slice(nonce), ciphertext)
			.map_err(|_| Error::Decrypt)?;

		String::from_utf8(plaintext)
			.map_err(|_| Error::Malformed { message: "Plaintext is not UTF-8.".to_string() })
	}
}
