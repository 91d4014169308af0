pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to encrypt secret.")]
	Encrypt,
	/// AEAD verification failed: the ciphertext was corrupted or the master key is wrong.
	/// Distinct from "no credential stored".
	#[error("Failed to decrypt stored ciphertext: corrupted data or wrong master key.")]
	Decrypt,
	#[error("Malformed ciphertext blob: {message}")]
	Malformed { message: String },
}
