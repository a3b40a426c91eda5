//! Cryptographically secure entropy generation.
//!
//! Thin wrapper around the operating system CSPRNG. Length policy for
//! mnemonics lives in [`crate::bip39::MnemonicType`], not here.

use crate::error::Error;
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate `byte_length` random bytes from the OS CSPRNG.
///
/// Fails with [`Error::EntropySourceUnavailable`] if the underlying
/// randomness source reports an error. Never falls back to a
/// non-cryptographic generator.
pub fn generate(byte_length: usize) -> Result<Vec<u8>, Error> {
    let mut entropy = vec![0u8; byte_length];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| Error::EntropySourceUnavailable(e.to_string()))?;
    Ok(entropy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        for len in [16, 20, 24, 28, 32] {
            assert_eq!(generate(len).unwrap().len(), len);
        }
    }

    #[test]
    fn consecutive_outputs_differ() {
        // 32 random bytes colliding would mean the CSPRNG is broken.
        let a = generate(32).unwrap();
        let b = generate(32).unwrap();
        assert_ne!(a, b);
    }
}
