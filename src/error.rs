use thiserror::Error;

/// Error types for mnemonic and HD key derivation.
///
/// Messages never include entropy, seeds or key material.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Entropy source unavailable: {0}")]
    EntropySourceUnavailable(String),

    #[error("Invalid entropy length: {0} bytes (expected 16, 20, 24, 28 or 32)")]
    InvalidEntropyLength(usize),

    #[error("Unexpected whitespace in mnemonic phrase")]
    UnexpectedWhitespace,

    #[error("Invalid word count: {0} (expected 12, 15, 18, 21 or 24)")]
    InvalidWordCount(usize),

    #[error("Word not found in wordlist: {0}")]
    WordNotFound(String),

    #[error("Invalid mnemonic checksum")]
    InvalidMnemonicChecksum,

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("Invalid child key at index {index}, retry with the next index")]
    InvalidChildKey { index: u32 },

    #[error("Hardened derivation requires private key")]
    HardenedDerivationRequiresPrivateKey,

    #[error("Invalid extended key: {0}")]
    InvalidExtendedKey(String),

    #[error("Invalid base58check checksum")]
    InvalidChecksum,

    #[error("Base58 decoding error: {0}")]
    Base58DecodeError(String),

    #[error("Unsupported address scheme: {0}")]
    UnsupportedAddressScheme(String),

    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}
