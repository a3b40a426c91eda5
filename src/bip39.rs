//! BIP-39 mnemonic encoding and seed derivation.
//!
//! Entropy is mapped to a phrase of wordlist words with an appended
//! SHA-256 checksum, and phrases are stretched into 64-byte seeds with
//! PBKDF2-HMAC-SHA512. Decoding always recomputes and verifies the
//! checksum.

use crate::entropy;
use crate::error::Error;
use crate::wordlist;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// PBKDF2 iteration count fixed by BIP-39
const PBKDF2_ITERATIONS: u32 = 2048;

/// Mnemonic length, tied to the entropy size it encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicType {
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl MnemonicType {
    /// Number of entropy bits encoded by this mnemonic length
    pub fn entropy_bits(&self) -> usize {
        match self {
            MnemonicType::Words12 => 128,
            MnemonicType::Words15 => 160,
            MnemonicType::Words18 => 192,
            MnemonicType::Words21 => 224,
            MnemonicType::Words24 => 256,
        }
    }

    /// Number of entropy bytes encoded by this mnemonic length
    pub fn entropy_bytes(&self) -> usize {
        self.entropy_bits() / 8
    }

    /// Number of checksum bits appended to the entropy
    pub fn checksum_bits(&self) -> usize {
        self.entropy_bits() / 32
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        (self.entropy_bits() + self.checksum_bits()) / 11
    }

    /// Determine the mnemonic type from a word count
    pub fn from_word_count(count: usize) -> Result<Self, Error> {
        match count {
            12 => Ok(MnemonicType::Words12),
            15 => Ok(MnemonicType::Words15),
            18 => Ok(MnemonicType::Words18),
            21 => Ok(MnemonicType::Words21),
            24 => Ok(MnemonicType::Words24),
            other => Err(Error::InvalidWordCount(other)),
        }
    }

    /// Determine the mnemonic type from an entropy length in bytes
    pub fn from_entropy_len(len: usize) -> Result<Self, Error> {
        match len {
            16 => Ok(MnemonicType::Words12),
            20 => Ok(MnemonicType::Words15),
            24 => Ok(MnemonicType::Words18),
            28 => Ok(MnemonicType::Words21),
            32 => Ok(MnemonicType::Words24),
            other => Err(Error::InvalidEntropyLength(other)),
        }
    }
}

/// Wordlist language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
}

impl Language {
    /// Get the wordlist for this language
    pub fn wordlist(&self) -> &'static [&'static str; 2048] {
        match self {
            Language::English => &wordlist::ENGLISH,
        }
    }

    fn index_of(&self, word: &str) -> Option<u16> {
        match self {
            Language::English => wordlist::index_of(word),
        }
    }
}

/// A validated BIP-39 mnemonic phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mnemonic {
    phrase: String,
    language: Language,
    mnemonic_type: MnemonicType,
}

impl Mnemonic {
    /// Generate a new random mnemonic from the OS entropy source
    pub fn generate(mnemonic_type: MnemonicType, language: Language) -> Result<Self, Error> {
        let entropy = entropy::generate(mnemonic_type.entropy_bytes())?;
        Self::from_entropy(&entropy, language)
    }

    /// Encode entropy bytes as a mnemonic phrase
    pub fn from_entropy(entropy: &[u8], language: Language) -> Result<Self, Error> {
        let mnemonic_type = MnemonicType::from_entropy_len(entropy.len())?;
        let checksum_bits = mnemonic_type.checksum_bits();

        // Checksum = high entropy_bits/32 bits of SHA256(entropy)
        let hash = crate::utils::sha256(entropy);
        let checksum = hash[0] >> (8 - checksum_bits);

        // Pack entropy || checksum into 11-bit wordlist indices
        let wordlist = language.wordlist();
        let mut words = Vec::with_capacity(mnemonic_type.word_count());
        let mut bit_buffer: u32 = 0;
        let mut bits_in_buffer = 0;

        let stream = entropy
            .iter()
            .copied()
            .map(|b| (b as u32, 8))
            .chain(std::iter::once((checksum as u32, checksum_bits)));

        for (value, bits) in stream {
            bit_buffer = (bit_buffer << bits) | value;
            bits_in_buffer += bits;

            while bits_in_buffer >= 11 {
                let index = (bit_buffer >> (bits_in_buffer - 11)) & 0x7FF;
                words.push(wordlist[index as usize]);
                bits_in_buffer -= 11;
            }
        }

        Ok(Mnemonic {
            phrase: words.join(" "),
            language,
            mnemonic_type,
        })
    }

    /// Parse and validate a mnemonic phrase.
    ///
    /// Runs the full checksum recomputation, not just structural checks.
    pub fn from_phrase(phrase: &str, language: Language) -> Result<Self, Error> {
        if phrase.chars().any(|c| c.is_whitespace() && c != ' ') {
            return Err(Error::UnexpectedWhitespace);
        }

        let words: Vec<&str> = phrase.split(' ').collect();
        if words.iter().any(|w| w.is_empty()) {
            return Err(Error::UnexpectedWhitespace);
        }

        let mnemonic_type = MnemonicType::from_word_count(words.len())?;

        let indices = words
            .iter()
            .map(|&word| {
                language
                    .index_of(word)
                    .ok_or_else(|| Error::WordNotFound(word.to_string()))
            })
            .collect::<Result<Vec<u16>, Error>>()?;

        let (entropy, provided_checksum) = unpack_indices(&indices, mnemonic_type);

        let hash = crate::utils::sha256(&entropy);
        let expected_checksum = hash[0] >> (8 - mnemonic_type.checksum_bits());

        if provided_checksum != expected_checksum {
            return Err(Error::InvalidMnemonicChecksum);
        }

        Ok(Mnemonic {
            phrase: words.join(" "),
            language,
            mnemonic_type,
        })
    }

    /// Get the phrase as a string
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Get the wordlist language
    pub fn language(&self) -> Language {
        self.language
    }

    /// Get the mnemonic length
    pub fn mnemonic_type(&self) -> MnemonicType {
        self.mnemonic_type
    }

    /// Recover the entropy bytes this mnemonic encodes
    pub fn to_entropy(&self) -> Vec<u8> {
        // The phrase was validated at construction, so every word resolves.
        let indices: Vec<u16> = self
            .phrase
            .split(' ')
            .map(|word| self.language.index_of(word).expect("validated word"))
            .collect();

        unpack_indices(&indices, self.mnemonic_type).0
    }

    /// Derive the 64-byte seed for this mnemonic and passphrase.
    ///
    /// PBKDF2-HMAC-SHA512 over the NFKD-normalized phrase, salted with
    /// "mnemonic" plus the passphrase. Different passphrases yield
    /// unrelated seeds.
    pub fn to_seed(&self, passphrase: &str) -> Seed {
        let password: String = self.phrase.nfkd().collect();
        let salt: String = format!("mnemonic{}", passphrase).nfkd().collect();

        let mut seed = [0u8; 64];
        pbkdf2_hmac::<Sha512>(
            password.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ITERATIONS,
            &mut seed,
        );

        Seed(seed)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.phrase)
    }
}

/// Rebuild entropy bytes and the trailing checksum from 11-bit indices
fn unpack_indices(indices: &[u16], mnemonic_type: MnemonicType) -> (Vec<u8>, u8) {
    let entropy_bytes = mnemonic_type.entropy_bytes();
    let checksum_bits = mnemonic_type.checksum_bits();

    let mut entropy = Vec::with_capacity(entropy_bytes);
    let mut bit_buffer: u32 = 0;
    let mut bits_in_buffer = 0;

    for &index in indices {
        bit_buffer = (bit_buffer << 11) | (index as u32);
        bits_in_buffer += 11;

        while bits_in_buffer >= 8 && entropy.len() < entropy_bytes {
            let byte = (bit_buffer >> (bits_in_buffer - 8)) & 0xFF;
            entropy.push(byte as u8);
            bits_in_buffer -= 8;
        }
    }

    // Once the entropy bytes are out, exactly the checksum bits remain.
    let checksum_mask = (1u32 << checksum_bits) - 1;
    let checksum = (bit_buffer & checksum_mask) as u8;

    (entropy, checksum)
}

/// A 64-byte BIP-39 seed
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Get the seed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding of the seed
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// Seeds are key material, keep them out of debug output.
impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Seed(64 bytes)")
    }
}
