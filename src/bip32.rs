//! BIP-32 hierarchical deterministic key derivation.
//!
//! Extended keys are immutable values; every derivation step is a pure
//! function of parent key and child number, so independent paths can be
//! derived concurrently from the same root.

use crate::error::Error;
use crate::utils;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::fmt;
use std::str::FromStr;

/// The network type for HD keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Bitcoin,
    Testnet,
}

impl Network {
    /// Get the version bytes for extended private keys
    pub fn xprv_version(&self) -> [u8; 4] {
        match self {
            Network::Bitcoin => [0x04, 0x88, 0xAD, 0xE4], // xprv
            Network::Testnet => [0x04, 0x35, 0x83, 0x94], // tprv
        }
    }

    /// Get the version bytes for extended public keys
    pub fn xpub_version(&self) -> [u8; 4] {
        match self {
            Network::Bitcoin => [0x04, 0x88, 0xB2, 0x1E], // xpub
            Network::Testnet => [0x04, 0x35, 0x87, 0xCF], // tpub
        }
    }

    /// Get the version byte for P2PKH addresses
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0x00,
            Network::Testnet => 0x6F,
        }
    }

    /// Get the version byte for P2SH addresses
    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0x05,
            Network::Testnet => 0xC4,
        }
    }
}

/// A path element in a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildNumber {
    /// Normal derivation index (0..2^31-1)
    Normal(u32),
    /// Hardened derivation index (2^31..2^32-1)
    Hardened(u32),
}

impl ChildNumber {
    /// Maximum normal index
    pub const MAX_NORMAL_INDEX: u32 = 0x7fffffff;

    /// Convert to raw index value
    pub fn to_u32(&self) -> u32 {
        match self {
            ChildNumber::Normal(i) => *i,
            ChildNumber::Hardened(i) => i + ChildNumber::MAX_NORMAL_INDEX + 1,
        }
    }

    /// Build from a raw index value (top bit set means hardened)
    pub fn from_u32(index: u32) -> Self {
        if index > ChildNumber::MAX_NORMAL_INDEX {
            ChildNumber::Hardened(index - ChildNumber::MAX_NORMAL_INDEX - 1)
        } else {
            ChildNumber::Normal(index)
        }
    }

    /// Check if the child number is hardened
    pub fn is_hardened(&self) -> bool {
        match self {
            ChildNumber::Normal(_) => false,
            ChildNumber::Hardened(_) => true,
        }
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChildNumber::Normal(i) => write!(f, "{}", i),
            ChildNumber::Hardened(i) => write!(f, "{}'", i),
        }
    }
}

impl FromStr for ChildNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with('\'') || s.ends_with('h') {
            let index: u32 = s[..s.len() - 1]
                .parse()
                .map_err(|_| Error::InvalidDerivationPath("Invalid hardened index".to_string()))?;

            if index > ChildNumber::MAX_NORMAL_INDEX {
                return Err(Error::InvalidDerivationPath(
                    "Hardened index out of range".to_string(),
                ));
            }

            Ok(ChildNumber::Hardened(index))
        } else {
            let index: u32 = s
                .parse()
                .map_err(|_| Error::InvalidDerivationPath("Invalid normal index".to_string()))?;

            if index > ChildNumber::MAX_NORMAL_INDEX {
                return Err(Error::InvalidDerivationPath(
                    "Normal index out of range".to_string(),
                ));
            }

            Ok(ChildNumber::Normal(index))
        }
    }
}

/// A BIP-32 derivation path, e.g. `m/0'/1/2'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    pub path: Vec<ChildNumber>,
}

impl DerivationPath {
    /// The master path `m`
    pub fn master() -> Self {
        DerivationPath { path: vec![] }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "m")?;
        for child in &self.path {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = if let Some(rest) = s.strip_prefix("m/") {
            rest
        } else if s == "m" {
            return Ok(DerivationPath::master());
        } else {
            return Err(Error::InvalidDerivationPath(
                "Path must start with 'm'".to_string(),
            ));
        };

        if rest.is_empty() || rest.split('/').any(|p| p.is_empty()) {
            return Err(Error::InvalidDerivationPath(
                "Empty path component".to_string(),
            ));
        }

        let path: Result<Vec<ChildNumber>, Error> =
            rest.split('/').map(|p| p.parse::<ChildNumber>()).collect();

        Ok(DerivationPath { path: path? })
    }
}

/// Extended private key as defined in BIP-32
#[derive(Debug, Clone)]
pub struct ExtendedPrivKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; 32],
    pub private_key: SecretKey,
    pub network: Network,
}

impl ExtendedPrivKey {
    /// Create a new master extended private key from a seed
    pub fn new_master(seed: &[u8], network: Network) -> Result<Self, Error> {
        if seed.len() < 16 || seed.len() > 64 {
            return Err(Error::InvalidSeed(
                "Seed must be between 16 and 64 bytes".to_string(),
            ));
        }

        let hmac_result = utils::hmac_sha512("Bitcoin seed".as_bytes(), seed);

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac_result[32..64]);

        let sk = SecretKey::from_slice(&hmac_result[0..32])
            .map_err(|_| Error::InvalidSeed("Seed produces an invalid master key".to_string()))?;

        Ok(ExtendedPrivKey {
            depth: 0,
            parent_fingerprint: [0, 0, 0, 0],
            child_number: 0,
            chain_code,
            private_key: sk,
            network,
        })
    }

    /// Derive a child key (CKDpriv)
    ///
    /// Fails with [`Error::InvalidChildKey`] in the ~2^-127 case where the
    /// HMAC left half falls outside the curve order or the combined scalar
    /// is zero; callers should skip to the next index.
    pub fn derive_child(&self, child_number: ChildNumber) -> Result<ExtendedPrivKey, Error> {
        let secp = Secp256k1::new();
        let index = child_number.to_u32();
        let mut hmac_input = Vec::with_capacity(37);

        if child_number.is_hardened() {
            // Hardened derivation: data = 0x00 || private_key || index
            hmac_input.push(0);
            hmac_input.extend_from_slice(&self.private_key[..]);
        } else {
            // Normal derivation: data = compressed public key || index
            let public_key = PublicKey::from_secret_key(&secp, &self.private_key);
            hmac_input.extend_from_slice(&public_key.serialize());
        }
        hmac_input.extend_from_slice(&index.to_be_bytes());

        // I = HMAC-SHA512(chain_code, hmac_input); I_L tweaks the scalar,
        // I_R becomes the child chain code.
        let hmac_result = utils::hmac_sha512(&self.chain_code, &hmac_input);

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac_result[32..64]);

        // child key = (parent_key + I_L) mod n
        let child_private_key = SecretKey::from_slice(&hmac_result[0..32])
            .and_then(|tweak| tweak.add_tweak(&self.private_key.into()))
            .map_err(|_| Error::InvalidChildKey { index })?;

        Ok(ExtendedPrivKey {
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number: index,
            chain_code,
            private_key: child_private_key,
            network: self.network,
        })
    }

    /// Derive a child key from a derivation path
    pub fn derive_path(&self, path: &DerivationPath) -> Result<ExtendedPrivKey, Error> {
        let mut key = self.clone();

        for &child_number in &path.path {
            key = key.derive_child(child_number)?;
        }

        Ok(key)
    }

    /// First 4 bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &self.private_key);
        fingerprint_of(&public_key)
    }

    /// Strip the private scalar, keeping only the public point and chain
    /// code. One-way: the result cannot regain the private key.
    pub fn neuter(&self) -> ExtendedPubKey {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &self.private_key);

        ExtendedPubKey {
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            chain_code: self.chain_code,
            public_key,
            network: self.network,
        }
    }
}

/// Base58check serialization (xprv/tprv)
impl fmt::Display for ExtendedPrivKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut data = Vec::with_capacity(78);
        data.extend_from_slice(&self.network.xprv_version());
        serialize_common(
            &mut data,
            self.depth,
            &self.parent_fingerprint,
            self.child_number,
            &self.chain_code,
        );
        // Private key with 0x00 prefix
        data.push(0);
        data.extend_from_slice(&self.private_key[..]);

        write!(f, "{}", utils::base58check_encode(&data))
    }
}

impl FromStr for ExtendedPrivKey {
    type Err = Error;

    fn from_str(xprv: &str) -> Result<Self, Self::Err> {
        let data = utils::base58check_decode(xprv)?;
        let (network, fields) = deserialize_common(&data, Network::xprv_version)?;

        if data[45] != 0 {
            return Err(Error::InvalidExtendedKey(
                "Invalid private key prefix".to_string(),
            ));
        }

        let private_key = SecretKey::from_slice(&data[46..78])
            .map_err(|_| Error::InvalidExtendedKey("Invalid private key".to_string()))?;

        Ok(ExtendedPrivKey {
            depth: fields.depth,
            parent_fingerprint: fields.parent_fingerprint,
            child_number: fields.child_number,
            chain_code: fields.chain_code,
            private_key,
            network,
        })
    }
}

/// Extended public key as defined in BIP-32
#[derive(Debug, Clone)]
pub struct ExtendedPubKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; 32],
    pub public_key: PublicKey,
    pub network: Network,
}

impl ExtendedPubKey {
    /// Derive a child key (CKDpub) - only for non-hardened derivation
    pub fn derive_child(&self, child_number: ChildNumber) -> Result<ExtendedPubKey, Error> {
        if child_number.is_hardened() {
            return Err(Error::HardenedDerivationRequiresPrivateKey);
        }

        let secp = Secp256k1::new();
        let index = child_number.to_u32();
        let mut hmac_input = Vec::with_capacity(37);

        // Data = compressed public key || index
        hmac_input.extend_from_slice(&self.public_key.serialize());
        hmac_input.extend_from_slice(&index.to_be_bytes());

        let hmac_result = utils::hmac_sha512(&self.chain_code, &hmac_input);

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac_result[32..64]);

        // child key = point(I_L) + parent_key
        let child_public_key = SecretKey::from_slice(&hmac_result[0..32])
            .map(|tweak| PublicKey::from_secret_key(&secp, &tweak))
            .and_then(|point| self.public_key.combine(&point))
            .map_err(|_| Error::InvalidChildKey { index })?;

        Ok(ExtendedPubKey {
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number: index,
            chain_code,
            public_key: child_public_key,
            network: self.network,
        })
    }

    /// Derive a child key from a derivation path (only non-hardened)
    pub fn derive_path(&self, path: &DerivationPath) -> Result<ExtendedPubKey, Error> {
        let mut key = self.clone();

        for &child_number in &path.path {
            key = key.derive_child(child_number)?;
        }

        Ok(key)
    }

    /// First 4 bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint_of(&self.public_key)
    }

    /// Legacy P2PKH address for this key
    pub fn p2pkh_address(&self) -> String {
        crate::address::Address::encode(
            &self.public_key,
            crate::address::AddressScheme::P2pkh,
            self.network,
        )
        .to_string()
    }

    /// P2WPKH-in-P2SH address for this key
    pub fn p2sh_p2wpkh_address(&self) -> String {
        crate::address::Address::encode(
            &self.public_key,
            crate::address::AddressScheme::P2shP2wpkh,
            self.network,
        )
        .to_string()
    }
}

/// Base58check serialization (xpub/tpub)
impl fmt::Display for ExtendedPubKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut data = Vec::with_capacity(78);
        data.extend_from_slice(&self.network.xpub_version());
        serialize_common(
            &mut data,
            self.depth,
            &self.parent_fingerprint,
            self.child_number,
            &self.chain_code,
        );
        data.extend_from_slice(&self.public_key.serialize());

        write!(f, "{}", utils::base58check_encode(&data))
    }
}

impl FromStr for ExtendedPubKey {
    type Err = Error;

    fn from_str(xpub: &str) -> Result<Self, Self::Err> {
        let data = utils::base58check_decode(xpub)?;
        let (network, fields) = deserialize_common(&data, Network::xpub_version)?;

        let public_key = PublicKey::from_slice(&data[45..78])
            .map_err(|_| Error::InvalidExtendedKey("Invalid public key".to_string()))?;

        Ok(ExtendedPubKey {
            depth: fields.depth,
            parent_fingerprint: fields.parent_fingerprint,
            child_number: fields.child_number,
            chain_code: fields.chain_code,
            public_key,
            network,
        })
    }
}

fn fingerprint_of(public_key: &PublicKey) -> [u8; 4] {
    let hash = utils::hash160(&public_key.serialize());
    let mut fingerprint = [0u8; 4];
    fingerprint.copy_from_slice(&hash[0..4]);
    fingerprint
}

/// Append the fields shared by both serialized key forms:
/// depth || parent_fingerprint || child_number || chain_code
fn serialize_common(
    data: &mut Vec<u8>,
    depth: u8,
    parent_fingerprint: &[u8; 4],
    child_number: u32,
    chain_code: &[u8; 32],
) {
    data.push(depth);
    data.extend_from_slice(parent_fingerprint);
    data.extend_from_slice(&child_number.to_be_bytes());
    data.extend_from_slice(chain_code);
}

struct CommonFields {
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
    chain_code: [u8; 32],
}

fn deserialize_common(
    data: &[u8],
    version_of: fn(&Network) -> [u8; 4],
) -> Result<(Network, CommonFields), Error> {
    if data.len() != 78 {
        return Err(Error::InvalidExtendedKey(
            "Invalid extended key length".to_string(),
        ));
    }

    let network = if data[0..4] == version_of(&Network::Bitcoin) {
        Network::Bitcoin
    } else if data[0..4] == version_of(&Network::Testnet) {
        Network::Testnet
    } else {
        return Err(Error::InvalidExtendedKey(
            "Invalid version bytes".to_string(),
        ));
    };

    let depth = data[4];

    let mut parent_fingerprint = [0u8; 4];
    parent_fingerprint.copy_from_slice(&data[5..9]);

    let mut child_number_bytes = [0u8; 4];
    child_number_bytes.copy_from_slice(&data[9..13]);
    let child_number = u32::from_be_bytes(child_number_bytes);

    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&data[13..45]);

    Ok((
        network,
        CommonFields {
            depth,
            parent_fingerprint,
            child_number,
            chain_code,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // BIP-32 test vector 1, seed 000102030405060708090a0b0c0d0e0f
    const TV1_SEED: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const TV1_M_XPRV: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const TV1_M_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    const TV1_M0H_XPRV: &str = "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7";
    const TV1_M0H_XPUB: &str = "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw";
    const TV1_M0H_1_XPUB: &str = "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ";

    #[test]
    fn master_key_matches_test_vector() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Bitcoin).unwrap();
        assert_eq!(master.to_string(), TV1_M_XPRV);
        assert_eq!(master.neuter().to_string(), TV1_M_XPUB);
    }

    #[test]
    fn hardened_child_matches_test_vector() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Bitcoin).unwrap();
        let child = master.derive_child(ChildNumber::Hardened(0)).unwrap();
        assert_eq!(child.depth, 1);
        assert_eq!(child.child_number, 0x80000000);
        assert_eq!(child.to_string(), TV1_M0H_XPRV);
        assert_eq!(child.neuter().to_string(), TV1_M0H_XPUB);
    }

    #[test]
    fn path_derivation_matches_test_vector() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Bitcoin).unwrap();
        let path: DerivationPath = "m/0'/1".parse().unwrap();
        let child = master.derive_path(&path).unwrap();
        assert_eq!(child.depth, 2);
        assert_eq!(child.neuter().to_string(), TV1_M0H_1_XPUB);
    }

    #[test]
    fn public_derivation_is_consistent_with_private() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Bitcoin).unwrap();
        let path: DerivationPath = "m/0'/1/2".parse().unwrap();

        // neuter(derive(priv, path)) must equal derive over the public
        // side for the non-hardened tail.
        let private_side = master.derive_path(&path).unwrap().neuter();

        let hardened_parent = master.derive_child(ChildNumber::Hardened(0)).unwrap();
        let tail: DerivationPath = "m/1/2".parse().unwrap();
        let public_side = hardened_parent.neuter().derive_path(&tail).unwrap();

        assert_eq!(private_side.to_string(), public_side.to_string());
    }

    #[test]
    fn hardened_derivation_fails_from_public_key() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Bitcoin).unwrap();
        let result = master.neuter().derive_child(ChildNumber::Hardened(0));
        assert!(matches!(
            result,
            Err(Error::HardenedDerivationRequiresPrivateKey)
        ));

        let path: DerivationPath = "m/0/1'".parse().unwrap();
        assert!(master.neuter().derive_path(&path).is_err());
    }

    #[test]
    fn serialization_round_trips() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Bitcoin).unwrap();
        let child = master.derive_path(&"m/0'/1".parse().unwrap()).unwrap();

        let parsed: ExtendedPrivKey = child.to_string().parse().unwrap();
        assert_eq!(parsed.depth, child.depth);
        assert_eq!(parsed.parent_fingerprint, child.parent_fingerprint);
        assert_eq!(parsed.child_number, child.child_number);
        assert_eq!(parsed.chain_code, child.chain_code);
        assert_eq!(parsed.private_key, child.private_key);
        assert_eq!(parsed.network, child.network);

        let xpub = child.neuter();
        let parsed_pub: ExtendedPubKey = xpub.to_string().parse().unwrap();
        assert_eq!(parsed_pub.depth, xpub.depth);
        assert_eq!(parsed_pub.parent_fingerprint, xpub.parent_fingerprint);
        assert_eq!(parsed_pub.child_number, xpub.child_number);
        assert_eq!(parsed_pub.chain_code, xpub.chain_code);
        assert_eq!(parsed_pub.public_key, xpub.public_key);
        assert_eq!(parsed_pub.to_string(), xpub.to_string());
    }

    #[test]
    fn parse_rejects_wrong_kind() {
        // An xpub string is not a valid xprv and vice versa.
        assert!(TV1_M_XPUB.parse::<ExtendedPrivKey>().is_err());
        assert!(TV1_M_XPRV.parse::<ExtendedPubKey>().is_err());
    }

    #[test]
    fn testnet_versions_round_trip() {
        let master = ExtendedPrivKey::new_master(&TV1_SEED, Network::Testnet).unwrap();
        let serialized = master.to_string();
        assert!(serialized.starts_with("tprv"));
        let parsed: ExtendedPrivKey = serialized.parse().unwrap();
        assert_eq!(parsed.network, Network::Testnet);

        assert!(master.neuter().to_string().starts_with("tpub"));
    }

    #[test]
    fn rejects_out_of_range_seed() {
        assert!(ExtendedPrivKey::new_master(&[0u8; 15], Network::Bitcoin).is_err());
        assert!(ExtendedPrivKey::new_master(&[0u8; 65], Network::Bitcoin).is_err());
    }

    #[test]
    fn path_parsing() {
        let path: DerivationPath = "m/44'/0h/0'/0/0".parse().unwrap();
        assert_eq!(path.path.len(), 5);
        assert_eq!(path.path[0], ChildNumber::Hardened(44));
        assert_eq!(path.path[1], ChildNumber::Hardened(0));
        assert_eq!(path.path[3], ChildNumber::Normal(0));
        assert_eq!(path.to_string(), "m/44'/0'/0'/0/0");

        assert_eq!("m".parse::<DerivationPath>().unwrap(), DerivationPath::master());

        for bad in ["", "n/0", "m//0", "m/", "m/x", "m/2147483648", "m/2147483648'"] {
            assert!(
                bad.parse::<DerivationPath>().is_err(),
                "expected parse failure for {bad:?}"
            );
        }
    }

    #[test]
    fn child_number_raw_conversion() {
        assert_eq!(ChildNumber::Normal(7).to_u32(), 7);
        assert_eq!(ChildNumber::Hardened(7).to_u32(), 0x80000007);
        assert_eq!(ChildNumber::from_u32(7), ChildNumber::Normal(7));
        assert_eq!(ChildNumber::from_u32(0x80000007), ChildNumber::Hardened(7));
    }
}
