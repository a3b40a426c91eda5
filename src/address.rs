//! Base58check address encoding for public keys.
//!
//! Supports legacy P2PKH and P2WPKH-in-P2SH (the wrapped-segwit form
//! spendable by pre-segwit software). Encoding is one-way: an address
//! commits to a key hash, never to the key itself.

use crate::bip32::Network;
use crate::error::Error;
use crate::utils;
use secp256k1::PublicKey;
use std::fmt;
use std::str::FromStr;

/// The script scheme an address commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScheme {
    /// Pay-to-public-key-hash (legacy, `1…` on mainnet)
    P2pkh,
    /// P2WPKH nested in pay-to-script-hash (`3…` on mainnet)
    P2shP2wpkh,
}

impl AddressScheme {
    /// Canonical tag for this scheme
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressScheme::P2pkh => "p2pkh",
            AddressScheme::P2shP2wpkh => "p2sh-p2wpkh",
        }
    }
}

impl fmt::Display for AddressScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AddressScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p2pkh" => Ok(AddressScheme::P2pkh),
            "p2sh-p2wpkh" => Ok(AddressScheme::P2shP2wpkh),
            other => Err(Error::UnsupportedAddressScheme(other.to_string())),
        }
    }
}

/// An encoded address, tagged with its scheme and network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    encoded: String,
    scheme: AddressScheme,
    network: Network,
}

impl Address {
    /// Encode a compressed public key under the given scheme.
    ///
    /// Deterministic: the same key, scheme and network always produce the
    /// same address string.
    pub fn encode(public_key: &PublicKey, scheme: AddressScheme, network: Network) -> Address {
        let pubkey_hash = utils::hash160(&public_key.serialize());

        let (version, payload_hash) = match scheme {
            AddressScheme::P2pkh => (network.p2pkh_version(), pubkey_hash),
            AddressScheme::P2shP2wpkh => {
                // Redeem script: OP_0 <20-byte pubkey hash>
                let mut redeem_script = Vec::with_capacity(22);
                redeem_script.extend_from_slice(&[0x00, 0x14]);
                redeem_script.extend_from_slice(&pubkey_hash);
                (network.p2sh_version(), utils::hash160(&redeem_script))
            }
        };

        let mut data = Vec::with_capacity(21);
        data.push(version);
        data.extend_from_slice(&payload_hash);

        Address {
            encoded: utils::base58check_encode(&data),
            scheme,
            network,
        }
    }

    /// The address scheme
    pub fn scheme(&self) -> AddressScheme {
        self.scheme
    }

    /// The network the address belongs to
    pub fn network(&self) -> Network {
        self.network
    }

    /// The encoded address string
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // Compressed public key for secret scalar 1 (the generator point)
    fn generator_key() -> PublicKey {
        PublicKey::from_slice(&hex!(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        ))
        .unwrap()
    }

    #[test]
    fn p2pkh_known_vector() {
        let address = Address::encode(&generator_key(), AddressScheme::P2pkh, Network::Bitcoin);
        assert_eq!(address.as_str(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert!(address.as_str().starts_with('1'));
    }

    #[test]
    fn p2sh_p2wpkh_known_vector() {
        let address = Address::encode(
            &generator_key(),
            AddressScheme::P2shP2wpkh,
            Network::Bitcoin,
        );
        assert_eq!(address.as_str(), "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN");
        assert!(address.as_str().starts_with('3'));
    }

    #[test]
    fn encoding_is_deterministic_and_scheme_distinct() {
        let key = generator_key();
        let a = Address::encode(&key, AddressScheme::P2pkh, Network::Bitcoin);
        let b = Address::encode(&key, AddressScheme::P2pkh, Network::Bitcoin);
        assert_eq!(a, b);

        let c = Address::encode(&key, AddressScheme::P2shP2wpkh, Network::Bitcoin);
        assert_ne!(a.as_str(), c.as_str());
    }

    #[test]
    fn testnet_prefixes() {
        let key = generator_key();
        let p2pkh = Address::encode(&key, AddressScheme::P2pkh, Network::Testnet);
        assert!(p2pkh.as_str().starts_with('m') || p2pkh.as_str().starts_with('n'));

        let p2sh = Address::encode(&key, AddressScheme::P2shP2wpkh, Network::Testnet);
        assert!(p2sh.as_str().starts_with('2'));
    }

    #[test]
    fn scheme_tag_parsing() {
        assert_eq!("p2pkh".parse::<AddressScheme>().unwrap(), AddressScheme::P2pkh);
        assert_eq!(
            "p2sh-p2wpkh".parse::<AddressScheme>().unwrap(),
            AddressScheme::P2shP2wpkh
        );
        assert!(matches!(
            "p2tr".parse::<AddressScheme>(),
            Err(Error::UnsupportedAddressScheme(tag)) if tag == "p2tr"
        ));
    }
}
