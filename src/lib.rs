// Mnemonic-to-hierarchical-key derivation engine.
// This library implements BIP-39 (mnemonic/seed) and BIP-32 (hierarchical
// deterministic key tree) with base58check address encoding.

pub mod address;
pub mod bip32;
pub mod bip39;
pub mod entropy;
pub mod error;
pub mod utils;
pub mod wordlist;

pub use address::{Address, AddressScheme};
pub use bip32::{ChildNumber, DerivationPath, ExtendedPrivKey, ExtendedPubKey, Network};
pub use bip39::{Language, Mnemonic, MnemonicType, Seed};
pub use error::Error;

// Re-export types from dependencies that are part of our public API
pub use secp256k1::{self, PublicKey, Secp256k1, SecretKey};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const REFERENCE_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_mnemonic_generation() {
        let mnemonic = Mnemonic::generate(MnemonicType::Words24, Language::English).unwrap();
        assert_eq!(mnemonic.phrase().split_whitespace().count(), 24);
    }

    #[test]
    fn test_mnemonic_validation() {
        let mnemonic = Mnemonic::from_phrase(REFERENCE_PHRASE, Language::English).unwrap();
        assert_eq!(mnemonic.phrase(), REFERENCE_PHRASE);

        let invalid_phrase = REFERENCE_PHRASE.replace("about", "invalid");
        assert!(Mnemonic::from_phrase(&invalid_phrase, Language::English).is_err());
    }

    #[test]
    fn test_entropy_to_address_pipeline() {
        // Full pipeline over the BIP-39 reference vector: 16 zero bytes
        // of entropy through mnemonic, seed, master key and address.
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16], Language::English).unwrap();
        assert_eq!(mnemonic.phrase(), REFERENCE_PHRASE);

        let seed = mnemonic.to_seed("");
        assert_eq!(
            seed.to_hex(),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );

        let master = ExtendedPrivKey::new_master(seed.as_bytes(), Network::Bitcoin).unwrap();
        assert_eq!(
            master.to_string(),
            "xprv9s21ZrQH143K3GJpoapnV8SFfukcVBSfeCficPSGfubmSFDxo1kuHnLisriDvSnRRuL2Qrg5ggqHKNVpxR86QEC8w35uxmGoggxtQTPvfUu"
        );

        let account = master
            .derive_path(&DerivationPath::from_str("m/0'/0'").unwrap())
            .unwrap();
        assert_eq!(account.depth, 2);
        assert_eq!(
            account.to_string(),
            "xprv9w83TkwTJSpYjV4hWcxttB9bQWHdrFCPzCLnMHKceyd4WGBfsUgijUirvMaHM6TFBqQegpt3hZysUeBP8PFmkjPWitahm71vjNhMLqKmuLb"
        );
        assert_eq!(
            account.neuter().to_string(),
            "xpub6A7PsGUM8pNqwy9AceVuFK6KxY88FhvFMRGP9fjEDKA3P4WpR1zyHH3Lmczj7eorx4RbDC4Qttd8C7HhLA2W9LsxxZzXo1DMCwJFb3zZKZ8"
        );

        let expected_addresses = [
            "18HJwMH953rDnNg2uTKW1RpQvGbNaLhnVk",
            "1DBmgCujLLBqLXoN9R75Kxon1J22WoASm1",
            "1FYuyifvo7Yd1SARLsmmV3UR4CMYvJAVQT",
        ];
        for (i, expected) in expected_addresses.iter().enumerate() {
            let child = account
                .derive_child(ChildNumber::Normal(i as u32))
                .unwrap()
                .neuter();
            assert_eq!(&child.p2pkh_address(), expected);
        }
    }

    #[test]
    fn test_public_and_private_derivation_agree() {
        let mnemonic = Mnemonic::from_phrase(REFERENCE_PHRASE, Language::English).unwrap();
        let seed = mnemonic.to_seed("");
        let master = ExtendedPrivKey::new_master(seed.as_bytes(), Network::Bitcoin).unwrap();

        let path = DerivationPath::from_str("m/0/1/2").unwrap();
        let via_private = master.derive_path(&path).unwrap().neuter();
        let via_public = master.neuter().derive_path(&path).unwrap();
        assert_eq!(via_private.to_string(), via_public.to_string());
    }

    #[test]
    fn test_passphrase_changes_the_tree() {
        // The plausible-deniability property: a different passphrase
        // yields an unrelated key tree from the same words.
        let mnemonic = Mnemonic::from_phrase(REFERENCE_PHRASE, Language::English).unwrap();
        let a = ExtendedPrivKey::new_master(mnemonic.to_seed("").as_bytes(), Network::Bitcoin)
            .unwrap();
        let b = ExtendedPrivKey::new_master(
            mnemonic.to_seed("sicher").as_bytes(),
            Network::Bitcoin,
        )
        .unwrap();
        assert_ne!(a.to_string(), b.to_string());
    }
}
