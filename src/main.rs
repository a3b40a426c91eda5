use anyhow::Result;
use bip39hdkeys::{
    ChildNumber, DerivationPath, ExtendedPrivKey, Language, Mnemonic, MnemonicType, Network,
};
use std::str::FromStr;

const DERIVED_PATH: &str = "m/0'/0'";
const DEMO_PASSPHRASE: &str = "sicher";

fn main() -> Result<()> {
    // Seeds and private keys are only printed in full on request.
    let reveal_secrets = std::env::args().any(|arg| arg == "--reveal-secrets");

    println!("Generating random wordlist:");
    println!("---------------------------");

    let mnemonic = Mnemonic::generate(MnemonicType::Words24, Language::English)?;

    println!("\n24 BIP39 mnemonic words (English):");
    println!("{}", mnemonic);

    // Round-trip the phrase through full validation, as a recovery tool would.
    Mnemonic::from_phrase(mnemonic.phrase(), Language::English)?;

    println!("\nBIP39 optional passphrase: {}", DEMO_PASSPHRASE);
    println!("Calculating the seed from wordlist and passphrase:");

    let seed = mnemonic.to_seed(DEMO_PASSPHRASE);
    println!("\nBIP39 seed in hex:");
    println!("{}", redacted(&seed.to_hex(), reveal_secrets));

    println!("\nCalculating the BIP32 root key for Bitcoin mainnet:");
    let master_key = ExtendedPrivKey::new_master(seed.as_bytes(), Network::Bitcoin)?;
    println!("\nBIP32 root key (xprv):");
    println!("{}", redacted(&master_key.to_string(), reveal_secrets));

    println!(
        "\nDeriving the extended private key at {} (Bitcoin Core layout):",
        DERIVED_PATH
    );
    let path = DerivationPath::from_str(DERIVED_PATH)?;
    let derived_key = master_key.derive_path(&path)?;

    println!("\nBIP32 extended private key:");
    println!("{}", redacted(&derived_key.to_string(), reveal_secrets));

    let derived_pub = derived_key.neuter();
    println!("\nBIP32 extended public key:");
    println!("{}", derived_pub);

    println!("\nDerived addresses under {}:", DERIVED_PATH);
    for index in 0..3 {
        let address = derived_key
            .derive_child(ChildNumber::Normal(index))?
            .neuter()
            .p2pkh_address();
        println!("{}. address: {}", index, address);
    }

    let wrapped = derived_key
        .derive_child(ChildNumber::Normal(0))?
        .neuter()
        .p2sh_p2wpkh_address();
    println!("0. address (P2SH-P2WPKH): {}", wrapped);

    Ok(())
}

/// Keep secret material out of terminal scrollback unless asked for.
fn redacted(secret: &str, reveal: bool) -> String {
    if reveal {
        secret.to_string()
    } else {
        format!(
            "{}…{} (redacted, pass --reveal-secrets to print)",
            &secret[..8],
            &secret[secret.len() - 4..]
        )
    }
}
