//! Generate a phrase, derive accounts on every chain and optionally look up
//! their balances.
//!
//! Set `KEYVAULT_CHECK_BALANCES=1` to query the configured RPC endpoints.

use keyvault::{ChainKind, JsonRpcBalanceProvider, KeyVault, WalletSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let vault = KeyVault::from_env()?;
    let phrase = vault.create_mnemonic()?;
    println!("Mnemonic ({} words): {}", phrase.word_count(), phrase.phrase());

    let mut session = WalletSession::new(phrase);
    for chain in vault.config().enabled_chains.clone() {
        for _ in 0..2 {
            vault.derive_next_key_pair(&mut session, chain)?;
        }
    }

    if let Some(first) = vault.config().enabled_chains.first().copied() {
        vault.reveal_key_pair(&mut session, first, 0)?;
    }

    for chain in ChainKind::ALL {
        for key_pair in session.key_pairs(chain) {
            println!(
                "{} {} {} {}",
                chain,
                key_pair.path(),
                key_pair.address(),
                key_pair.display_private_key()?.as_str()
            );
        }
    }

    if std::env::var("KEYVAULT_CHECK_BALANCES").as_deref() == Ok("1") {
        let provider = JsonRpcBalanceProvider::from_config(vault.config())?;
        for chain in ChainKind::ALL {
            for index in 0..session.next_index(chain) {
                let update = vault
                    .check_balance(&mut session, &provider, chain, index)
                    .await?;
                let status = session.balance(chain, index)?;
                println!("{}#{} {:?}: {}", chain, index, update, status.label());
            }
        }
    }

    Ok(())
}
