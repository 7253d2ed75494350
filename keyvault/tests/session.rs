//! Tests for wallet sessions and the key vault lifecycle

use keyvault::crypto::keys::CONCEALED_MASK;
use keyvault::{ChainKind, Error, KeyVault, MnemonicPhrase, WalletSession};

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const TEST_JUNK: &str = "test test test test test test test test test test test junk";

fn addresses(session: &WalletSession, chain: ChainKind) -> Vec<String> {
    session
        .key_pairs(chain)
        .iter()
        .map(|key_pair| key_pair.address().to_string())
        .collect()
}

#[test]
fn test_reconstructed_sessions_match() {
    let vault = KeyVault::default();
    let mut first = WalletSession::import(TEST_JUNK).unwrap();
    let mut second = WalletSession::import(TEST_JUNK).unwrap();

    for _ in 0..3 {
        vault.derive_next_key_pair(&mut first, ChainKind::Ethereum).unwrap();
        vault.derive_next_key_pair(&mut first, ChainKind::Solana).unwrap();
    }
    for _ in 0..3 {
        vault.derive_next_key_pair(&mut second, ChainKind::Solana).unwrap();
        vault.derive_next_key_pair(&mut second, ChainKind::Ethereum).unwrap();
    }

    for chain in ChainKind::ALL {
        let a = first.key_pairs(chain);
        let b = second.key_pairs(chain);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.private_key().as_bytes(), y.private_key().as_bytes());
            assert_eq!(x.address(), y.address());
        }
    }
}

#[test]
fn test_index_monotonicity() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(ABANDON).unwrap();

    for n in 1..=5 {
        vault.derive_next_key_pair(&mut session, ChainKind::Solana).unwrap();
        assert_eq!(session.next_index(ChainKind::Solana), n);
        assert_eq!(session.key_pairs(ChainKind::Solana).len(), n);
    }

    for (i, key_pair) in session.key_pairs(ChainKind::Solana).iter().enumerate() {
        assert_eq!(key_pair.account_index(), Some(i as u32));
        assert_eq!(key_pair.path().to_string(), format!("m/44'/501'/{}'/0'", i));
    }
}

#[test]
fn test_cross_chain_isolation() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();

    vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    let solana_before = addresses(&session, ChainKind::Solana);
    let ethereum_before = addresses(&session, ChainKind::Ethereum);

    vault.derive_next_key_pair(&mut session, ChainKind::Solana).unwrap();
    vault.derive_next_key_pair(&mut session, ChainKind::Solana).unwrap();

    assert_eq!(addresses(&session, ChainKind::Ethereum), ethereum_before);
    assert_eq!(session.next_index(ChainKind::Ethereum), 1);
    assert!(solana_before.is_empty());
    assert_eq!(session.next_index(ChainKind::Solana), 2);

    // Ethereum index 1 is unaffected by the two Solana derivations
    let next = vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    assert_eq!(next.path().to_string(), "m/44'/60'/1'/0'");
}

#[test]
fn test_earlier_key_pairs_are_untouched() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();

    vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    let first = session.key_pair(ChainKind::Ethereum, 0).unwrap().private_key().as_bytes().to_vec();

    vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    assert_eq!(
        session.key_pair(ChainKind::Ethereum, 0).unwrap().private_key().as_bytes(),
        first.as_slice()
    );
}

#[test]
fn test_reveal_idempotence_and_targeting() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();
    for _ in 0..3 {
        vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    }

    vault.toggle_key_pair(&mut session, ChainKind::Ethereum, 1).unwrap();
    let states: Vec<bool> = session
        .key_pairs(ChainKind::Ethereum)
        .iter()
        .map(|key_pair| key_pair.is_revealed())
        .collect();
    assert_eq!(states, vec![false, true, false]);

    vault.toggle_key_pair(&mut session, ChainKind::Ethereum, 1).unwrap();
    assert!(session
        .key_pairs(ChainKind::Ethereum)
        .iter()
        .all(|key_pair| !key_pair.is_revealed()));

    let revealed = vault.reveal_key_pair(&mut session, ChainKind::Ethereum, 2).unwrap();
    assert!(revealed.is_revealed());
    vault.reveal_key_pair(&mut session, ChainKind::Ethereum, 2).unwrap();
    assert!(session.key_pair(ChainKind::Ethereum, 2).unwrap().is_revealed());

    vault.conceal_key_pair(&mut session, ChainKind::Ethereum, 2).unwrap();
    assert!(!session.key_pair(ChainKind::Ethereum, 2).unwrap().is_revealed());
}

#[test]
fn test_display_private_key_follows_reveal_flag() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();
    vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();

    let key_pair = session.key_pair(ChainKind::Ethereum, 0).unwrap();
    assert_eq!(key_pair.display_private_key().unwrap().as_str(), CONCEALED_MASK);

    let key_pair = vault.reveal_key_pair(&mut session, ChainKind::Ethereum, 0).unwrap();
    assert_eq!(
        key_pair.display_private_key().unwrap().as_str(),
        "0x4b1696ebc001e9561ef3be5fe46d902ddf8342c21edea7e438ff174142fbed72"
    );
}

#[test]
fn test_out_of_range_index() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();

    let err = vault
        .reveal_key_pair(&mut session, ChainKind::Solana, 0)
        .unwrap_err();
    assert_eq!(
        err,
        Error::IndexOutOfRange {
            chain: ChainKind::Solana,
            index: 0,
            len: 0
        }
    );

    vault.derive_next_key_pair(&mut session, ChainKind::Solana).unwrap();
    assert!(matches!(
        vault.conceal_key_pair(&mut session, ChainKind::Solana, 1),
        Err(Error::IndexOutOfRange { len: 1, .. })
    ));
    assert!(session.key_pair(ChainKind::Ethereum, 0).is_err());
}

#[test]
fn test_invalid_phrase_blocks_session() {
    let err = WalletSession::import("test test test test test test test test test test test test").unwrap_err();
    assert!(matches!(err, Error::InvalidMnemonic(_)));
}

#[test]
fn test_replace_mnemonic_resets_indices() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();
    vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    vault.derive_next_key_pair(&mut session, ChainKind::Solana).unwrap();

    vault.replace_mnemonic(&mut session, MnemonicPhrase::parse(ABANDON).unwrap());

    assert_eq!(session.total_key_pairs(), 0);
    assert_eq!(session.next_index(ChainKind::Ethereum), 0);
    assert_eq!(session.mnemonic().phrase(), ABANDON);

    let key_pair = vault.derive_next_key_pair(&mut session, ChainKind::Solana).unwrap();
    assert_eq!(key_pair.address(), "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");
}

#[test]
fn test_passphrase_locked_after_derivation() {
    let vault = KeyVault::default();
    let session = WalletSession::import(ABANDON).unwrap().with_passphrase("extra").unwrap();
    assert!(session.has_passphrase());

    let mut session = session;
    let salted = vault
        .derive_next_key_pair(&mut session, ChainKind::Solana)
        .unwrap()
        .address()
        .to_string();
    assert_ne!(salted, "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");

    assert!(matches!(
        session.with_passphrase("other"),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_session_debug_hides_secrets() {
    let vault = KeyVault::default();
    let mut session = WalletSession::import(TEST_JUNK).unwrap();
    vault.derive_next_key_pair(&mut session, ChainKind::Ethereum).unwrap();
    vault.reveal_key_pair(&mut session, ChainKind::Ethereum, 0).unwrap();

    let debug = format!("{:?}", session);
    assert!(!debug.contains("junk"));
    assert!(!debug.contains("4b1696ebc001e9561ef3be5fe46d902ddf8342c21edea7e438ff174142fbed72"));
    assert!(debug.contains("0x445890b4CE7251C4F08F2768A8bc43F4C4FF1A63"));
}
