/// Frozen address tables (SPEC_FULL.md §4.11, §9 resolved open question).
///
/// These are the single canonical source for both the Wallet Labels
/// dictionary and the skip lists consumed by bundle forensics and SOL-flow
/// tracing. Program IDs are pulled from the same pool-discovery constants
/// the teacher's AMM decoders use (`src/pools/constants.rs`); CEX hot
/// wallets and bridge programs are well-known public addresses.
pub static SYSTEM_PROGRAMS: &[(&str, &str)] = &[
    ("11111111111111111111111111111111", "System Program"),
    ("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "SPL Token Program"),
    ("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb", "SPL Token-2022 Program"),
    ("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", "Associated Token Account Program"),
    ("ComputeBudget111111111111111111111111111111", "Compute Budget Program"),
    ("SysvarRent111111111111111111111111111111111", "Rent Sysvar"),
    ("SysvarC1ock11111111111111111111111111111111", "Clock Sysvar"),
    ("Vote111111111111111111111111111111111111111", "Vote Program"),
    ("Stake11111111111111111111111111111111111111", "Stake Program"),
    ("BPFLoaderUpgradeab1e11111111111111111111111", "BPF Loader Upgradeable"),
    ("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s", "Metaplex Token Metadata"),
];

pub static DEX_PROGRAMS: &[(&str, &str)] = &[
    ("CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C", "Raydium CPMM"),
    ("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", "Raydium Legacy AMM"),
    ("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK", "Raydium CLMM"),
    ("cpamdpZCGKUy5JxQXB4dcpGPiikHawvSWAd6mEn1sGG", "Meteora DAMM v2"),
    ("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo", "Meteora DLMM"),
    ("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", "Orca Whirlpool"),
    ("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4", "Jupiter Aggregator v6"),
];

pub static LAUNCHPAD_PROGRAMS: &[(&str, &str)] = &[
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", "Pump.fun Bonding Curve"),
    ("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA", "Pump.fun AMM"),
];

/// MEV tip accounts (Jito) excluded from bundle/flow wallet accounting so a
/// tip payment is never mistaken for an extraction destination.
pub static MEV_TIP_ACCOUNTS: &[(&str, &str)] = &[
    ("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5", "Jito Tip Account 1"),
    ("HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe", "Jito Tip Account 2"),
    ("Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY", "Jito Tip Account 3"),
    ("ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGeJy2D", "Jito Tip Account 4"),
];

/// Bridge programs consulted for cross-chain exit resolution
/// (SPEC_FULL.md §4.6 step 3).
pub static BRIDGE_PROGRAMS: &[(&str, &str)] = &[
    ("wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb", "Wormhole Core Bridge"),
    ("3u8hJUVTA4jH1wYAyUur7FFZVQ8H635K3tSHHF4ssjQ5", "Wormhole Token Bridge"),
    ("AGN5S3LNTsJtnRrh2LFU6XntQhyWCeTF56oLPCkxKSTe", "Allbridge"),
];

/// Known CEX deposit/hot wallets. Not exhaustive — a forensic analyst's
/// working set, not a complete registry.
pub static CEX_ADDRESSES: &[(&str, &str)] = &[
    ("5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9", "Binance Hot Wallet"),
    ("2ojv9BAiHUrvsm9gxDe7fJSzbNZSJcxZvf8dqmWGHG8S", "Binance Hot Wallet 2"),
    ("H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ8N4dK3WjS", "Coinbase Hot Wallet"),
    ("9un5wqE3q4oCjyrDkwsdD48KteCJitQX5978Hc2ygiEX", "Coinbase Hot Wallet 2"),
    ("FWznbcNXWQuHTawe9RxvQ2LdCENssh12dsznf4RiouN5", "Kraken Hot Wallet"),
    ("DAidxynJwfeDRi3VqZXHESzjNNXrfAUHHVhjQyFWSDQK", "OKX Hot Wallet"),
    ("AobVSwdW9BbpMdJvTqeCN4hPAmh2rFki9MDU8azs83F", "Bybit Hot Wallet"),
    ("5VCwKtCXgCJ6kit5FybXjvriW3xELsFDhYrPSqtJNmcD", "Gate.io Hot Wallet"),
];

/// Short base58 prefixes that strongly suggest a CEX deposit sub-wallet even
/// when the full address isn't in [`CEX_ADDRESSES`] (SPEC_FULL.md §4.11
/// "small prefix table for CEX deposit-wallet heuristics").
pub static CEX_DEPOSIT_PREFIXES: &[(&str, &str)] = &[
    ("5tzFk", "Binance-linked deposit wallet"),
    ("H8sMJ", "Coinbase-linked deposit wallet"),
    ("FWznb", "Kraken-linked deposit wallet"),
];
