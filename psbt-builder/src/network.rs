use std::fmt;

use bitcoin::Network;

/// Chain identifiers as reported by the wallet extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainType {
    #[cfg_attr(feature = "serde", serde(rename = "BITCOIN_MAINNET"))]
    BitcoinMainnet,
    #[cfg_attr(feature = "serde", serde(rename = "BITCOIN_TESTNET"))]
    BitcoinTestnet,
    #[cfg_attr(feature = "serde", serde(rename = "BITCOIN_TESTNET4"))]
    BitcoinTestnet4,
    #[cfg_attr(feature = "serde", serde(rename = "BITCOIN_SIGNET"))]
    BitcoinSignet,
    #[cfg_attr(feature = "serde", serde(rename = "FRACTAL_BITCOIN_MAINNET"))]
    FractalBitcoinMainnet,
    #[cfg_attr(feature = "serde", serde(rename = "FRACTAL_BITCOIN_TESTNET"))]
    FractalBitcoinTestnet,
}

impl ChainType {
    pub const ALL: [ChainType; 6] = [
        ChainType::BitcoinMainnet,
        ChainType::BitcoinTestnet,
        ChainType::BitcoinTestnet4,
        ChainType::BitcoinSignet,
        ChainType::FractalBitcoinMainnet,
        ChainType::FractalBitcoinTestnet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainType::BitcoinMainnet => "BITCOIN_MAINNET",
            ChainType::BitcoinTestnet => "BITCOIN_TESTNET",
            ChainType::BitcoinTestnet4 => "BITCOIN_TESTNET4",
            ChainType::BitcoinSignet => "BITCOIN_SIGNET",
            ChainType::FractalBitcoinMainnet => "FRACTAL_BITCOIN_MAINNET",
            ChainType::FractalBitcoinTestnet => "FRACTAL_BITCOIN_TESTNET",
        }
    }

    /// Case-insensitive lookup of a chain identifier.
    pub fn from_identifier(identifier: &str) -> Option<ChainType> {
        let identifier = identifier.trim();
        ChainType::ALL
            .into_iter()
            .find(|chain| chain.as_str().eq_ignore_ascii_case(identifier))
    }

    /// Address and script parameters used for this chain.
    ///
    /// Fractal chains share Bitcoin's address formats. Signet and testnet4 use the
    /// testnet parameter set, which accepts the same `tb`/`m`/`n`/`2` prefixes.
    pub fn network(&self) -> Network {
        match self {
            ChainType::BitcoinMainnet | ChainType::FractalBitcoinMainnet => Network::Bitcoin,
            ChainType::BitcoinTestnet
            | ChainType::BitcoinTestnet4
            | ChainType::BitcoinSignet
            | ChainType::FractalBitcoinTestnet => Network::Testnet,
        }
    }
}

impl Default for ChainType {
    fn default() -> Self {
        ChainType::BitcoinMainnet
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a chain identifier to its address/script parameter set.
///
/// Unrecognized identifiers fall back to mainnet parameters; this never fails.
pub fn resolve_network(chain_identifier: &str) -> Network {
    match ChainType::from_identifier(chain_identifier) {
        Some(chain) => chain.network(),
        None => {
            tracing::debug!(
                chain = chain_identifier,
                "unknown chain identifier, using mainnet parameters"
            );
            Network::Bitcoin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod resolve_network {
        use super::*;

        #[test]
        fn test_mainnet_variants_resolve_to_bitcoin() {
            assert_eq!(resolve_network("BITCOIN_MAINNET"), Network::Bitcoin);
            assert_eq!(resolve_network("FRACTAL_BITCOIN_MAINNET"), Network::Bitcoin);
        }

        #[test]
        fn test_variants_resolve_to_testnet() {
            for id in [
                "BITCOIN_TESTNET",
                "BITCOIN_TESTNET4",
                "BITCOIN_SIGNET",
                "FRACTAL_BITCOIN_TESTNET",
            ] {
                assert_eq!(resolve_network(id), Network::Testnet, "{id}");
            }
        }

        #[test]
        fn test_unknown_identifier_falls_back_to_mainnet() {
            assert_eq!(resolve_network("LITECOIN"), Network::Bitcoin);
            assert_eq!(resolve_network(""), Network::Bitcoin);
        }

        #[test]
        fn test_identifiers_are_case_insensitive_and_trimmed() {
            assert_eq!(resolve_network("  bitcoin_signet "), Network::Testnet);
        }
    }

    mod chain_type {
        use super::*;

        #[test]
        fn test_identifiers_round_trip() {
            for chain in ChainType::ALL {
                assert_eq!(ChainType::from_identifier(chain.as_str()), Some(chain));
            }
        }

        #[cfg(feature = "serde")]
        #[test]
        fn test_serde_uses_wallet_identifiers() {
            let json = serde_json::to_string(&ChainType::BitcoinTestnet4).unwrap();
            assert_eq!(json, "\"BITCOIN_TESTNET4\"");

            let chain: ChainType = serde_json::from_str("\"FRACTAL_BITCOIN_MAINNET\"").unwrap();
            assert_eq!(chain, ChainType::FractalBitcoinMainnet);
        }
    }
}
