use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Mainnet,
    Testnet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub chain_id: u64,
    pub name: String,
    pub kind: NetworkKind,
    /// JSON-RPC endpoint used for direct balance reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

impl Network {
    pub fn new(chain_id: u64, name: impl Into<String>, kind: NetworkKind) -> Self {
        Self {
            chain_id,
            name: name.into(),
            kind,
            rpc_url: None,
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn is_mainnet(&self) -> bool {
        self.kind == NetworkKind::Mainnet
    }
}

/// Directory of supported networks keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct Networks {
    by_chain: HashMap<u64, Network>,
}

impl Networks {
    pub fn new(networks: impl IntoIterator<Item = Network>) -> Self {
        Self {
            by_chain: networks.into_iter().map(|n| (n.chain_id, n)).collect(),
        }
    }

    /// Well-known chains, without RPC endpoints.
    pub fn builtin() -> Self {
        use NetworkKind::{Mainnet, Testnet};

        Self::new([
            Network::new(1, "Ethereum", Mainnet),
            Network::new(10, "OP Mainnet", Mainnet),
            Network::new(25, "Cronos", Mainnet),
            Network::new(50, "XDC Network", Mainnet),
            Network::new(56, "BNB Smart Chain", Mainnet),
            Network::new(106, "Velas", Mainnet),
            Network::new(122, "Fuse", Mainnet),
            Network::new(137, "Polygon", Mainnet),
            Network::new(169, "Manta Pacific", Mainnet),
            Network::new(250, "Fantom", Mainnet),
            Network::new(1088, "Metis Andromeda", Mainnet),
            Network::new(1101, "Polygon zkEVM", Mainnet),
            Network::new(1284, "Moonbeam", Mainnet),
            Network::new(5000, "Mantle", Mainnet),
            Network::new(8217, "Kaia", Mainnet),
            Network::new(8453, "Base", Mainnet),
            Network::new(32769, "Zilliqa EVM", Mainnet),
            Network::new(34443, "Mode", Mainnet),
            Network::new(42161, "Arbitrum One", Mainnet),
            Network::new(42220, "Celo", Mainnet),
            Network::new(43114, "Avalanche C-Chain", Mainnet),
            Network::new(1313161554, "Aurora", Mainnet),
            Network::new(97, "BNB Smart Chain Testnet", Testnet),
            Network::new(80002, "Polygon Amoy", Testnet),
            Network::new(11155111, "Sepolia", Testnet),
        ])
    }

    /// Add or replace networks.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = Network>) -> Self {
        for network in overrides {
            self.by_chain.insert(network.chain_id, network);
        }
        self
    }

    pub fn get(&self, chain_id: u64) -> Result<&Network, SyncError> {
        self.by_chain
            .get(&chain_id)
            .ok_or(SyncError::UnsupportedChain { chain_id })
    }

    pub fn len(&self) -> usize {
        self.by_chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chain.is_empty()
    }

    /// Networks sorted by chain id.
    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        let mut networks: Vec<&Network> = self.by_chain.values().collect();
        networks.sort_by_key(|n| n.chain_id);
        networks.into_iter()
    }
}
