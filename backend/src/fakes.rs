//! In-memory registries and gateway for tests.

use async_trait::async_trait;
use ethers::types::{Address, U256};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::chain::registry::{BlockHeight, CommitteeRegistry, CreditRegistry, ForestRegistry};
use crate::error::{ChainError, FetchError};
use crate::metadata::MetadataFetcher;
use crate::models::{CarbonMeta, Committee, CommitteeProposal, CommitteeStatus, TokenId, TokenMeta};

pub fn meta(coords: &str, price_wei: u64, listed: bool) -> TokenMeta {
    TokenMeta {
        wallet_owner: Address::repeat_byte(0x11),
        hash_id: "hash".into(),
        coords: coords.into(),
        timestamp: 1_700_000_000,
        price: U256::from(price_wei),
        listed,
        is_auction: false,
        auction_deadline: 0,
    }
}

pub fn carbon(listed: bool) -> CarbonMeta {
    CarbonMeta {
        creator: Address::repeat_byte(0x22),
        price: U256::exp10(18),
        supply: 100,
        standard: "VCS".into(),
        project_type: "reforestation".into(),
        vintage: 2024,
        verification_body: "Verra".into(),
        expiry_date: 1_900_000_000,
        listed,
    }
}

#[derive(Default)]
pub struct FakeForest {
    pub tokens: HashMap<TokenId, (TokenMeta, String)>,
    pub by_type: HashMap<String, Vec<TokenId>>,
    pub by_owner: HashMap<Address, Vec<TokenId>>,
    pub all: Vec<TokenId>,
    pub fail_listing: bool,
}

impl FakeForest {
    /// Registers a token under `asset_type`, also adding it to `all`.
    pub fn with(mut self, id: TokenId, asset_type: &str, meta: TokenMeta, uri: &str) -> Self {
        self.by_type.entry(asset_type.to_string()).or_default().push(id);
        self.by_owner.entry(meta.wallet_owner).or_default().push(id);
        self.all.push(id);
        self.tokens.insert(id, (meta, uri.to_string()));
        self
    }

    /// Lists an identifier that has no token behind it (burned).
    pub fn with_burned(mut self, id: TokenId, asset_type: &str) -> Self {
        self.by_type.entry(asset_type.to_string()).or_default().push(id);
        self.all.push(id);
        self
    }

    fn listing(&self, ids: Option<&Vec<TokenId>>) -> Result<Vec<TokenId>, ChainError> {
        if self.fail_listing {
            return Err(ChainError::Rpc("listing failed".into()));
        }
        Ok(ids.cloned().unwrap_or_default())
    }

    fn get(&self, id: TokenId) -> Result<&(TokenMeta, String), ChainError> {
        self.tokens
            .get(&id)
            .ok_or_else(|| ChainError::Reverted(format!("execution reverted: token {} does not exist", id)))
    }
}

#[async_trait]
impl ForestRegistry for FakeForest {
    async fn all_tokens(&self) -> Result<Vec<TokenId>, ChainError> {
        self.listing(Some(&self.all))
    }

    async fn tokens_by_type(&self, asset_type: &str) -> Result<Vec<TokenId>, ChainError> {
        self.listing(self.by_type.get(asset_type))
    }

    async fn tokens_by_owner(&self, owner: Address) -> Result<Vec<TokenId>, ChainError> {
        self.listing(self.by_owner.get(&owner))
    }

    async fn token_meta(&self, id: TokenId) -> Result<TokenMeta, ChainError> {
        Ok(self.get(id)?.0.clone())
    }

    async fn token_uri(&self, id: TokenId) -> Result<String, ChainError> {
        Ok(self.get(id)?.1.clone())
    }

    async fn token_full(&self, id: TokenId) -> Result<(TokenMeta, String), ChainError> {
        Ok(self.get(id)?.clone())
    }
}

#[derive(Default)]
pub struct FakeCredits {
    pub all: Vec<TokenId>,
    pub uris: HashMap<TokenId, String>,
    pub carbon: HashMap<TokenId, CarbonMeta>,
    pub fail_listing: bool,
}

impl FakeCredits {
    pub fn with(mut self, id: TokenId, uri: &str, meta: Option<CarbonMeta>) -> Self {
        self.all.push(id);
        self.uris.insert(id, uri.to_string());
        if let Some(meta) = meta {
            self.carbon.insert(id, meta);
        }
        self
    }
}

#[async_trait]
impl CreditRegistry for FakeCredits {
    async fn all_tokens(&self) -> Result<Vec<TokenId>, ChainError> {
        if self.fail_listing {
            return Err(ChainError::Rpc("listing failed".into()));
        }
        Ok(self.all.clone())
    }

    async fn uri(&self, id: TokenId) -> Result<String, ChainError> {
        self.uris
            .get(&id)
            .cloned()
            .ok_or_else(|| ChainError::Reverted(format!("execution reverted: id {}", id)))
    }

    async fn carbon_meta(&self, id: TokenId) -> Result<CarbonMeta, ChainError> {
        self.carbon
            .get(&id)
            .cloned()
            .ok_or_else(|| ChainError::decode("carbon meta", "expected tuple"))
    }
}

#[derive(Default)]
pub struct FakeCommittees {
    pub committees: Vec<Committee>,
    pub proposals: Vec<CommitteeProposal>,
}

impl FakeCommittees {
    pub fn sample() -> Self {
        let committee = Committee {
            id: 1,
            name: "Bosques".into(),
            description: "Gestión forestal".into(),
            image: "ipfs://QmImg".into(),
            creator: Address::repeat_byte(0x33),
            status: CommitteeStatus::Approved,
            members: vec![Address::repeat_byte(0x33)],
        };
        let proposal = CommitteeProposal {
            id: 7,
            committee_id: 1,
            title: "Plan de reforestación".into(),
            description: "Fase 1".into(),
            proposer: Address::repeat_byte(0x33),
            deadline: 1_900_000_000,
            votes_for: 3,
            votes_against: 1,
            executed: false,
            hash_id: "hash".into(),
            file_hash: "QmFile".into(),
        };
        Self {
            committees: vec![committee],
            proposals: vec![proposal],
        }
    }
}

#[async_trait]
impl CommitteeRegistry for FakeCommittees {
    async fn all_committees(&self) -> Result<Vec<Committee>, ChainError> {
        Ok(self.committees.clone())
    }

    async fn committee_by_id(&self, id: u64) -> Result<Committee, ChainError> {
        self.committees
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ChainError::Reverted(format!("execution reverted: committee {}", id)))
    }

    async fn committee_proposals(&self, committee_id: u64) -> Result<Vec<CommitteeProposal>, ChainError> {
        Ok(self
            .proposals
            .iter()
            .filter(|p| p.committee_id == committee_id)
            .cloned()
            .collect())
    }

    async fn proposal_by_id(&self, id: u64) -> Result<CommitteeProposal, ChainError> {
        self.proposals
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ChainError::Reverted(format!("execution reverted: proposal {}", id)))
    }
}

/// Gateway that serves documents by token URI and counts requests.
#[derive(Default)]
pub struct FakeGateway {
    pub docs: HashMap<String, Value>,
    pub calls: AtomicUsize,
}

impl FakeGateway {
    pub fn with(mut self, uri: &str, doc: Value) -> Self {
        self.docs.insert(uri.to_string(), doc);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for FakeGateway {
    async fn fetch(&self, uri: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.docs.get(uri).cloned().ok_or(FetchError::Status(404))
    }
}

pub struct FixedBlock(pub u64);

#[async_trait]
impl BlockHeight for FixedBlock {
    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.0)
    }
}
