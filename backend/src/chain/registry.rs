
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

use super::{decode, with_timeout, EvmContract, ReadProvider};
use crate::error::ChainError;
use crate::models::{CarbonMeta, Committee, CommitteeProposal, TokenId, TokenMeta};

/// Plantarum721: forest and conservation plots.
#[async_trait]
pub trait ForestRegistry: Send + Sync {
    async fn all_tokens(&self) -> Result<Vec<TokenId>, ChainError>;
    async fn tokens_by_type(&self, asset_type: &str) -> Result<Vec<TokenId>, ChainError>;
    async fn tokens_by_owner(&self, owner: Address) -> Result<Vec<TokenId>, ChainError>;
    async fn token_meta(&self, id: TokenId) -> Result<TokenMeta, ChainError>;
    async fn token_uri(&self, id: TokenId) -> Result<String, ChainError>;
    async fn token_full(&self, id: TokenId) -> Result<(TokenMeta, String), ChainError>;
}

/// Plantarum1155: carbon credits and project shares.
#[async_trait]
pub trait CreditRegistry: Send + Sync {
    async fn all_tokens(&self) -> Result<Vec<TokenId>, ChainError>;
    async fn uri(&self, id: TokenId) -> Result<String, ChainError>;
    async fn carbon_meta(&self, id: TokenId) -> Result<CarbonMeta, ChainError>;
}

#[async_trait]
pub trait CommitteeRegistry: Send + Sync {
    async fn all_committees(&self) -> Result<Vec<Committee>, ChainError>;
    async fn committee_by_id(&self, id: u64) -> Result<Committee, ChainError>;
    async fn committee_proposals(&self, committee_id: u64) -> Result<Vec<CommitteeProposal>, ChainError>;
    async fn proposal_by_id(&self, id: u64) -> Result<CommitteeProposal, ChainError>;
}

#[async_trait]
pub trait BlockHeight: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;
}

pub struct RpcBlockHeight<M = ReadProvider> {
    provider: Arc<M>,
    timeout: Duration,
}

impl<M: Middleware> RpcBlockHeight<M> {
    pub fn new(provider: Arc<M>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl<M: Middleware + 'static> BlockHeight for RpcBlockHeight<M> {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let number = with_timeout(self.timeout, "eth_blockNumber", self.provider.get_block_number()).await?;
        Ok(number.as_u64())
    }
}

fn id_arg(id: u64) -> Token {
    Token::Uint(U256::from(id))
}

pub struct EvmForestRegistry<M = ReadProvider> {
    contract: EvmContract<M>,
}

impl<M: Middleware> EvmForestRegistry<M> {
    pub fn new(contract: EvmContract<M>) -> Self {
        Self { contract }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ForestRegistry for EvmForestRegistry<M> {
    async fn all_tokens(&self) -> Result<Vec<TokenId>, ChainError> {
        decode::token_ids(self.contract.call("getAllTokens", &[]).await?)
    }

    async fn tokens_by_type(&self, asset_type: &str) -> Result<Vec<TokenId>, ChainError> {
        let args = [Token::String(asset_type.to_string())];
        decode::token_ids(self.contract.call("getTokensByType", &args).await?)
    }

    async fn tokens_by_owner(&self, owner: Address) -> Result<Vec<TokenId>, ChainError> {
        decode::token_ids(self.contract.call("getTokensByOwner", &[Token::Address(owner)]).await?)
    }

    async fn token_meta(&self, id: TokenId) -> Result<TokenMeta, ChainError> {
        let out = self.contract.call("getTokenMeta", &[id_arg(id)]).await?;
        decode::token_meta(decode::single(out, "token meta")?)
    }

    async fn token_uri(&self, id: TokenId) -> Result<String, ChainError> {
        let out = self.contract.call("tokenURI", &[id_arg(id)]).await?;
        decode::string(decode::single(out, "token uri")?, "token uri")
    }

    async fn token_full(&self, id: TokenId) -> Result<(TokenMeta, String), ChainError> {
        decode::token_full(self.contract.call("getTokenFull", &[id_arg(id)]).await?)
    }
}

pub struct EvmCreditRegistry<M = ReadProvider> {
    contract: EvmContract<M>,
}

impl<M: Middleware> EvmCreditRegistry<M> {
    pub fn new(contract: EvmContract<M>) -> Self {
        Self { contract }
    }
}

#[async_trait]
impl<M: Middleware + 'static> CreditRegistry for EvmCreditRegistry<M> {
    async fn all_tokens(&self) -> Result<Vec<TokenId>, ChainError> {
        decode::token_ids(self.contract.call("getAllTokens", &[]).await?)
    }

    async fn uri(&self, id: TokenId) -> Result<String, ChainError> {
        let out = self.contract.call("uri", &[id_arg(id)]).await?;
        decode::string(decode::single(out, "token uri")?, "token uri")
    }

    async fn carbon_meta(&self, id: TokenId) -> Result<CarbonMeta, ChainError> {
        let out = self.contract.call("getCarbonMeta", &[id_arg(id)]).await?;
        decode::carbon_meta(decode::single(out, "carbon meta")?)
    }
}

pub struct EvmCommitteeRegistry<M = ReadProvider> {
    contract: EvmContract<M>,
}

impl<M: Middleware> EvmCommitteeRegistry<M> {
    pub fn new(contract: EvmContract<M>) -> Self {
        Self { contract }
    }
}

#[async_trait]
impl<M: Middleware + 'static> CommitteeRegistry for EvmCommitteeRegistry<M> {
    async fn all_committees(&self) -> Result<Vec<Committee>, ChainError> {
        decode::committees(self.contract.call("getAllCommittees", &[]).await?)
    }

    async fn committee_by_id(&self, id: u64) -> Result<Committee, ChainError> {
        let out = self.contract.call("getCommitteeById", &[id_arg(id)]).await?;
        decode::committee(decode::single(out, "committee")?)
    }

    async fn committee_proposals(&self, committee_id: u64) -> Result<Vec<CommitteeProposal>, ChainError> {
        decode::proposals(self.contract.call("getAllCommitteeProposals", &[id_arg(committee_id)]).await?)
    }

    async fn proposal_by_id(&self, id: u64) -> Result<CommitteeProposal, ChainError> {
        let out = self.contract.call("getCommitteeProposalById", &[id_arg(id)]).await?;
        decode::proposal(decode::single(out, "committee proposal")?)
    }
}
