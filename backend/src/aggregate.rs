//! Enriches listed token ids with their record and document. A failing item
//! is dropped with a warning; only a failed listing fails the view.

use ethers::types::Address;
use futures::stream::{self, StreamExt};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::chain::registry::{CreditRegistry, ForestRegistry};
use crate::error::{ChainError, ItemError};
use crate::metadata::{MetadataFetcher, OffchainMetadata};
use crate::models::{format_date, format_ether, format_timestamp, CarbonCreditCard, TokenCard, TokenId};

pub const FOREST_TYPE: &str = "forest";
pub const CONSERVATION_TYPE: &str = "conservation";

/// Runs `enrich_one` for every id with at most `concurrency` in flight.
///
/// Output keeps input order. Items that fail, or resolve to `None`, are
/// left out.
pub async fn enrich<T, E, F, Fut>(ids: Vec<TokenId>, concurrency: usize, enrich_one: F) -> Vec<T>
where
    F: Fn(TokenId) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    stream::iter(ids)
        .map(|id| {
            let item = enrich_one(id);
            async move { (id, item.await) }
        })
        .buffered(concurrency.max(1))
        .filter_map(|(id, result)| async move {
            match result {
                Ok(item) => item,
                Err(e) => {
                    log::warn!("Token {} skipped: {}", id, e);
                    None
                }
            }
        })
        .collect()
        .await
}

/// Chain order is oldest first; views show newest first.
pub fn newest_first(mut ids: Vec<TokenId>) -> Vec<TokenId> {
    ids.reverse();
    ids
}

/// Read-side view over both token collections and the gateway.
#[derive(Clone)]
pub struct Catalog {
    pub(crate) forest: Arc<dyn ForestRegistry>,
    pub(crate) credits: Arc<dyn CreditRegistry>,
    pub(crate) fetcher: Arc<dyn MetadataFetcher>,
    pub(crate) concurrency: usize,
    pub(crate) gateway: String,
}

impl Catalog {
    pub fn new(
        forest: Arc<dyn ForestRegistry>,
        credits: Arc<dyn CreditRegistry>,
        fetcher: Arc<dyn MetadataFetcher>,
        concurrency: usize,
        gateway: &str,
    ) -> Self {
        Self {
            forest,
            credits,
            fetcher,
            concurrency: concurrency.max(1),
            gateway: gateway.to_string(),
        }
    }

    /// Listed forest assets.
    pub async fn forest_marketplace(&self) -> Result<Vec<TokenCard>, ChainError> {
        let ids = self.forest.tokens_by_type(FOREST_TYPE).await?;
        log::info!("Enriching {} forest tokens", ids.len());
        Ok(self.token_cards(ids, true).await)
    }

    /// Every conservation asset, listed or not.
    pub async fn natura_catalog(&self) -> Result<Vec<TokenCard>, ChainError> {
        let ids = self.forest.tokens_by_type(CONSERVATION_TYPE).await?;
        log::info!("Enriching {} conservation tokens", ids.len());
        Ok(self.token_cards(ids, false).await)
    }

    pub async fn owned_tokens(&self, owner: Address) -> Result<Vec<TokenCard>, ChainError> {
        let ids = self.forest.tokens_by_owner(owner).await?;
        Ok(self.token_cards(ids, false).await)
    }

    /// Listed carbon credits. Everything shown lives on chain, so no
    /// gateway fetch happens here.
    pub async fn carbon_marketplace(&self) -> Result<Vec<CarbonCreditCard>, ChainError> {
        let ids = self.credits.all_tokens().await?;
        Ok(enrich(newest_first(ids), self.concurrency, |id| self.carbon_card(id)).await)
    }

    async fn carbon_card(&self, id: TokenId) -> Result<Option<CarbonCreditCard>, ChainError> {
        let meta = self.credits.carbon_meta(id).await?;
        if !meta.listed {
            return Ok(None);
        }
        Ok(Some(CarbonCreditCard {
            id,
            creator: meta.creator,
            price: format_ether(meta.price),
            supply: meta.supply,
            standard: meta.standard,
            project_type: meta.project_type,
            vintage: meta.vintage,
            verification_body: meta.verification_body,
            expiry_date: format_date(meta.expiry_date),
            listed: meta.listed,
        }))
    }

    async fn token_cards(&self, ids: Vec<TokenId>, listed_only: bool) -> Vec<TokenCard> {
        enrich(newest_first(ids), self.concurrency, |id| self.token_card(id, listed_only)).await
    }

    async fn token_card(&self, id: TokenId, listed_only: bool) -> Result<Option<TokenCard>, ItemError> {
        let (meta, uri) = self.forest.token_full(id).await?;
        if listed_only && !meta.listed {
            return Ok(None);
        }
        let doc = OffchainMetadata::from_value(&self.fetcher.fetch(&uri).await?);
        Ok(Some(TokenCard {
            id,
            title: doc.titulo.clone().unwrap_or_else(|| format!("Token #{}", id)),
            image: doc.image(&self.gateway),
            asset_type: doc.tipo_activo,
            description: doc.descripcion,
            owner: meta.wallet_owner,
            price: format_ether(meta.price),
            listed: meta.listed,
            is_auction: meta.is_auction,
            auction_deadline: if meta.is_auction { format_timestamp(meta.auction_deadline) } else { None },
            hash_id: meta.hash_id,
            coords: meta.coords,
            metadata_uri: uri,
        }))
    }

    /// Off-chain document for a detail view; a failed fetch reads as an
    /// empty document so the view falls back to placeholders.
    pub(crate) async fn document_or_empty(&self, uri: &str) -> OffchainMetadata {
        match self.fetcher.fetch(uri).await {
            Ok(doc) => OffchainMetadata::from_value(&doc),
            Err(e) => {
                log::warn!("Metadata at {} unavailable, using placeholders: {}", uri, e);
                OffchainMetadata::default()
            }
        }
    }
}
