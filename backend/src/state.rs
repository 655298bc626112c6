//! Shared router state. Without a reachable read endpoint the server still
//! starts and chain-backed routes report the outage.

use std::sync::Arc;

use crate::aggregate::Catalog;
use crate::chain::registry::{
    BlockHeight, CommitteeRegistry, EvmCommitteeRegistry, EvmCreditRegistry, EvmForestRegistry, RpcBlockHeight,
};
use crate::chain::{abi, resolve_read_provider, EvmContract, ReadHandle, ReadSource};
use crate::config::AppConfig;
use crate::error::{ApiError, ChainError};
use crate::metadata::HttpGateway;
use crate::writer::{Broadcaster, SignerBroadcaster, TxSubmitter};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub chain: ChainStatus,
    pub writer: Arc<TxSubmitter>,
}

#[derive(Clone)]
pub enum ChainStatus {
    Ready(Arc<ChainHandles>),
    Unavailable(String),
}

pub struct ChainHandles {
    pub source: ReadSource,
    pub catalog: Catalog,
    pub committees: Arc<dyn CommitteeRegistry>,
    pub head: Arc<dyn BlockHeight>,
}

impl AppState {
    pub fn new(config: AppConfig, chain: ChainStatus, writer: TxSubmitter) -> Self {
        Self {
            config: Arc::new(config),
            chain,
            writer: Arc::new(writer),
        }
    }

    pub async fn connect(config: AppConfig) -> Result<Self, ChainError> {
        let (chain, broadcaster) = match ChainHandles::connect(&config).await {
            Ok((handles, broadcaster)) => (ChainStatus::Ready(Arc::new(handles)), broadcaster),
            Err(e) => {
                log::error!("Starting without chain access: {}", e);
                (ChainStatus::Unavailable(e.to_string()), None)
            }
        };
        // Without chain access there is no signer, so writes fail on their
        // precondition rather than on the outage.
        let writer = TxSubmitter::new(
            config.contracts,
            broadcaster,
            config.rpc_timeout,
            config.tx_confirm_timeout,
        )?;
        Ok(Self::new(config, chain, writer))
    }

    /// Handles for chain-backed routes, or 503 when the chain is unreachable.
    pub fn chain(&self) -> Result<&ChainHandles, ApiError> {
        match &self.chain {
            ChainStatus::Ready(handles) => Ok(handles),
            ChainStatus::Unavailable(reason) => Err(ChainError::Unavailable(reason.clone()).into()),
        }
    }
}

impl ChainHandles {
    async fn connect(config: &AppConfig) -> Result<(Self, Option<Arc<dyn Broadcaster>>), ChainError> {
        let ReadHandle { source, chain_id, provider } =
            resolve_read_provider(config.wallet_rpc_url.as_deref(), &config.rpc_url, config.rpc_timeout).await?;

        let contract = |name, address, parsed| {
            EvmContract::new(name, address, parsed, provider.clone(), config.rpc_timeout)
        };
        let forest = EvmForestRegistry::new(contract(
            "Plantarum721",
            config.contracts.plantarum721,
            abi::plantarum721()?,
        ));
        let credits = EvmCreditRegistry::new(contract(
            "Plantarum1155",
            config.contracts.plantarum1155,
            abi::plantarum1155()?,
        ));
        let committees = EvmCommitteeRegistry::new(contract(
            "PlantarumCommittees",
            config.contracts.committees,
            abi::committees()?,
        ));

        let gateway = HttpGateway::new(&config.ipfs_gateway, config.gateway_timeout)
            .map_err(|e| ChainError::Unavailable(format!("gateway client: {}", e)))?;
        let catalog = Catalog::new(
            Arc::new(forest),
            Arc::new(credits),
            Arc::new(gateway),
            config.fetch_concurrency,
            &config.ipfs_gateway,
        );

        let broadcaster: Option<Arc<dyn Broadcaster>> = match &config.signer {
            Some(wallet) => Some(Arc::new(SignerBroadcaster::new(&provider, wallet.clone(), chain_id))),
            None => {
                log::warn!("No signer configured; write actions will be rejected");
                None
            }
        };

        let head = RpcBlockHeight::new(provider, config.rpc_timeout);
        let block = head.block_number().await?;
        log::info!("Chain {} ready at block {}", chain_id, block);

        let handles = Self {
            source,
            catalog,
            committees: Arc::new(committees),
            head: Arc::new(head),
        };
        Ok((handles, broadcaster))
    }
}
