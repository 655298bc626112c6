//! Read access to the deployed contracts. Reads prefer the wallet endpoint
//! and fall back to the public RPC.

pub mod abi;
pub mod decode;
pub mod registry;

use ethers::abi::{Abi, Token};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ChainError;

pub type ReadProvider = Provider<Http>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSource {
    Wallet,
    Public,
}

#[derive(Clone, Debug)]
pub struct ReadHandle {
    pub source: ReadSource,
    pub chain_id: u64,
    pub provider: Arc<ReadProvider>,
}

/// Bounds an RPC round trip. A stalled endpoint becomes an `Rpc` error.
pub async fn with_timeout<T, E, F>(limit: Duration, what: &str, call: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| ChainError::Rpc(format!("{} timed out after {:?}", what, limit)))?
        .map_err(ChainError::from_rpc)
}

pub async fn resolve_read_provider(
    wallet_url: Option<&str>,
    fallback_url: &str,
    timeout: Duration,
) -> Result<ReadHandle, ChainError> {
    if let Some(url) = wallet_url {
        match connect(url, timeout).await {
            Ok((provider, chain_id)) => {
                log::info!("Reading chain {} through wallet endpoint {}", chain_id, url);
                return Ok(ReadHandle {
                    source: ReadSource::Wallet,
                    chain_id,
                    provider: Arc::new(provider),
                });
            }
            Err(e) => log::warn!("Wallet endpoint {} unusable, falling back to public RPC: {}", url, e),
        }
    }

    let (provider, chain_id) = connect(fallback_url, timeout)
        .await
        .map_err(|e| ChainError::Unavailable(format!("{}: {}", fallback_url, e)))?;
    log::info!("Reading chain {} through public endpoint {}", chain_id, fallback_url);
    Ok(ReadHandle {
        source: ReadSource::Public,
        chain_id,
        provider: Arc::new(provider),
    })
}

async fn connect(url: &str, timeout: Duration) -> Result<(ReadProvider, u64), ChainError> {
    let provider = Provider::<Http>::try_from(url).map_err(|e| ChainError::Unavailable(e.to_string()))?;
    let chain_id = with_timeout(timeout, "eth_chainId", provider.get_chainid()).await?;
    Ok((provider, chain_id.as_u64()))
}

/// A deployed contract bound to a read provider.
pub struct EvmContract<M = ReadProvider> {
    name: &'static str,
    address: Address,
    abi: Abi,
    provider: Arc<M>,
    timeout: Duration,
}

impl<M: Middleware> EvmContract<M> {
    pub fn new(name: &'static str, address: Address, abi: Abi, provider: Arc<M>, timeout: Duration) -> Self {
        Self { name, address, abi, provider, timeout }
    }

    /// `eth_call` of a view function, returning the decoded output tokens.
    pub async fn call(&self, function_name: &str, args: &[Token]) -> Result<Vec<Token>, ChainError> {
        let qualified = format!("{}.{}", self.name, function_name);
        let function = self
            .abi
            .function(function_name)
            .map_err(|e| ChainError::Abi(format!("{}: {}", qualified, e)))?;
        let data = function
            .encode_input(args)
            .map_err(|e| ChainError::Abi(format!("{}: {}", qualified, e)))?;
        let tx: TypedTransaction = TransactionRequest::new().to(self.address).data(data).into();

        let raw = with_timeout(self.timeout, &qualified, self.provider.call(&tx, None)).await?;
        function
            .decode_output(&raw)
            .map_err(|e| ChainError::decode("call output", format!("{}: {}", qualified, e)))
    }
}
