use dotenv::dotenv;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// PLNTX faucet token deployed next to the marketplace contracts.
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x14bb43297537ecAF30657216be7EC651c90a123f";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

#[derive(Debug, Deserialize)]
struct RawConfig {
    rpc_url: String,
    wallet_rpc_url: Option<String>,
    plantarum721_address: String,
    plantarum1155_address: String,
    committees_address: String,
    plantarum_token_address: String,
    signer_private_key: Option<String>,
    ipfs_gateway: String,
    fetch_concurrency: usize,
    gateway_timeout_secs: u64,
    rpc_timeout_secs: u64,
    tx_confirm_timeout_secs: u64,
    port: u16,
    jwt_secret: String,
    admin_api_key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub plantarum721: Address,
    pub plantarum1155: Address,
    pub committees: Address,
    pub token: Address,
}

#[derive(Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub wallet_rpc_url: Option<String>,
    pub contracts: ContractAddresses,
    pub signer: Option<LocalWallet>,
    pub ipfs_gateway: String,
    pub fetch_concurrency: usize,
    pub gateway_timeout: Duration,
    pub rpc_timeout: Duration,
    pub tx_confirm_timeout: Duration,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_api_key: String,
}

// Keeps the signer key and secrets out of the startup log line.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("rpc_url", &self.rpc_url)
            .field("wallet_rpc_url", &self.wallet_rpc_url)
            .field("contracts", &self.contracts)
            .field("signer", &self.signer.as_ref().map(|wallet| wallet.address()))
            .field("ipfs_gateway", &self.ipfs_gateway)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("rpc_timeout", &self.rpc_timeout)
            .field("tx_confirm_timeout", &self.tx_confirm_timeout)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // Load .env file if present
        Self::build(config::Environment::default())
    }

    /// Builds the configuration from an explicit variable map instead of the
    /// process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(config::Environment::default().source(Some(vars)))
    }

    fn build(env: config::Environment) -> Result<Self, Box<dyn std::error::Error>> {
        let raw: RawConfig = config::Config::builder()
            .set_default("plantarum_token_address", DEFAULT_TOKEN_ADDRESS)?
            .set_default("ipfs_gateway", DEFAULT_IPFS_GATEWAY)?
            .set_default("fetch_concurrency", 8)?
            .set_default("gateway_timeout_secs", 15)?
            .set_default("rpc_timeout_secs", 20)?
            .set_default("tx_confirm_timeout_secs", 120)?
            .set_default("port", 8080)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        let contracts = ContractAddresses {
            plantarum721: parse_address("PLANTARUM721_ADDRESS", &raw.plantarum721_address)?,
            plantarum1155: parse_address("PLANTARUM1155_ADDRESS", &raw.plantarum1155_address)?,
            committees: parse_address("COMMITTEES_ADDRESS", &raw.committees_address)?,
            token: parse_address("PLANTARUM_TOKEN_ADDRESS", &raw.plantarum_token_address)?,
        };

        let signer = raw
            .signer_private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(parse_signer)
            .transpose()?;

        Ok(Self {
            rpc_url: raw.rpc_url,
            wallet_rpc_url: raw.wallet_rpc_url.filter(|url| !url.trim().is_empty()),
            contracts,
            signer,
            ipfs_gateway: raw.ipfs_gateway,
            fetch_concurrency: raw.fetch_concurrency.max(1),
            gateway_timeout: Duration::from_secs(raw.gateway_timeout_secs),
            rpc_timeout: Duration::from_secs(raw.rpc_timeout_secs),
            tx_confirm_timeout: Duration::from_secs(raw.tx_confirm_timeout_secs),
            port: raw.port,
            jwt_secret: raw.jwt_secret,
            admin_api_key: raw.admin_api_key,
        })
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, Box<dyn std::error::Error>> {
    Address::from_str(value.trim()).map_err(|e| format!("{} is not a valid address: {}", key, e).into())
}

fn parse_signer(key: &str) -> Result<LocalWallet, Box<dyn std::error::Error>> {
    key.strip_prefix("0x")
        .unwrap_or(key)
        .parse::<LocalWallet>()
        .map_err(|e| format!("SIGNER_PRIVATE_KEY is not a valid private key: {}", e).into())
}
