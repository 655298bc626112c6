//! Transaction submission. Without a signer every action fails with its
//! fixed message before touching the network.

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Middleware, PendingTransaction};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256, U64};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::chain::{abi, ReadProvider};
use crate::config::ContractAddresses;
use crate::error::{ChainError, WriteError};

pub const CONNECT_TO_MINT: &str = "Conecta tu wallet para mintear";
pub const CONNECT_WALLET: &str = "Conecta tu wallet";
pub const ONLY_DAO_BURNS: &str = "Solo DAO/SuperAdmin puede quemar";
pub const ONLY_ADMIN_PAUSES: &str = "Solo SuperAdmin puede pausar";
pub const ONLY_ADMIN_UNPAUSES: &str = "Solo SuperAdmin puede despausar";

/// A mutating contract call, as posted by clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WriteAction {
    MintConservation { to: Address, hash_id: String, coords: String, token_uri: String },
    MintForestAsset { to: Address, hash_id: String, coords: String, token_uri: String, price: String },
    ListForSale { token_id: u64, price: String },
    CancelSale { token_id: u64 },
    BuyNow { token_id: u64, price: String },
    StartAuction { token_id: u64, base_price: String, duration_seconds: u64 },
    PlaceBid { token_id: u64, bid: String },
    FinalizeAuction { token_id: u64 },
    DaoBurn { token_id: u64 },
    Pause,
    Unpause,
    BuyCarbon { token_id: u64, price: String },
    BuyProject { token_id: u64, amount: u64, price: String },
    CreateCommittee { name: String, description: String, image: String },
    ApproveCommittee { committee_id: u64 },
    RejectCommittee { committee_id: u64 },
    UpdateCommitteeImage { committee_id: u64, image: String },
    RequestJoinCommittee { committee_id: u64 },
    ApproveJoinCommittee { committee_id: u64, applicant: Address },
    RejectJoinCommittee { committee_id: u64, applicant: Address },
    RemoveCommitteeMember { committee_id: u64, member: Address },
    CreateCommitteeProposal {
        committee_id: u64,
        title: String,
        description: String,
        duration_index: u64,
        hash_id: String,
        file_hash: String,
    },
    VoteCommitteeProposal { proposal_id: u64, support: bool },
    ExecuteCommitteeProposal { proposal_id: u64 },
    Faucet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Plantarum721,
    Plantarum1155,
    Committees,
    Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCall {
    pub target: Target,
    pub function: &'static str,
    pub args: Vec<Token>,
    pub value: Option<U256>,
}

fn ether(raw: &str) -> Result<U256, WriteError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(WriteError::InvalidAmount(raw.to_string(), "must be a positive decimal".into()));
    }
    ethers::utils::parse_ether(trimmed).map_err(|e| WriteError::InvalidAmount(raw.to_string(), e.to_string()))
}

fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

fn text(value: &str) -> Token {
    Token::String(value.to_string())
}

impl WriteAction {
    /// Message returned when the action is attempted without a signer.
    pub fn precondition_message(&self) -> &'static str {
        match self {
            WriteAction::MintConservation { .. } | WriteAction::MintForestAsset { .. } => CONNECT_TO_MINT,
            WriteAction::DaoBurn { .. } => ONLY_DAO_BURNS,
            WriteAction::Pause => ONLY_ADMIN_PAUSES,
            WriteAction::Unpause => ONLY_ADMIN_UNPAUSES,
            _ => CONNECT_WALLET,
        }
    }

    pub fn encode(&self) -> Result<EncodedCall, WriteError> {
        use Target::{Committees, Plantarum1155, Plantarum721};
        let call = |target, function, args| EncodedCall { target, function, args, value: None };
        let paid = |target, function, args, value| EncodedCall { target, function, args, value: Some(value) };

        Ok(match self {
            WriteAction::MintConservation { to, hash_id, coords, token_uri } => call(
                Plantarum721,
                "mintConservation",
                vec![Token::Address(*to), text(hash_id), text(coords), text(token_uri)],
            ),
            WriteAction::MintForestAsset { to, hash_id, coords, token_uri, price } => call(
                Plantarum721,
                "mintForestAsset",
                vec![Token::Address(*to), text(hash_id), text(coords), text(token_uri), Token::Uint(ether(price)?)],
            ),
            WriteAction::ListForSale { token_id, price } => {
                call(Plantarum721, "listForSale", vec![uint(*token_id), Token::Uint(ether(price)?)])
            }
            WriteAction::CancelSale { token_id } => call(Plantarum721, "cancelSale", vec![uint(*token_id)]),
            WriteAction::BuyNow { token_id, price } => paid(Plantarum721, "buyNow", vec![uint(*token_id)], ether(price)?),
            WriteAction::StartAuction { token_id, base_price, duration_seconds } => {
                if *duration_seconds == 0 {
                    return Err(WriteError::InvalidArgument("auction duration must be positive".into()));
                }
                call(
                    Plantarum721,
                    "startAuction",
                    vec![uint(*token_id), Token::Uint(ether(base_price)?), uint(*duration_seconds)],
                )
            }
            WriteAction::PlaceBid { token_id, bid } => paid(Plantarum721, "placeBid", vec![uint(*token_id)], ether(bid)?),
            WriteAction::FinalizeAuction { token_id } => call(Plantarum721, "finalizeAuction", vec![uint(*token_id)]),
            WriteAction::DaoBurn { token_id } => call(Plantarum721, "daoBurn", vec![uint(*token_id)]),
            WriteAction::Pause => call(Plantarum721, "pause", vec![]),
            WriteAction::Unpause => call(Plantarum721, "unpause", vec![]),
            WriteAction::BuyCarbon { token_id, price } => {
                paid(Plantarum1155, "buyNow", vec![uint(*token_id)], ether(price)?)
            }
            WriteAction::BuyProject { token_id, amount, price } => {
                if *amount == 0 {
                    return Err(WriteError::InvalidArgument("amount must be positive".into()));
                }
                paid(Plantarum1155, "buyProject", vec![uint(*token_id), uint(*amount)], ether(price)?)
            }
            WriteAction::CreateCommittee { name, description, image } => {
                call(Committees, "createCommittee", vec![text(name), text(description), text(image)])
            }
            WriteAction::ApproveCommittee { committee_id } => {
                call(Committees, "approveCommittee", vec![uint(*committee_id)])
            }
            WriteAction::RejectCommittee { committee_id } => {
                call(Committees, "rejectCommittee", vec![uint(*committee_id)])
            }
            WriteAction::UpdateCommitteeImage { committee_id, image } => {
                call(Committees, "updateCommitteeImage", vec![uint(*committee_id), text(image)])
            }
            WriteAction::RequestJoinCommittee { committee_id } => {
                call(Committees, "requestJoinCommittee", vec![uint(*committee_id)])
            }
            WriteAction::ApproveJoinCommittee { committee_id, applicant } => call(
                Committees,
                "approveJoinCommittee",
                vec![uint(*committee_id), Token::Address(*applicant)],
            ),
            WriteAction::RejectJoinCommittee { committee_id, applicant } => call(
                Committees,
                "rejectJoinCommittee",
                vec![uint(*committee_id), Token::Address(*applicant)],
            ),
            WriteAction::RemoveCommitteeMember { committee_id, member } => call(
                Committees,
                "removeCommitteeMember",
                vec![uint(*committee_id), Token::Address(*member)],
            ),
            WriteAction::CreateCommitteeProposal { committee_id, title, description, duration_index, hash_id, file_hash } => {
                call(
                    Committees,
                    "createCommitteeProposal",
                    vec![
                        uint(*committee_id),
                        text(title),
                        text(description),
                        uint(*duration_index),
                        text(hash_id),
                        text(file_hash),
                    ],
                )
            }
            WriteAction::VoteCommitteeProposal { proposal_id, support } => {
                call(Committees, "voteCommitteeProposal", vec![uint(*proposal_id), Token::Bool(*support)])
            }
            WriteAction::ExecuteCommitteeProposal { proposal_id } => {
                call(Committees, "executeCommitteeProposal", vec![uint(*proposal_id)])
            }
            WriteAction::Faucet => call(Target::Token, "faucet", vec![]),
        })
    }
}

/// Sends signed transactions and waits for their receipts.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, to: Address, data: Bytes, value: Option<U256>) -> Result<TxHash, WriteError>;
    async fn confirm(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>, WriteError>;
}

pub type SignerClient = SignerMiddleware<ReadProvider, LocalWallet>;

pub struct SignerBroadcaster {
    client: Arc<SignerClient>,
}

impl SignerBroadcaster {
    pub fn new(provider: &ReadProvider, wallet: LocalWallet, chain_id: u64) -> Self {
        let wallet = wallet.with_chain_id(chain_id);
        log::info!("Signer {:?} ready on chain {}", wallet.address(), chain_id);
        Self {
            client: Arc::new(SignerMiddleware::new(provider.clone(), wallet)),
        }
    }
}

#[async_trait]
impl Broadcaster for SignerBroadcaster {
    async fn broadcast(&self, to: Address, data: Bytes, value: Option<U256>) -> Result<TxHash, WriteError> {
        let mut tx = TransactionRequest::new().to(to).data(data);
        if let Some(value) = value {
            tx = tx.value(value);
        }
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| WriteError::Broadcast(e.to_string()))?;
        Ok(*pending)
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>, WriteError> {
        PendingTransaction::new(tx_hash, self.client.provider())
            .interval(Duration::from_secs(2))
            .await
            .map_err(|e| WriteError::Confirmation(e.to_string()))
    }
}

#[derive(Clone)]
struct ContractAbis {
    plantarum721: Abi,
    plantarum1155: Abi,
    committees: Abi,
    token: Abi,
}

pub struct TxSubmitter {
    abis: ContractAbis,
    addresses: ContractAddresses,
    broadcaster: Option<Arc<dyn Broadcaster>>,
    submit_timeout: Duration,
    confirm_timeout: Duration,
}

impl TxSubmitter {
    pub fn new(
        addresses: ContractAddresses,
        broadcaster: Option<Arc<dyn Broadcaster>>,
        submit_timeout: Duration,
        confirm_timeout: Duration,
    ) -> Result<Self, ChainError> {
        Ok(Self {
            abis: ContractAbis {
                plantarum721: abi::plantarum721()?,
                plantarum1155: abi::plantarum1155()?,
                committees: abi::committees()?,
                token: abi::plantarum_token()?,
            },
            addresses,
            broadcaster,
            submit_timeout,
            confirm_timeout,
        })
    }

    pub fn has_signer(&self) -> bool {
        self.broadcaster.is_some()
    }

    fn target(&self, target: Target) -> (Address, &Abi) {
        match target {
            Target::Plantarum721 => (self.addresses.plantarum721, &self.abis.plantarum721),
            Target::Plantarum1155 => (self.addresses.plantarum1155, &self.abis.plantarum1155),
            Target::Committees => (self.addresses.committees, &self.abis.committees),
            Target::Token => (self.addresses.token, &self.abis.token),
        }
    }

    /// Submits `action` and returns its hash once it is mined successfully.
    pub async fn execute(&self, action: &WriteAction) -> Result<TxHash, WriteError> {
        let Some(broadcaster) = self.broadcaster.as_ref() else {
            return Err(WriteError::Precondition(action.precondition_message()));
        };

        let call = action.encode()?;
        let (address, abi) = self.target(call.target);
        let data = abi
            .function(call.function)
            .and_then(|f| f.encode_input(&call.args))
            .map_err(|e| WriteError::Encode(format!("{}: {}", call.function, e)))?;

        log::info!("Submitting {} to {:?}", call.function, address);
        // Signing fills nonce and gas over RPC before anything is sent.
        let tx_hash = tokio::time::timeout(self.submit_timeout, broadcaster.broadcast(address, data.into(), call.value))
            .await
            .map_err(|_| WriteError::Broadcast(format!("{} not sent within {:?}", call.function, self.submit_timeout)))??;
        log::info!("Transaction {:?} sent, waiting up to {:?}", tx_hash, self.confirm_timeout);

        let receipt = match tokio::time::timeout(self.confirm_timeout, broadcaster.confirm(tx_hash)).await {
            Ok(receipt) => receipt?,
            Err(_) => {
                log::warn!("Transaction {:?} not confirmed within {:?}", tx_hash, self.confirm_timeout);
                return Err(WriteError::ConfirmationTimeout { tx_hash });
            }
        };

        match receipt {
            None => Err(WriteError::Dropped { tx_hash }),
            Some(receipt) if receipt.status == Some(U64::zero()) => Err(WriteError::Reverted { tx_hash }),
            Some(_) => {
                log::info!("Transaction {:?} confirmed", tx_hash);
                Ok(tx_hash)
            }
        }
    }
}
