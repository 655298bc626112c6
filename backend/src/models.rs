use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

pub type TokenId = u64;

/// On-chain record of a Plantarum721 token (`getTokenMeta`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenMeta {
    pub wallet_owner: Address,
    pub hash_id: String,
    pub coords: String,
    pub timestamp: u64,
    pub price: U256,
    pub listed: bool,
    pub is_auction: bool,
    pub auction_deadline: u64,
}

/// On-chain record of a Plantarum1155 carbon credit (`getCarbonMeta`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonMeta {
    pub creator: Address,
    pub price: U256,
    pub supply: u64,
    pub standard: String,
    pub project_type: String,
    pub vintage: u64,
    pub verification_body: String,
    pub expiry_date: u64,
    pub listed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeStatus {
    Pending,
    Approved,
    Rejected,
    Unknown(u8),
}

impl From<u8> for CommitteeStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => CommitteeStatus::Pending,
            1 => CommitteeStatus::Approved,
            2 => CommitteeStatus::Rejected,
            other => CommitteeStatus::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Committee {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub creator: Address,
    pub status: CommitteeStatus,
    pub members: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitteeProposal {
    pub id: u64,
    pub committee_id: u64,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub deadline: u64,
    pub votes_for: u64,
    pub votes_against: u64,
    pub executed: bool,
    pub hash_id: String,
    pub file_hash: String,
}

/// File attachment of an off-chain document (`{"type": ..., "IpfsHash": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
}

/// A file attachment resolved onto the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    pub url: String,
}

/// Listing card for 721 assets (forest marketplace, natura catalog, owner view).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenCard {
    pub id: TokenId,
    pub title: String,
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub owner: Address,
    pub price: String,
    pub listed: bool,
    pub is_auction: bool,
    pub auction_deadline: Option<String>,
    pub hash_id: String,
    pub coords: String,
    pub metadata_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonCreditCard {
    pub id: TokenId,
    pub creator: Address,
    pub price: String,
    pub supply: u64,
    pub standard: String,
    pub project_type: String,
    pub vintage: u64,
    pub verification_body: String,
    pub expiry_date: Option<String>,
    pub listed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConservationDetail {
    pub id: TokenId,
    pub title: String,
    pub coords: String,
    pub estado: String,
    pub description: String,
    pub price: String,
    pub owner: Address,
    pub hash_id: String,
    pub uri: String,
    pub listed: bool,
    pub image: Option<String>,
    pub pdfs: Vec<Attachment>,
    pub comunidad_autonoma: String,
    pub provincia: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestDetail {
    pub id: TokenId,
    pub title: String,
    pub coords: String,
    pub legal: String,
    pub certificacion: String,
    pub price: String,
    pub owner: Address,
    pub hash_id: String,
    pub uri: String,
    pub listed: bool,
    pub is_auction: bool,
    pub auction_deadline: Option<String>,
    pub image: Option<String>,
    pub pdfs: Vec<Attachment>,
    pub comunidad_autonoma: String,
    pub provincia: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonDetail {
    pub id: TokenId,
    pub title: String,
    pub metodologia: String,
    pub certificador: String,
    pub toneladas_co2: String,
    pub price: String,
    pub supply: u64,
    pub owner: String,
    pub hash_id: String,
    pub uri: String,
    pub listed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDetail {
    pub id: TokenId,
    pub title: String,
    pub coords: String,
    pub price: String,
    pub supply: u64,
    pub creator: String,
    pub hash_id: String,
    pub maturity_date: String,
    pub yield_percent: String,
    pub phases: u64,
    pub uri: String,
    pub listed: bool,
}

/// Renders a wei amount the way wallets print ether: trailing zeros
/// dropped, at least one fractional digit.
pub fn format_ether(wei: U256) -> String {
    let formatted = ethers::utils::format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => format!("{}.0", formatted),
    }
}

/// Unix seconds to an RFC 3339 string; zero means "not set".
pub fn format_timestamp(secs: u64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
}

/// Unix seconds to a calendar date (`YYYY-MM-DD`).
pub fn format_date(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ether_formatting_trims_zeros() {
        assert_eq!(format_ether(U256::exp10(18)), "1.0");
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u128)), "1.5");
        assert_eq!(format_ether(U256::zero()), "0.0");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0), None);
        assert_eq!(format_timestamp(1_700_000_000).as_deref(), Some("2023-11-14T22:13:20+00:00"));
        assert_eq!(format_date(1_700_000_000).as_deref(), Some("2023-11-14"));
    }

    #[test]
    fn committee_status_from_raw() {
        assert_eq!(CommitteeStatus::from(1), CommitteeStatus::Approved);
        assert_eq!(CommitteeStatus::from(9), CommitteeStatus::Unknown(9));
    }
}
