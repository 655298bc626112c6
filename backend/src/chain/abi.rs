use ethers::abi::{parse_abi, Abi};

use crate::error::ChainError;

const PLANTARUM_721: &[&str] = &[
    "struct TokenMeta { address walletOwner; string hashId; string coords; uint256 timestamp; uint256 price; bool listed; bool isAuction; uint256 auctionDeadline; }",
    "function getAllTokens() external view returns (uint256[])",
    "function getTokensByType(string assetType) external view returns (uint256[])",
    "function getTokensByOwner(address owner) external view returns (uint256[])",
    "function getTokenMeta(uint256 tokenId) external view returns (TokenMeta)",
    "function getTokenFull(uint256 tokenId) external view returns (TokenMeta, string)",
    "function tokenURI(uint256 tokenId) external view returns (string)",
    "function mintConservation(address to, string hashId, string coords, string tokenURI) external",
    "function mintForestAsset(address to, string hashId, string coords, string tokenURI, uint256 price) external",
    "function listForSale(uint256 tokenId, uint256 price) external",
    "function cancelSale(uint256 tokenId) external",
    "function buyNow(uint256 tokenId) external payable",
    "function startAuction(uint256 tokenId, uint256 basePrice, uint256 duration) external",
    "function placeBid(uint256 tokenId) external payable",
    "function finalizeAuction(uint256 tokenId) external",
    "function daoBurn(uint256 tokenId) external",
    "function pause() external",
    "function unpause() external",
];

const PLANTARUM_1155: &[&str] = &[
    "struct CarbonMeta { address creator; uint256 price; uint256 supply; string standard; string projectType; uint256 vintage; string verificationBody; uint256 expiryDate; bool listed; }",
    "function getAllTokens() external view returns (uint256[])",
    "function uri(uint256 id) external view returns (string)",
    "function getCarbonMeta(uint256 id) external view returns (CarbonMeta)",
    "function buyNow(uint256 id) external payable",
    "function buyProject(uint256 id, uint256 amount) external payable",
];

const COMMITTEES: &[&str] = &[
    "struct Committee { uint256 id; string name; string description; string image; address creator; uint8 status; address[] members; }",
    "struct CommitteeProposal { uint256 id; uint256 committeeId; string title; string description; address proposer; uint256 deadline; uint256 votesFor; uint256 votesAgainst; bool executed; string hashId; string fileHash; }",
    "function getAllCommittees() external view returns (Committee[])",
    "function getCommitteeById(uint256 id) external view returns (Committee)",
    "function getAllCommitteeProposals(uint256 committeeId) external view returns (CommitteeProposal[])",
    "function getCommitteeProposalById(uint256 id) external view returns (CommitteeProposal)",
    "function createCommittee(string name, string description, string image) external",
    "function approveCommittee(uint256 id) external",
    "function rejectCommittee(uint256 id) external",
    "function updateCommitteeImage(uint256 id, string newImage) external",
    "function requestJoinCommittee(uint256 id) external",
    "function approveJoinCommittee(uint256 id, address applicant) external",
    "function rejectJoinCommittee(uint256 id, address applicant) external",
    "function removeCommitteeMember(uint256 id, address member) external",
    "function createCommitteeProposal(uint256 committeeId, string title, string description, uint256 durationIndex, string hashId, string fileHash) external",
    "function voteCommitteeProposal(uint256 proposalId, bool support) external",
    "function executeCommitteeProposal(uint256 proposalId) external",
];

const PLANTARUM_TOKEN: &[&str] = &["function faucet() external"];

fn parse(name: &str, fragments: &[&str]) -> Result<Abi, ChainError> {
    parse_abi(fragments).map_err(|e| ChainError::Abi(format!("{}: {}", name, e)))
}

pub fn plantarum721() -> Result<Abi, ChainError> {
    parse("Plantarum721", PLANTARUM_721)
}

pub fn plantarum1155() -> Result<Abi, ChainError> {
    parse("Plantarum1155", PLANTARUM_1155)
}

pub fn committees() -> Result<Abi, ChainError> {
    parse("PlantarumCommittees", COMMITTEES)
}

pub fn plantarum_token() -> Result<Abi, ChainError> {
    parse("PlantarumToken", PLANTARUM_TOKEN)
}
