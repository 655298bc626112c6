use ethers::abi::Token;
use ethers::types::{Address, U256};

use crate::error::ChainError;
use crate::models::{CarbonMeta, Committee, CommitteeProposal, TokenId, TokenMeta};

fn tuple<const N: usize>(token: Token, what: &'static str) -> Result<[Token; N], ChainError> {
    match token {
        Token::Tuple(fields) => <[Token; N]>::try_from(fields).map_err(|fields| {
            ChainError::decode(what, format!("expected {} fields, got {}", N, fields.len()))
        }),
        other => Err(ChainError::decode(what, format!("expected tuple, got {:?}", other))),
    }
}

/// Takes the single output of a call.
pub fn single(mut tokens: Vec<Token>, what: &'static str) -> Result<Token, ChainError> {
    if tokens.len() != 1 {
        return Err(ChainError::decode(what, format!("expected 1 output, got {}", tokens.len())));
    }
    Ok(tokens.remove(0))
}

pub fn address(token: Token, what: &'static str) -> Result<Address, ChainError> {
    token
        .into_address()
        .ok_or_else(|| ChainError::decode(what, "expected address"))
}

pub fn string(token: Token, what: &'static str) -> Result<String, ChainError> {
    token
        .into_string()
        .ok_or_else(|| ChainError::decode(what, "expected string"))
}

pub fn boolean(token: Token, what: &'static str) -> Result<bool, ChainError> {
    token
        .into_bool()
        .ok_or_else(|| ChainError::decode(what, "expected bool"))
}

pub fn uint(token: Token, what: &'static str) -> Result<U256, ChainError> {
    token
        .into_uint()
        .ok_or_else(|| ChainError::decode(what, "expected uint"))
}

/// A uint that must fit in 64 bits (identifiers, timestamps, counters).
pub fn uint64(token: Token, what: &'static str) -> Result<u64, ChainError> {
    let value = uint(token, what)?;
    if value > U256::from(u64::MAX) {
        return Err(ChainError::IdOutOfRange(value.to_string()));
    }
    Ok(value.as_u64())
}

fn array(token: Token, what: &'static str) -> Result<Vec<Token>, ChainError> {
    match token {
        Token::Array(items) | Token::FixedArray(items) => Ok(items),
        other => Err(ChainError::decode(what, format!("expected array, got {:?}", other))),
    }
}

/// `uint256[]` identifier lists.
pub fn token_ids(tokens: Vec<Token>) -> Result<Vec<TokenId>, ChainError> {
    array(single(tokens, "token id list")?, "token id list")?
        .into_iter()
        .map(|t| uint64(t, "token id"))
        .collect()
}

pub fn token_meta(token: Token) -> Result<TokenMeta, ChainError> {
    const WHAT: &str = "token meta";
    let [owner, hash_id, coords, timestamp, price, listed, is_auction, deadline] = tuple(token, WHAT)?;
    Ok(TokenMeta {
        wallet_owner: address(owner, WHAT)?,
        hash_id: string(hash_id, WHAT)?,
        coords: string(coords, WHAT)?,
        timestamp: uint64(timestamp, WHAT)?,
        price: uint(price, WHAT)?,
        listed: boolean(listed, WHAT)?,
        is_auction: boolean(is_auction, WHAT)?,
        auction_deadline: uint64(deadline, WHAT)?,
    })
}

/// `getTokenFull` returns the meta tuple followed by the token URI.
pub fn token_full(tokens: Vec<Token>) -> Result<(TokenMeta, String), ChainError> {
    let [meta, uri] = tuple(Token::Tuple(tokens), "token full")?;
    Ok((token_meta(meta)?, string(uri, "token uri")?))
}

pub fn carbon_meta(token: Token) -> Result<CarbonMeta, ChainError> {
    const WHAT: &str = "carbon meta";
    let [creator, price, supply, standard, project_type, vintage, verifier, expiry, listed] =
        tuple(token, WHAT)?;
    Ok(CarbonMeta {
        creator: address(creator, WHAT)?,
        price: uint(price, WHAT)?,
        supply: uint64(supply, WHAT)?,
        standard: string(standard, WHAT)?,
        project_type: string(project_type, WHAT)?,
        vintage: uint64(vintage, WHAT)?,
        verification_body: string(verifier, WHAT)?,
        expiry_date: uint64(expiry, WHAT)?,
        listed: boolean(listed, WHAT)?,
    })
}

pub fn committee(token: Token) -> Result<Committee, ChainError> {
    const WHAT: &str = "committee";
    let [id, name, description, image, creator, status, members] = tuple(token, WHAT)?;
    let status = uint64(status, WHAT)?;
    let status = u8::try_from(status)
        .map_err(|_| ChainError::decode(WHAT, format!("status {} out of range", status)))?;
    let members = array(members, WHAT)?
        .into_iter()
        .map(|t| address(t, WHAT))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Committee {
        id: uint64(id, WHAT)?,
        name: string(name, WHAT)?,
        description: string(description, WHAT)?,
        image: string(image, WHAT)?,
        creator: address(creator, WHAT)?,
        status: status.into(),
        members,
    })
}

pub fn committees(tokens: Vec<Token>) -> Result<Vec<Committee>, ChainError> {
    array(single(tokens, "committee list")?, "committee list")?
        .into_iter()
        .map(committee)
        .collect()
}

pub fn proposal(token: Token) -> Result<CommitteeProposal, ChainError> {
    const WHAT: &str = "committee proposal";
    let [id, committee_id, title, description, proposer, deadline, votes_for, votes_against, executed, hash_id, file_hash] =
        tuple(token, WHAT)?;
    Ok(CommitteeProposal {
        id: uint64(id, WHAT)?,
        committee_id: uint64(committee_id, WHAT)?,
        title: string(title, WHAT)?,
        description: string(description, WHAT)?,
        proposer: address(proposer, WHAT)?,
        deadline: uint64(deadline, WHAT)?,
        votes_for: uint64(votes_for, WHAT)?,
        votes_against: uint64(votes_against, WHAT)?,
        executed: boolean(executed, WHAT)?,
        hash_id: string(hash_id, WHAT)?,
        file_hash: string(file_hash, WHAT)?,
    })
}

pub fn proposals(tokens: Vec<Token>) -> Result<Vec<CommitteeProposal>, ChainError> {
    array(single(tokens, "proposal list")?, "proposal list")?
        .into_iter()
        .map(proposal)
        .collect()
}
