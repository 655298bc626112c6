use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use ethers::types::Address;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;

use crate::auth;
use crate::error::ApiError;
use crate::map::regions;
use crate::models::{
    CarbonCreditCard, CarbonDetail, Committee, CommitteeProposal, ConservationDetail, ForestDetail, ProjectDetail,
    TokenCard, TokenId,
};
use crate::state::AppState;
use crate::writer::WriteAction;

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/tx", post(submit_tx))
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate));

    Router::new()
        .route("/", get(|| async { "Plantarum marketplace API" }))
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/marketplace/forest", get(forest_marketplace))
        .route("/marketplace/carbon", get(carbon_marketplace))
        .route("/natura", get(natura))
        .route("/owners/:address/tokens", get(owner_tokens))
        .route("/map", get(map))
        .route("/token/conservation/:id", get(conservation_detail))
        .route("/token/forest/:id", get(forest_detail))
        .route("/token/carbon/:id", get(carbon_detail))
        .route("/token/projects/:id", get(project_detail))
        .route("/dao/committees", get(committees))
        .route("/dao/committees/:id", get(committee))
        .route("/dao/committees/:id/proposals", get(committee_proposals))
        .route("/dao/proposals/:id", get(proposal))
        .merge(protected_routes)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let chain = state.chain()?;
    let block_number = chain.head.block_number().await?;
    Ok(Json(json!({
        "source": chain.source,
        "block_number": block_number,
        "signer": state.writer.has_signer(),
    })))
}

#[derive(Deserialize)]
struct LoginRequest {
    api_key: String,
}

async fn login(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = request?;
    if state.config.admin_api_key.is_empty() || request.api_key != state.config.admin_api_key {
        log::warn!("Rejected login attempt");
        return Err(ApiError::Unauthorized("Invalid API key".into()));
    }
    let token = auth::create_token("admin", &state.config.jwt_secret)?;
    Ok(Json(json!({ "token": token })))
}

async fn forest_marketplace(State(state): State<AppState>) -> Result<Json<Vec<TokenCard>>, ApiError> {
    Ok(Json(state.chain()?.catalog.forest_marketplace().await?))
}

async fn carbon_marketplace(State(state): State<AppState>) -> Result<Json<Vec<CarbonCreditCard>>, ApiError> {
    Ok(Json(state.chain()?.catalog.carbon_marketplace().await?))
}

async fn natura(State(state): State<AppState>) -> Result<Json<Vec<TokenCard>>, ApiError> {
    Ok(Json(state.chain()?.catalog.natura_catalog().await?))
}

async fn owner_tokens(
    State(state): State<AppState>,
    address: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<TokenCard>>, ApiError> {
    let Path(address) = address?;
    let owner = Address::from_str(address.trim())
        .map_err(|_| ApiError::BadRequest(format!("{} is not an address", address)))?;
    Ok(Json(state.chain()?.catalog.owned_tokens(owner).await?))
}

async fn map(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let markers = state.chain()?.catalog.map_markers().await;
    Ok(Json(json!({ "markers": markers, "regions": regions() })))
}

async fn conservation_detail(
    State(state): State<AppState>,
    id: Result<Path<TokenId>, PathRejection>,
) -> Result<Json<ConservationDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.chain()?.catalog.conservation_detail(id).await?))
}

async fn forest_detail(
    State(state): State<AppState>,
    id: Result<Path<TokenId>, PathRejection>,
) -> Result<Json<ForestDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.chain()?.catalog.forest_detail(id).await?))
}

async fn carbon_detail(
    State(state): State<AppState>,
    id: Result<Path<TokenId>, PathRejection>,
) -> Result<Json<CarbonDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.chain()?.catalog.carbon_detail(id).await?))
}

async fn project_detail(
    State(state): State<AppState>,
    id: Result<Path<TokenId>, PathRejection>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.chain()?.catalog.project_detail(id).await?))
}

async fn committees(State(state): State<AppState>) -> Result<Json<Vec<Committee>>, ApiError> {
    let mut committees = state.chain()?.committees.all_committees().await?;
    committees.reverse();
    Ok(Json(committees))
}

async fn committee(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Committee>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.chain()?.committees.committee_by_id(id).await?))
}

async fn committee_proposals(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Vec<CommitteeProposal>>, ApiError> {
    let Path(id) = id?;
    let mut proposals = state.chain()?.committees.committee_proposals(id).await?;
    proposals.reverse();
    Ok(Json(proposals))
}

async fn proposal(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<CommitteeProposal>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.chain()?.committees.proposal_by_id(id).await?))
}

async fn submit_tx(
    State(state): State<AppState>,
    action: Result<Json<WriteAction>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(action) = action?;
    let tx_hash = state.writer.execute(&action).await?;
    Ok(Json(json!({ "tx_hash": tx_hash })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::aggregate::tests::catalog;
    use crate::aggregate::{CONSERVATION_TYPE, FOREST_TYPE};
    use crate::chain::ReadSource;
    use crate::config::AppConfig;
    use crate::fakes::{meta, FakeCommittees, FakeCredits, FakeForest, FakeGateway, FixedBlock};
    use crate::state::{ChainHandles, ChainStatus};
    use crate::writer::tests::{addresses, RecordingBroadcaster};
    use crate::writer::TxSubmitter;

    fn config() -> AppConfig {
        let vars: HashMap<String, String> = [
            ("RPC_URL", "http://127.0.0.1:1"),
            ("PLANTARUM721_ADDRESS", "0x7272727272727272727272727272727272727272"),
            ("PLANTARUM1155_ADDRESS", "0x5555555555555555555555555555555555555555"),
            ("COMMITTEES_ADDRESS", "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"),
            ("JWT_SECRET", "test-secret"),
            ("ADMIN_API_KEY", "admin-key"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        AppConfig::from_vars(vars).unwrap()
    }

    fn app(forest: FakeForest, gateway: FakeGateway, broadcaster: Option<Arc<RecordingBroadcaster>>) -> Router {
        let handles = ChainHandles {
            source: ReadSource::Public,
            catalog: catalog(forest, FakeCredits::default(), Arc::new(gateway)),
            committees: Arc::new(FakeCommittees::sample()),
            head: Arc::new(FixedBlock(42)),
        };
        let broadcaster = broadcaster.map(|b| b as Arc<dyn crate::writer::Broadcaster>);
        let writer = TxSubmitter::new(addresses(), broadcaster, Duration::from_millis(50), Duration::from_millis(50)).unwrap();
        router(AppState::new(config(), ChainStatus::Ready(Arc::new(handles)), writer))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn forest_marketplace_lists_only_listed_tokens() {
        let forest = FakeForest::default()
            .with(1, FOREST_TYPE, meta("40,-3", 1_000_000_000_000_000_000, true), "ipfs://listed")
            .with(2, FOREST_TYPE, meta("40,-3", 1, false), "ipfs://unlisted");
        let gateway = FakeGateway::default()
            .with("ipfs://listed", json!({"titulo": "Pinar"}))
            .with("ipfs://unlisted", json!({"titulo": "Oculto"}));
        let (status, body) = get_json(app(forest, gateway, None), "/marketplace/forest").await;
        assert_eq!(status, StatusCode::OK);
        let cards = body.as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["title"], "Pinar");
        assert_eq!(cards[0]["price"], "1.0");
    }

    #[tokio::test]
    async fn conservation_detail_without_coords_shows_placeholder() {
        let forest = FakeForest::default().with(3, CONSERVATION_TYPE, meta("", 0, false), "ipfs://c");
        let gateway = FakeGateway::default().with("ipfs://c", json!({"titulo": "Humedal"}));
        let (status, body) = get_json(app(forest, gateway, None), "/token/conservation/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["coords"], "No definidas");
    }

    #[tokio::test]
    async fn missing_token_is_not_found() {
        let (status, body) = get_json(app(FakeForest::default(), FakeGateway::default(), None), "/token/forest/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn health_reports_source_and_block() {
        let (status, body) = get_json(app(FakeForest::default(), FakeGateway::default(), None), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "public");
        assert_eq!(body["block_number"], 42);
        assert_eq!(body["signer"], false);
    }

    #[tokio::test]
    async fn committees_and_proposals() {
        let (status, body) = get_json(app(FakeForest::default(), FakeGateway::default(), None), "/dao/committees/1/proposals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], 7);

        let (status, _) = get_json(app(FakeForest::default(), FakeGateway::default(), None), "/dao/proposals/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_a_json_bad_request() {
        let (status, body) = get_json(app(FakeForest::default(), FakeGateway::default(), None), "/token/forest/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Bad request"));
    }

    #[tokio::test]
    async fn unknown_write_action_is_a_json_bad_request() {
        let app = app(FakeForest::default(), FakeGateway::default(), None);
        let token = auth::create_token("admin", "test-secret").unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tx")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"action":"teleport"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn invalid_owner_address_is_bad_request() {
        let (status, _) = get_json(app(FakeForest::default(), FakeGateway::default(), None), "/owners/nope/tokens").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authenticated_write_returns_the_hash() {
        let recorder = Arc::new(RecordingBroadcaster::confirming(1));
        let app = app(FakeForest::default(), FakeGateway::default(), Some(recorder.clone()));
        let token = auth::create_token("admin", "test-secret").unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tx")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"action":"faucet"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body["tx_hash"],
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
        assert_eq!(recorder.sent.lock().unwrap()[0].0, addresses().token);
    }
}
