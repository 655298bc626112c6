//! Token detail views. The on-chain read is required; a missing or broken
//! off-chain document degrades to placeholder values.

use crate::aggregate::Catalog;
use crate::error::ChainError;
use crate::models::{
    format_date, format_ether, format_timestamp, CarbonDetail, ConservationDetail, ForestDetail, ProjectDetail,
    TokenId,
};

pub const NO_COORDS: &str = "No definidas";
pub const NO_STATUS: &str = "No definido";
pub const NO_METHOD: &str = "No definida";
pub const NOT_AVAILABLE: &str = "N/A";

impl Catalog {
    pub async fn conservation_detail(&self, id: TokenId) -> Result<ConservationDetail, ChainError> {
        let meta = self.forest.token_meta(id).await?;
        let uri = self.forest.token_uri(id).await?;
        let doc = self.document_or_empty(&uri).await;

        Ok(ConservationDetail {
            id,
            title: doc.titulo.clone().unwrap_or_else(|| format!("Conservación #{}", id)),
            coords: doc.coords.clone().unwrap_or_else(|| NO_COORDS.to_string()),
            estado: doc.estado.clone().unwrap_or_else(|| NO_STATUS.to_string()),
            description: doc.descripcion.clone().unwrap_or_default(),
            price: format_ether(meta.price),
            owner: meta.wallet_owner,
            hash_id: meta.hash_id,
            uri,
            listed: meta.listed,
            image: doc.image(&self.gateway),
            pdfs: doc.pdfs(&self.gateway),
            comunidad_autonoma: doc.comunidad_autonoma.unwrap_or_default(),
            provincia: doc.provincia.unwrap_or_default(),
        })
    }

    pub async fn forest_detail(&self, id: TokenId) -> Result<ForestDetail, ChainError> {
        let meta = self.forest.token_meta(id).await?;
        let uri = self.forest.token_uri(id).await?;
        let doc = self.document_or_empty(&uri).await;

        let coords = if meta.coords.trim().is_empty() {
            doc.coords.clone().unwrap_or_else(|| NO_COORDS.to_string())
        } else {
            meta.coords.clone()
        };

        Ok(ForestDetail {
            id,
            title: doc.titulo.clone().unwrap_or_else(|| format!("Token #{}", id)),
            coords,
            legal: doc.estado.clone().unwrap_or_else(|| NO_STATUS.to_string()),
            certificacion: doc.certificacion.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price: format_ether(meta.price),
            owner: meta.wallet_owner,
            hash_id: meta.hash_id,
            uri,
            listed: meta.listed,
            is_auction: meta.is_auction,
            auction_deadline: if meta.is_auction { format_timestamp(meta.auction_deadline) } else { None },
            image: doc.image(&self.gateway),
            pdfs: doc.strict_pdfs(&self.gateway),
            comunidad_autonoma: doc.comunidad_autonoma.unwrap_or_default(),
            provincia: doc.provincia.unwrap_or_default(),
        })
    }

    /// Carbon credits carry their display fields in the document only.
    pub async fn carbon_detail(&self, id: TokenId) -> Result<CarbonDetail, ChainError> {
        let uri = self.credits.uri(id).await?;
        let doc = self.document_or_empty(&uri).await;

        Ok(CarbonDetail {
            id,
            title: doc.titulo.unwrap_or_else(|| format!("Crédito #{}", id)),
            metodologia: doc.metodologia.unwrap_or_else(|| NO_METHOD.to_string()),
            certificador: doc.certificador.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            toneladas_co2: doc.toneladas_co2.unwrap_or_else(|| "0".to_string()),
            price: doc.price.unwrap_or_else(|| "0".to_string()),
            supply: doc.supply.unwrap_or(0),
            owner: doc.owner.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            hash_id: doc.hash_id.unwrap_or_default(),
            uri,
            listed: doc.listed.unwrap_or(false),
        })
    }

    pub async fn project_detail(&self, id: TokenId) -> Result<ProjectDetail, ChainError> {
        let uri = self.credits.uri(id).await?;
        let doc = self.document_or_empty(&uri).await;

        Ok(ProjectDetail {
            id,
            title: doc.titulo.unwrap_or_else(|| format!("Proyecto #{}", id)),
            coords: doc.coords.unwrap_or_else(|| NO_COORDS.to_string()),
            price: doc.price.unwrap_or_else(|| "0".to_string()),
            supply: doc.supply.unwrap_or(0),
            creator: doc.creator.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            hash_id: doc.hash_id.unwrap_or_default(),
            maturity_date: doc
                .maturity_date
                .and_then(format_date)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            yield_percent: doc.yield_percent.unwrap_or_else(|| "0".to_string()),
            phases: doc.phases.unwrap_or(0),
            uri,
            listed: doc.listed.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::catalog;
    use crate::fakes::{meta, FakeCredits, FakeForest, FakeGateway};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn conservation_without_coords_shows_placeholder() {
        let forest = FakeForest::default().with(7, "conservation", meta("", 2_000_000_000_000_000_000, true), "ipfs://7");
        let gateway = Arc::new(FakeGateway::default().with(
            "ipfs://7",
            json!({
                "titulo": "Dehesa",
                "files": [
                    {"type": "image/png", "IpfsHash": "QmImg"},
                    {"type": "application/pdf", "IpfsHash": "QmDoc"}
                ]
            }),
        ));
        let detail = catalog(forest, FakeCredits::default(), gateway)
            .conservation_detail(7)
            .await
            .unwrap();
        assert_eq!(detail.coords, "No definidas");
        assert_eq!(detail.estado, "No definido");
        assert_eq!(detail.title, "Dehesa");
        assert_eq!(detail.price, "2.0");
        assert_eq!(detail.image.as_deref(), Some("https://ipfs.io/ipfs/QmImg"));
        assert_eq!(detail.pdfs.len(), 1);
        assert_eq!(detail.pdfs[0].url, "https://ipfs.io/ipfs/QmDoc");
        assert_eq!(detail.provincia, "");
    }

    #[tokio::test]
    async fn unreachable_document_degrades_to_placeholders() {
        let forest = FakeForest::default().with(8, "conservation", meta("", 0, false), "ipfs://gone");
        let detail = catalog(forest, FakeCredits::default(), Arc::new(FakeGateway::default()))
            .conservation_detail(8)
            .await
            .unwrap();
        assert_eq!(detail.title, "Conservación #8");
        assert_eq!(detail.coords, NO_COORDS);
        assert!(detail.image.is_none());
        assert!(detail.pdfs.is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_an_error() {
        let err = catalog(FakeForest::default(), FakeCredits::default(), Arc::new(FakeGateway::default()))
            .forest_detail(99)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted(_)));
    }

    #[tokio::test]
    async fn forest_prefers_on_chain_coords() {
        let forest = FakeForest::default()
            .with(1, "forest", meta("40.1,-3.1", 0, true), "ipfs://1")
            .with(2, "forest", meta("", 0, true), "ipfs://2");
        let gateway = Arc::new(
            FakeGateway::default()
                .with("ipfs://1", json!({"coords": "0,0", "files": [{"type": "text/pdf", "IpfsHash": "QmX"}]}))
                .with("ipfs://2", json!({"coords": "39.0,2.0", "certificacion": "PEFC"})),
        );
        let catalog = catalog(forest, FakeCredits::default(), gateway);

        let first = catalog.forest_detail(1).await.unwrap();
        assert_eq!(first.coords, "40.1,-3.1");
        assert_eq!(first.certificacion, "N/A");
        assert_eq!(first.legal, "No definido");
        assert!(first.pdfs.is_empty());

        let second = catalog.forest_detail(2).await.unwrap();
        assert_eq!(second.coords, "39.0,2.0");
        assert_eq!(second.certificacion, "PEFC");
        assert_eq!(second.title, "Token #2");
    }

    #[tokio::test]
    async fn carbon_and_project_defaults() {
        let credits = FakeCredits::default()
            .with(3, "ipfs://c3", None)
            .with(4, "ipfs://p4", None);
        let gateway = Arc::new(FakeGateway::default().with(
            "ipfs://p4",
            json!({"maturityDate": 1_700_000_000u64, "yieldPercent": 7.5, "phases": 3, "listed": true}),
        ));
        let catalog = catalog(FakeForest::default(), credits, gateway);

        let carbon = catalog.carbon_detail(3).await.unwrap();
        assert_eq!(carbon.title, "Crédito #3");
        assert_eq!(carbon.metodologia, "No definida");
        assert_eq!(carbon.certificador, "N/A");
        assert_eq!(carbon.toneladas_co2, "0");
        assert_eq!(carbon.owner, "N/A");
        assert!(!carbon.listed);

        let project = catalog.project_detail(4).await.unwrap();
        assert_eq!(project.title, "Proyecto #4");
        assert_eq!(project.coords, "No definidas");
        assert_eq!(project.maturity_date, "2023-11-14");
        assert_eq!(project.yield_percent, "7.5");
        assert_eq!(project.phases, 3);
        assert!(project.listed);
    }
}
