use serde::Serialize;

use crate::aggregate::{enrich, Catalog, FOREST_TYPE};
use crate::error::ItemError;
use crate::metadata::{gateway_url, OffchainMetadata};
use crate::models::TokenId;

const UNSET_STATUS: &str = "No definido";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapCategory {
    Conservation,
    Forest,
    Carbon,
    Project,
}

impl MapCategory {
    /// Unrecognized tags are drawn as conservation plots.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "forest" => MapCategory::Forest,
            "carbon" => MapCategory::Carbon,
            "project" => MapCategory::Project,
            _ => MapCategory::Conservation,
        }
    }

    pub fn pin(&self) -> &'static str {
        match self {
            MapCategory::Conservation => "green-pin.png",
            MapCategory::Forest => "red-pin.png",
            MapCategory::Carbon => "blue-pin.png",
            MapCategory::Project => "orange-pin.png",
        }
    }
}

/// Parses `"<lat>,<lng>"`. Anything else, including out-of-range or
/// non-finite values, is `None`.
pub fn parse_coords(raw: &str) -> Option<(f64, f64)> {
    let (lat, lng) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return None;
    }
    Some((lat, lng))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: TokenId,
    pub lat: f64,
    pub lng: f64,
    pub category: MapCategory,
    pub pin: &'static str,
    pub title: String,
    pub estado: String,
    pub token_uri: String,
    pub metadata_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRegion {
    pub name: &'static str,
    pub center: [f64; 2],
    pub zoom: u8,
    pub icon_size: u32,
}

pub const REGIONS: [(&str, [f64; 2], u8); 4] = [
    ("España", [40.4168, -3.7038], 6),
    ("Baleares", [39.6953, 3.0176], 8),
    ("Canarias", [28.2916, -16.6291], 7),
    ("Europa", [54.526, 15.2551], 4),
];

/// Marker icon edge in pixels for a zoom level.
pub fn icon_size(zoom: u8) -> u32 {
    (u32::from(zoom) * 2).clamp(15, 50)
}

pub fn regions() -> Vec<MapRegion> {
    REGIONS
        .iter()
        .map(|&(name, center, zoom)| MapRegion {
            name,
            center,
            zoom,
            icon_size: icon_size(zoom),
        })
        .collect()
}

impl Catalog {
    /// Markers from both collections. A collection whose listing fails
    /// contributes nothing; the other is still drawn.
    pub async fn map_markers(&self) -> Vec<MapMarker> {
        let mut markers = match self.forest.all_tokens().await {
            Ok(ids) => enrich(ids, self.concurrency, |id| self.plot_marker(id)).await,
            Err(e) => {
                log::error!("Plot listing failed, map shows no plots: {}", e);
                Vec::new()
            }
        };
        match self.credits.all_tokens().await {
            Ok(ids) => markers.extend(enrich(ids, self.concurrency, |id| self.credit_marker(id)).await),
            Err(e) => log::error!("Credit listing failed, map shows no credits or projects: {}", e),
        }
        markers
    }

    /// 721 plots take their position from the on-chain coords.
    async fn plot_marker(&self, id: TokenId) -> Result<Option<MapMarker>, ItemError> {
        let meta = self.forest.token_meta(id).await?;
        let Some((lat, lng)) = parse_coords(&meta.coords) else {
            log::debug!("Token {} has no usable coords {:?}", id, meta.coords);
            return Ok(None);
        };
        let uri = self.forest.token_uri(id).await?;
        let doc = OffchainMetadata::from_value(&self.fetcher.fetch(&uri).await?);
        let category = MapCategory::from_tag(doc.tipo_activo.as_deref().unwrap_or(FOREST_TYPE));
        Ok(Some(self.marker(id, lat, lng, category, doc, "Activo Forestal", uri)))
    }

    /// 1155 tokens are drawn only for carbon and project documents, placed
    /// by the document's coords.
    async fn credit_marker(&self, id: TokenId) -> Result<Option<MapMarker>, ItemError> {
        let uri = self.credits.uri(id).await?;
        let doc = OffchainMetadata::from_value(&self.fetcher.fetch(&uri).await?);
        let category = match doc.tipo_activo.as_deref() {
            Some("carbon") => MapCategory::Carbon,
            Some("project") => MapCategory::Project,
            _ => return Ok(None),
        };
        let Some((lat, lng)) = doc.coords.as_deref().and_then(parse_coords) else {
            return Ok(None);
        };
        Ok(Some(self.marker(id, lat, lng, category, doc, "Proyecto", uri)))
    }

    #[allow(clippy::too_many_arguments)]
    fn marker(
        &self,
        id: TokenId,
        lat: f64,
        lng: f64,
        category: MapCategory,
        doc: OffchainMetadata,
        default_title: &str,
        uri: String,
    ) -> MapMarker {
        MapMarker {
            id,
            lat,
            lng,
            category,
            pin: category.pin(),
            title: doc.titulo.unwrap_or_else(|| default_title.to_string()),
            estado: doc.estado.unwrap_or_else(|| UNSET_STATUS.to_string()),
            metadata_url: gateway_url(&uri, &self.gateway).ok(),
            token_uri: uri,
        }
    }
}
