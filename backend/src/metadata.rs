//! Off-chain token documents. They have no enforced schema, so a missing or
//! mistyped field reads as absent.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{Attachment, FileRef};

const IPFS_SCHEME: &str = "ipfs://";

/// Maps a token URI to a fetchable URL on `gateway`.
pub fn gateway_url(uri: &str, gateway: &str) -> Result<String, FetchError> {
    let uri = uri.trim();
    if let Some(path) = uri.strip_prefix(IPFS_SCHEME) {
        let path = path.strip_prefix("ipfs/").unwrap_or(path);
        if path.is_empty() {
            return Err(FetchError::UnsupportedUri(uri.to_string()));
        }
        let gateway = gateway.trim_end_matches('/');
        return Ok(format!("{}/{}", gateway, path));
    }
    if uri.starts_with("https://") || uri.starts_with("http://") {
        return Ok(uri.to_string());
    }
    Err(FetchError::UnsupportedUri(uri.to_string()))
}

/// Gateway URL of a bare content hash (file attachments).
pub fn hash_url(hash: &str, gateway: &str) -> String {
    format!("{}/{}", gateway.trim_end_matches('/'), hash)
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Value, FetchError>;
}

pub struct HttpGateway {
    client: reqwest::Client,
    gateway: String,
}

impl HttpGateway {
    pub fn new(gateway: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self {
            client,
            gateway: gateway.to_string(),
        })
    }
}

#[async_trait]
impl MetadataFetcher for HttpGateway {
    async fn fetch(&self, uri: &str) -> Result<Value, FetchError> {
        let url = gateway_url(uri, &self.gateway)?;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Display fields of an off-chain document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffchainMetadata {
    pub titulo: Option<String>,
    pub coords: Option<String>,
    pub estado: Option<String>,
    pub tipo_activo: Option<String>,
    pub descripcion: Option<String>,
    pub files: Vec<FileRef>,
    pub comunidad_autonoma: Option<String>,
    pub provincia: Option<String>,
    pub certificacion: Option<String>,
    pub metodologia: Option<String>,
    pub certificador: Option<String>,
    pub toneladas_co2: Option<String>,
    pub price: Option<String>,
    pub supply: Option<u64>,
    pub owner: Option<String>,
    pub creator: Option<String>,
    pub hash_id: Option<String>,
    pub listed: Option<bool>,
    pub maturity_date: Option<u64>,
    pub yield_percent: Option<String>,
    pub phases: Option<u64>,
}

impl OffchainMetadata {
    pub fn from_value(doc: &Value) -> Self {
        Self {
            titulo: text(doc, "titulo"),
            coords: text(doc, "coords"),
            estado: text(doc, "estado"),
            tipo_activo: text(doc, "tipoActivo"),
            descripcion: text(doc, "descripcion"),
            files: files(doc),
            comunidad_autonoma: text(doc, "comunidadAutonoma"),
            provincia: text(doc, "provincia"),
            certificacion: text(doc, "certificacion"),
            metodologia: text(doc, "metodologia"),
            certificador: text(doc, "certificador"),
            toneladas_co2: text(doc, "toneladasCO2"),
            price: text(doc, "price"),
            supply: number(doc, "supply"),
            owner: text(doc, "owner"),
            creator: text(doc, "creator"),
            hash_id: text(doc, "hashId"),
            listed: doc.get("listed").and_then(Value::as_bool),
            maturity_date: number(doc, "maturityDate"),
            yield_percent: text(doc, "yieldPercent"),
            phases: number(doc, "phases"),
        }
    }

    /// Gateway URL of the first image attachment.
    pub fn image(&self, gateway: &str) -> Option<String> {
        self.files
            .iter()
            .find(|f| f.mime.starts_with("image/"))
            .map(|f| hash_url(&f.ipfs_hash, gateway))
    }

    /// Attachments whose MIME type mentions pdf.
    pub fn pdfs(&self, gateway: &str) -> Vec<Attachment> {
        self.attachments(gateway, |f| f.mime.contains("pdf"))
    }

    /// Attachments typed exactly `application/pdf`.
    pub fn strict_pdfs(&self, gateway: &str) -> Vec<Attachment> {
        self.attachments(gateway, |f| f.mime == "application/pdf")
    }

    fn attachments(&self, gateway: &str, keep: impl Fn(&FileRef) -> bool) -> Vec<Attachment> {
        self.files
            .iter()
            .filter(|f| keep(f))
            .map(|f| Attachment {
                mime: f.mime.clone(),
                ipfs_hash: f.ipfs_hash.clone(),
                url: hash_url(&f.ipfs_hash, gateway),
            })
            .collect()
    }
}

/// Non-empty string field; numbers are accepted and printed.
fn text(doc: &Value, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer field; numeric strings are accepted.
fn number(doc: &Value, key: &str) -> Option<u64> {
    match doc.get(key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn files(doc: &Value) -> Vec<FileRef> {
    let Some(items) = doc.get("files").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let mime = item.get("type")?.as_str()?;
            let hash = item.get("IpfsHash")?.as_str()?;
            Some(FileRef {
                mime: mime.to_string(),
                ipfs_hash: hash.to_string(),
            })
        })
        .collect()
}
