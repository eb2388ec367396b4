use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::LookupConfig;
use crate::error::LookupError;
use super::resolver::{CatalogRecord, LookupProvider};

#[derive(Debug, Deserialize)]
struct CardSearchResponse {
    #[serde(default)]
    data: Vec<ApiCard>,
}

#[derive(Debug, Deserialize)]
struct ApiCard {
    name: String,
    number: String,
    set: ApiSet,
    images: ApiImages,
}

#[derive(Debug, Deserialize)]
struct ApiSet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiImages {
    large: String,
}

impl From<ApiCard> for CatalogRecord {
    fn from(card: ApiCard) -> Self {
        CatalogRecord {
            name: card.name,
            set_id: card.set.id,
            number: card.number,
            image_url: card.images.large,
        }
    }
}

/// Pokémon TCG API search client.
pub struct PokemonTcgClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PokemonTcgClient {
    pub fn new(config: &LookupConfig) -> Self {
        info!("Catalog lookup endpoint: {}", config.base_url);

        PokemonTcgClient {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl LookupProvider for PokemonTcgClient {
    async fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, LookupError> {
        let mut request = self.client
            .get(&self.base_url)
            .query(&[("q", query)]);

        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: CardSearchResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        debug!("Catalog returned {} card(s) for '{}'", body.data.len(), query);

        Ok(body.data.into_iter().map(CatalogRecord::from).collect())
    }
}
