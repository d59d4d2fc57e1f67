//! Couche d'accès à l'API Web Spotify
//!
//! Ce module fournit une interface bas-niveau pour communiquer avec Spotify :
//! exécution authentifiée des requêtes GET avec absorption transparente du
//! rate limiting (429 + `Retry-After`).

pub mod catalog;
pub mod pagination;
pub mod user;

use crate::error::{Result, SpotifyError};
use crate::models::AccessToken;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// URL de base de l'API Spotify
pub const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Taille de page des listings paginés
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Nombre d'albums demandés par artiste
pub const DEFAULT_ALBUMS_PER_ARTIST: u32 = 5;

/// Marché utilisé pour filtrer le catalogue
pub const DEFAULT_MARKET: &str = "US";

/// Nombre maximal d'identifiants acceptés par `/albums`
pub const ALBUM_LOOKUP_LIMIT: usize = 20;

/// Enveloppe d'erreur renvoyée par Spotify
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client API bas-niveau pour communiquer avec Spotify
///
/// La configuration (token, base, paramètres de requête) est figée à la
/// construction ; l'instance est partagée en lecture seule par toutes les
/// requêtes concurrentes.
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    /// Client HTTP
    client: Client,
    /// Base des endpoints relatifs, sans `/` final
    base_url: String,
    /// Token d'accès utilisateur
    token: AccessToken,
    /// Marché (`country`) transmis aux endpoints qui le supportent
    pub(crate) market: String,
    /// Taille de page des listings
    pub(crate) page_size: u32,
    /// Limite d'albums par artiste
    pub(crate) albums_per_artist: u32,
}

impl SpotifyApi {
    /// Crée une nouvelle instance de l'API avec un client HTTP par défaut
    pub fn new(token: impl Into<AccessToken>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("pmospotify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, API_BASE_URL, token))
    }

    /// Crée une instance à partir d'un client HTTP et d'une base d'API
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<AccessToken>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            market: DEFAULT_MARKET.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            albums_per_artist: DEFAULT_ALBUMS_PER_ARTIST,
        }
    }

    /// Retourne la base d'API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retourne le marché configuré
    pub fn market(&self) -> &str {
        &self.market
    }

    /// Retourne la taille de page configurée
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Construit l'URL complète d'un endpoint
    ///
    /// Les URLs absolues (liens `next` renvoyés par l'API) sont utilisées
    /// telles quelles.
    pub fn resolve_url(&self, endpoint: &str) -> Result<Url> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(Url::parse(endpoint)?);
        }

        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", self.base_url, endpoint))?)
    }

    /// Effectue une requête GET authentifiée et désérialise la réponse
    ///
    /// Un statut 429 suspend l'appel pendant la durée indiquée par
    /// `Retry-After` puis rejoue la requête à l'identique, sans limite de
    /// tentatives. Tout autre statut d'erreur est remonté immédiatement.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.resolve_url(endpoint)?;
        let mut attempt: u32 = 1;

        loop {
            debug!("GET {} with {} params (attempt {})", url, params.len(), attempt);

            let response = self
                .client
                .get(url.clone())
                .bearer_auth(self.token.secret())
                .query(params)
                .send()
                .await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(response.headers());
                warn!(
                    "Rate limited on {} (attempt {}), retrying in {:?}",
                    url.path(),
                    attempt,
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            return self.handle_response(response).await;
        }
    }

    /// Traite la réponse HTTP
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let status_code = status.as_u16();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            warn!("API error ({}): {}", status_code, message);
            return Err(SpotifyError::from_status_code(status_code, message));
        }

        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::JsonParse(e)
        })
    }
}

/// Lit la durée d'attente (en secondes) imposée par un 429
///
/// Un en-tête absent ou illisible est une violation du contrat amont : on
/// le traite comme une attente nulle.
pub(crate) fn retry_after(headers: &HeaderMap) -> Duration {
    let Some(value) = headers.get(RETRY_AFTER) else {
        warn!("429 without Retry-After header, retrying immediately");
        return Duration::ZERO;
    };

    let wait = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(|s| Duration::try_from_secs_f64(s).ok());

    match wait {
        Some(wait) => wait,
        None => {
            warn!("Unreadable Retry-After header {:?}, retrying immediately", value);
            Duration::ZERO
        }
    }
}
