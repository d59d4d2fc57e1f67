//! Client principal pour agréger les sorties d'albums Spotify
//!
//! Ce module compose les briques bas-niveau (pagination, résolution
//! groupée, normalisation) en points d'entrée haut-niveau.

use crate::api::pagination::PageCursor;
use crate::api::{
    SpotifyApi, API_BASE_URL, DEFAULT_ALBUMS_PER_ARTIST, DEFAULT_MARKET, DEFAULT_PAGE_SIZE,
};
use crate::config_ext::{SpotifyConfigExt, DEFAULT_MAX_CONCURRENCY};
use crate::error::Result;
use crate::models::{AccessToken, Album, Artist, RawAlbum, TimeRange};
use crate::normalize::{normalize, order};
use crate::resolver::{AlbumResolver, FanOutPolicy, ResolveFailure, Resolution};
use indexmap::IndexSet;
use pmoconfig::Config;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Timeout par défaut des requêtes HTTP
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent par défaut
pub const DEFAULT_USER_AGENT: &str = concat!("pmospotify/", env!("CARGO_PKG_VERSION"));

/// Albums normalisés, du plus récent au plus ancien
#[derive(Debug, Default)]
pub struct Releases {
    pub albums: Vec<Album>,
    /// Sous-requêtes en échec (mode [`FanOutPolicy::BestEffort`] uniquement)
    pub failures: Vec<ResolveFailure>,
}

/// Client Spotify haut-niveau
///
/// Construit une fois par token ; ne conserve aucun état entre deux appels.
///
/// # Exemple
///
/// ```rust,no_run
/// use pmospotify::SpotifyClient;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = SpotifyClient::new("BQD...")?;
///     let releases = client.followed_releases(None).await?;
///     for album in releases.albums.iter().take(10) {
///         println!("{} - {}", album.release_date.date_naive(), album.name);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    api: SpotifyApi,
    max_concurrency: usize,
    policy: FanOutPolicy,
}

impl SpotifyClient {
    /// Crée un client avec les réglages par défaut
    pub fn new(token: impl Into<AccessToken>) -> Result<Self> {
        Self::builder().build(token)
    }

    /// Crée un builder pour configurer le client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Crée un client en utilisant la configuration de pmoconfig
    pub fn from_config() -> Result<Self> {
        let config = pmoconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    /// Crée un client depuis un objet Config spécifique
    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let token = config.get_spotify_token()?;
        ClientBuilder::from_config(config)?.build(token)
    }

    /// Retourne l'API bas-niveau
    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }

    /// Retourne la politique de fan-out configurée
    pub fn fan_out_policy(&self) -> FanOutPolicy {
        self.policy
    }

    /// Retourne un résolveur d'albums partageant la configuration du client
    pub fn resolver(&self) -> AlbumResolver<'_> {
        AlbumResolver::new(&self.api, self.max_concurrency, self.policy)
    }

    // ============ Artistes ============

    /// Tous les artistes suivis, à partir du curseur `after` s'il est fourni
    pub async fn followed_artists(&self, after: Option<&str>) -> Result<Vec<Artist>> {
        let listing = self.api.followed_artists_listing();
        let start = after.map(|a| PageCursor::After(a.to_string()));
        self.api.paginate(&listing, start).await
    }

    /// Tous les top artistes d'une fenêtre d'écoute, à partir de `offset`
    pub async fn top_artists(&self, range: TimeRange, offset: u32) -> Result<Vec<Artist>> {
        let listing = self.api.top_artists_listing(range);
        self.api
            .paginate(&listing, Some(PageCursor::Offset(offset)))
            .await
    }

    // ============ Nouveautés ============

    /// Toutes les nouveautés (albums simplifiés), à partir de `offset`
    pub async fn new_releases(&self, offset: u32) -> Result<Vec<RawAlbum>> {
        let listing = self.api.new_releases_listing();
        self.api
            .paginate(&listing, Some(PageCursor::Offset(offset)))
            .await
    }

    // ============ Sorties agrégées ============

    /// Albums récents des artistes suivis
    pub async fn followed_releases(&self, after: Option<&str>) -> Result<Releases> {
        let artists = self.followed_artists(after).await?;
        info!("{} followed artist(s)", artists.len());
        let resolution = self.resolver().resolve_albums(&artists).await?;
        finish(resolution)
    }

    /// Albums récents des top artistes d'une fenêtre d'écoute
    pub async fn top_releases(&self, range: TimeRange, offset: u32) -> Result<Releases> {
        let artists = self.top_artists(range, offset).await?;
        info!("{} top artist(s) ({})", artists.len(), range);
        let resolution = self.resolver().resolve_albums(&artists).await?;
        finish(resolution)
    }

    /// Nouveautés complétées par le lookup groupé des albums
    pub async fn new_release_albums(&self, offset: u32) -> Result<Releases> {
        let listed = self.new_releases(offset).await?;

        let ids: Vec<String> = listed
            .into_iter()
            .map(|album| album.id)
            .collect::<IndexSet<String>>()
            .into_iter()
            .collect();
        info!("{} new release(s)", ids.len());

        let resolution = self.resolver().resolve_album_ids(&ids).await?;
        finish(resolution)
    }
}

/// Normalise puis trie les albums résolus
fn finish(resolution: Resolution) -> Result<Releases> {
    let albums = order(normalize(resolution.albums)?);
    Ok(Releases {
        albums,
        failures: resolution.failures,
    })
}

/// Builder pour [`SpotifyClient`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    market: String,
    page_size: u32,
    albums_per_artist: u32,
    max_concurrency: usize,
    policy: FanOutPolicy,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: API_BASE_URL.to_string(),
            market: DEFAULT_MARKET.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            albums_per_artist: DEFAULT_ALBUMS_PER_ARTIST,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            policy: FanOutPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialise le builder depuis la section `spotify` de la configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::default()
            .api_base(config.get_spotify_api_base()?)
            .market(config.get_spotify_market()?)
            .page_size(config.get_spotify_page_size()?)
            .albums_per_artist(config.get_spotify_albums_per_artist()?)
            .max_concurrency(config.get_spotify_max_concurrency()?)
            .fan_out_policy(config.get_spotify_fan_out_policy()?))
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn albums_per_artist(mut self, limit: u32) -> Self {
        self.albums_per_artist = limit.max(1);
        self
    }

    /// Nombre maximal de requêtes simultanées par étape de résolution
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn fan_out_policy(mut self, policy: FanOutPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self, token: impl Into<AccessToken>) -> Result<SpotifyClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        let mut api = SpotifyApi::with_client(client, self.api_base, token);
        api.market = self.market;
        api.page_size = self.page_size;
        api.albums_per_artist = self.albums_per_artist;

        Ok(SpotifyClient {
            api,
            max_concurrency: self.max_concurrency,
            policy: self.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.api_base, API_BASE_URL);
        assert_eq!(builder.page_size, 50);
        assert_eq!(builder.albums_per_artist, 5);
        assert_eq!(builder.policy, FanOutPolicy::FailFast);
    }

    #[test]
    fn test_builder_clamps_zero() {
        let client = SpotifyClient::builder()
            .max_concurrency(0)
            .page_size(0)
            .build("token")
            .unwrap();
        assert_eq!(client.max_concurrency, 1);
        assert_eq!(client.api().page_size(), 1);
    }

    #[test]
    fn test_from_config_obj() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        config.set_spotify_token("BQD-config").unwrap();
        config.set_spotify_market("FR").unwrap();

        let client = SpotifyClient::from_config_obj(&config).unwrap();
        assert_eq!(client.api().market(), "FR");
        assert_eq!(client.fan_out_policy(), FanOutPolicy::FailFast);
    }
}
