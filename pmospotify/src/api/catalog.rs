//! Module d'accès au catalogue Spotify (nouveautés, albums)

use super::pagination::{Listing, Page, PageCursor, PageStrategy};
use super::{SpotifyApi, ALBUM_LOOKUP_LIMIT};
use crate::error::{Result, SpotifyError};
use crate::models::{AlbumRef, RawAlbum};
use serde::Deserialize;
use tracing::{debug, warn};

/// Types d'albums retenus pour les sorties d'un artiste
const ARTIST_ALBUM_TYPES: &str = "album,single";

/// Réponse de `/artists/{id}/albums`
#[derive(Debug, Deserialize)]
struct ArtistAlbumsResponse {
    items: Vec<AlbumRef>,
}

/// Réponse de `/albums?ids=...`
///
/// Spotify renvoie `null` à la place des identifiants inconnus.
#[derive(Debug, Deserialize)]
struct AlbumsResponse {
    albums: Vec<Option<RawAlbum>>,
}

impl SpotifyApi {
    /// Listing `/browse/new-releases` (pagination par offset)
    pub fn new_releases_listing(&self) -> Listing {
        Listing::new("browse/new-releases", PageStrategy::Offset).wrapped_in("albums")
    }

    /// Récupère une page de nouveautés
    pub async fn get_new_releases(&self, offset: u32) -> Result<Page<RawAlbum>> {
        debug!("Fetching new releases at offset {}", offset);
        self.fetch_page(
            &self.new_releases_listing(),
            Some(&PageCursor::Offset(offset)),
        )
        .await
    }

    /// Liste les derniers albums et singles d'un artiste
    ///
    /// Une seule page, limitée à `albums_per_artist` éléments.
    pub async fn get_artist_albums(&self, artist_id: &str) -> Result<Vec<AlbumRef>> {
        if artist_id.is_empty() {
            return Err(SpotifyError::InvalidArgument("empty artist id".to_string()));
        }
        debug!("Fetching albums for artist {}", artist_id);
        let limit = self.albums_per_artist.to_string();
        let params = [
            ("limit", limit.as_str()),
            ("album_type", ARTIST_ALBUM_TYPES),
            ("country", self.market.as_str()),
        ];

        // l'identifiant est encodé comme un segment de chemin
        let mut url = self.resolve_url("artists")?;
        url.path_segments_mut()
            .map_err(|_| {
                SpotifyError::InvalidArgument(format!("{} cannot be a base", self.base_url))
            })?
            .push(artist_id)
            .push("albums");

        let response: ArtistAlbumsResponse = self.execute(url.as_str(), &params).await?;
        Ok(response.items)
    }

    /// Récupère le détail complet d'au plus 20 albums en une requête
    pub async fn get_albums(&self, album_ids: &[String]) -> Result<Vec<RawAlbum>> {
        if album_ids.len() > ALBUM_LOOKUP_LIMIT {
            return Err(SpotifyError::InvalidArgument(format!(
                "at most {} album ids per lookup, got {}",
                ALBUM_LOOKUP_LIMIT,
                album_ids.len()
            )));
        }

        debug!("Fetching {} albums", album_ids.len());
        let ids = album_ids.join(",");
        let params = [("ids", ids.as_str()), ("market", self.market.as_str())];
        let response: AlbumsResponse = self.execute("albums", &params).await?;

        let requested = response.albums.len();
        let albums: Vec<RawAlbum> = response.albums.into_iter().flatten().collect();
        if albums.len() < requested {
            warn!(
                "{} unknown album id(s) in lookup of {}",
                requested - albums.len(),
                requested
            );
        }
        Ok(albums)
    }
}
