//! Module d'accès aux données de l'utilisateur (artistes suivis, top artistes)

use super::pagination::{Listing, Page, PageCursor, PageStrategy};
use super::SpotifyApi;
use crate::error::Result;
use crate::models::{Artist, TimeRange};
use tracing::debug;

impl SpotifyApi {
    /// Listing `/me/following` (pagination par curseur)
    pub fn followed_artists_listing(&self) -> Listing {
        Listing::new("me/following", PageStrategy::Cursor)
            .wrapped_in("artists")
            .param("type", "artist")
            .param("country", self.market.clone())
    }

    /// Listing `/me/top/artists` pour une fenêtre d'écoute (pagination par offset)
    pub fn top_artists_listing(&self, range: TimeRange) -> Listing {
        Listing::new("me/top/artists", PageStrategy::Offset).param("time_range", range.as_str())
    }

    /// Récupère une page d'artistes suivis
    pub async fn get_followed_artists(&self, after: Option<&str>) -> Result<Page<Artist>> {
        debug!("Fetching followed artists after {:?}", after);
        let cursor = after.map(|a| PageCursor::After(a.to_string()));
        self.fetch_page(&self.followed_artists_listing(), cursor.as_ref())
            .await
    }

    /// Récupère une page de top artistes
    pub async fn get_top_artists(&self, range: TimeRange, offset: u32) -> Result<Page<Artist>> {
        debug!("Fetching top artists ({}) at offset {}", range, offset);
        self.fetch_page(
            &self.top_artists_listing(range),
            Some(&PageCursor::Offset(offset)),
        )
        .await
    }
}
