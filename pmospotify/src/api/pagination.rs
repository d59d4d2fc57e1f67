//! Parcours des listings paginés de Spotify
//!
//! Deux styles de pagination coexistent côté Spotify :
//! - curseur (`cursors.after`) pour `/me/following`
//! - offset/limit avec lien `next` pour `/browse/new-releases` et `/me/top/*`
//!
//! Chaque endpoint est décrit par un [`Listing`] qui choisit sa
//! [`PageStrategy`] ; le parcours lui-même est commun.

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Style de pagination d'un endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// Jeton opaque `after` sous `cursors`
    Cursor,
    /// Décalage numérique, poursuivi tant qu'un lien `next` est présent
    Offset,
}

/// Position de reprise dans un listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Valeur de `cursors.after` de la page précédente
    After(String),
    /// Décalage du premier élément de la page
    Offset(u32),
}

/// Description d'un endpoint paginé
#[derive(Debug, Clone)]
pub struct Listing {
    /// Chemin relatif à la base d'API
    pub path: &'static str,
    /// Clé englobant l'objet de pagination (`artists`, `albums`), si présente
    pub key: Option<&'static str>,
    pub strategy: PageStrategy,
    /// Paramètres fixes ajoutés à chaque page
    pub params: Vec<(&'static str, String)>,
}

impl Listing {
    pub fn new(path: &'static str, strategy: PageStrategy) -> Self {
        Self {
            path,
            key: None,
            strategy,
            params: Vec::new(),
        }
    }

    /// Indique la clé qui englobe l'objet de pagination
    pub fn wrapped_in(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }
}

/// Une page de résultats
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Position de la page suivante, `None` en fin de listing
    pub next: Option<PageCursor>,
    /// Nombre total d'éléments annoncé par l'API
    pub total: Option<u32>,
}

/// Objet de pagination Spotify (les deux styles)
#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    cursors: Option<Cursors>,
    #[serde(default)]
    offset: Option<u32>,
    /// Taille de page effectivement appliquée (peut être plafonnée par l'API)
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Cursors {
    #[serde(default)]
    after: Option<String>,
}

impl SpotifyApi {
    /// Récupère une seule page d'un listing
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        listing: &Listing,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<T>> {
        let mut params: Vec<(&str, String)> = listing
            .params
            .iter()
            .map(|(name, value)| (*name, value.clone()))
            .collect();
        params.push(("limit", self.page_size.to_string()));

        let requested_offset = match cursor {
            Some(PageCursor::After(after)) => {
                params.push(("after", after.clone()));
                0
            }
            Some(PageCursor::Offset(offset)) => {
                params.push(("offset", offset.to_string()));
                *offset
            }
            None => {
                if listing.strategy == PageStrategy::Offset {
                    params.push(("offset", "0".to_string()));
                }
                0
            }
        };

        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let body: Value = self.execute(listing.path, &params).await?;
        let paging: Paging<T> = unwrap_listing(body, listing.key)?;

        let next = match listing.strategy {
            PageStrategy::Cursor => paging
                .cursors
                .and_then(|c| c.after)
                .map(PageCursor::After),
            PageStrategy::Offset => paging.next.as_ref().map(|_| {
                let offset = paging.offset.unwrap_or(requested_offset);
                let step = paging
                    .limit
                    .filter(|limit| *limit > 0)
                    .unwrap_or(self.page_size);
                PageCursor::Offset(offset + step)
            }),
        };

        debug!(
            "Page of {} from {}: {} item(s), next {:?}",
            listing.key.unwrap_or("items"),
            listing.path,
            paging.items.len(),
            next
        );

        Ok(Page {
            items: paging.items,
            next,
            total: paging.total,
        })
    }

    /// Séquence paresseuse des pages d'un listing
    ///
    /// Chaque page n'est demandée qu'à la consommation de la précédente ;
    /// la séquence s'arrête quand l'API ne fournit plus de suite.
    pub fn pages<'a, T: DeserializeOwned + 'a>(
        &'a self,
        listing: &'a Listing,
        start: Option<PageCursor>,
    ) -> impl Stream<Item = Result<Page<T>>> + 'a {
        stream::try_unfold(Some(start), move |state| async move {
            let Some(cursor) = state else {
                return Ok(None);
            };
            self.fetch_page::<T>(listing, cursor.as_ref())
                .await
                .map(|page| {
                    let next_state = page.next.clone().map(Some);
                    Some((page, next_state))
                })
        })
    }

    /// Parcourt un listing jusqu'au bout et concatène les éléments
    ///
    /// L'ordre des éléments suit strictement l'ordre des pages.
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        listing: &Listing,
        start: Option<PageCursor>,
    ) -> Result<Vec<T>> {
        let mut pages = std::pin::pin!(self.pages::<T>(listing, start));
        let mut items = Vec::new();
        let mut count = 0usize;

        while let Some(page) = pages.try_next().await? {
            count += 1;
            items.extend(page.items);
        }

        debug!(
            "Listing {} exhausted after {} page(s), {} item(s)",
            listing.path,
            count,
            items.len()
        );
        Ok(items)
    }
}

/// Extrait l'objet de pagination, éventuellement englobé sous `key`
fn unwrap_listing<T: DeserializeOwned>(mut body: Value, key: Option<&str>) -> Result<Paging<T>> {
    let paging = match key {
        Some(key) => body
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| SpotifyError::MissingListing(key.to_string()))?,
        None => body,
    };
    Ok(serde_json::from_value(paging)?)
}
