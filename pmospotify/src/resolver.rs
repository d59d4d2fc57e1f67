//! Résolution groupée des albums d'un ensemble d'artistes
//!
//! La résolution se fait en deux étapes concurrentes :
//! 1. une requête `/artists/{id}/albums` par artiste, dont on collecte les
//!    identifiants d'albums (dédupliqués, dans l'ordre de première apparition)
//! 2. une requête `/albums` par groupe de 20 identifiants
//!
//! Chaque étape attend la fin de toutes ses requêtes avant de passer à la
//! suivante. Le nombre de requêtes en vol est plafonné par
//! `max_concurrency`.

use crate::api::{SpotifyApi, ALBUM_LOOKUP_LIMIT};
use crate::error::{Result, SpotifyError};
use crate::models::{Artist, RawAlbum};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use tracing::{debug, info, warn};

/// Comportement face à l'échec d'une sous-requête
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// Le premier échec interrompt toute la résolution
    #[default]
    FailFast,
    /// Les échecs sont collectés et la résolution continue
    BestEffort,
}

impl std::str::FromStr for FanOutPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(format!("unknown fan-out policy: {}", other)),
        }
    }
}

/// Étape de la résolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    /// Listing des albums d'un artiste
    ArtistAlbums,
    /// Lookup groupé des détails d'albums
    AlbumDetails,
}

impl fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveStage::ArtistAlbums => f.write_str("artist albums"),
            ResolveStage::AlbumDetails => f.write_str("album details"),
        }
    }
}

/// Échec d'une sous-requête en mode [`FanOutPolicy::BestEffort`]
#[derive(Debug)]
pub struct ResolveFailure {
    pub stage: ResolveStage,
    /// Identifiant de l'artiste, ou identifiants du groupe séparés par `,`
    pub target: String,
    pub error: SpotifyError,
}

/// Résultat d'une résolution
#[derive(Debug, Default)]
pub struct Resolution {
    /// Albums complets, dans l'ordre des groupes
    pub albums: Vec<RawAlbum>,
    /// Identifiant d'album -> artistes qui l'ont fait apparaître
    pub contributors: IndexMap<String, Vec<String>>,
    /// Vide en mode [`FanOutPolicy::FailFast`]
    pub failures: Vec<ResolveFailure>,
}

/// Résolveur d'albums pour un client Spotify
#[derive(Debug, Clone, Copy)]
pub struct AlbumResolver<'a> {
    api: &'a SpotifyApi,
    max_concurrency: usize,
    policy: FanOutPolicy,
}

impl<'a> AlbumResolver<'a> {
    pub fn new(api: &'a SpotifyApi, max_concurrency: usize, policy: FanOutPolicy) -> Self {
        Self {
            api,
            max_concurrency: max_concurrency.max(1),
            policy,
        }
    }

    /// Résout les albums de tous les artistes donnés
    pub async fn resolve_albums(&self, artists: &[Artist]) -> Result<Resolution> {
        info!("Resolving albums for {} artist(s)", artists.len());

        let listed = fan_out(
            artists,
            self.max_concurrency,
            self.policy,
            ResolveStage::ArtistAlbums,
            |artist| {
                let artist_id = artist.id.clone();
                let fut = async move {
                    self.api
                        .get_artist_albums(&artist.id)
                        .await
                        .map(|refs| (artist.id.clone(), refs))
                };
                (artist_id, fut)
            },
        )
        .await?;

        let mut contributors: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut total_refs = 0usize;
        for (artist_id, refs) in listed.values {
            total_refs += refs.len();
            for album in refs {
                let entry = contributors.entry(album.id).or_default();
                if !entry.contains(&artist_id) {
                    entry.push(artist_id.clone());
                }
            }
        }
        debug!(
            "{} album reference(s), {} after deduplication",
            total_refs,
            contributors.len()
        );

        let ids: Vec<String> = contributors.keys().cloned().collect();
        let mut resolution = self.resolve_album_ids(&ids).await?;
        resolution.contributors = contributors;

        let mut failures = listed.failures;
        failures.append(&mut resolution.failures);
        resolution.failures = failures;

        info!(
            "Resolved {} album(s), {} failure(s)",
            resolution.albums.len(),
            resolution.failures.len()
        );
        Ok(resolution)
    }

    /// Récupère le détail d'une liste d'identifiants par groupes de 20
    ///
    /// Les identifiants sont supposés déjà dédupliqués.
    pub async fn resolve_album_ids(&self, album_ids: &[String]) -> Result<Resolution> {
        let chunks: Vec<&[String]> = album_ids.chunks(ALBUM_LOOKUP_LIMIT).collect();
        debug!(
            "Looking up {} album(s) in {} chunk(s)",
            album_ids.len(),
            chunks.len()
        );

        let fetched = fan_out(
            chunks,
            self.max_concurrency,
            self.policy,
            ResolveStage::AlbumDetails,
            |chunk| (chunk.join(","), self.api.get_albums(chunk)),
        )
        .await?;

        Ok(Resolution {
            albums: fetched.values.into_iter().flatten().collect(),
            contributors: IndexMap::new(),
            failures: fetched.failures,
        })
    }
}

/// Résultats joints d'une étape de fan-out
#[derive(Debug)]
struct FanOutOutcome<T> {
    /// Succès, dans l'ordre des entrées
    values: Vec<T>,
    failures: Vec<ResolveFailure>,
}

/// Lance une sous-requête par élément, avec au plus `concurrency` en vol
///
/// `call` renvoie la cible (pour le rapport d'échec) et le futur à
/// exécuter. Les réponses sont traitées dans leur ordre d'arrivée puis
/// remises dans l'ordre des entrées. En mode fail-fast, le premier échec
/// reçu est renvoyé et les requêtes restantes sont abandonnées.
async fn fan_out<I, T, F, Fut>(
    items: I,
    concurrency: usize,
    policy: FanOutPolicy,
    stage: ResolveStage,
    mut call: F,
) -> Result<FanOutOutcome<T>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> (String, Fut),
    Fut: Future<Output = Result<T>>,
{
    let mut results = std::pin::pin!(
        stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| {
                let (target, fut) = call(item);
                async move { (index, target, fut.await) }
            })
            .buffer_unordered(concurrency)
    );

    let mut values: Vec<(usize, T)> = Vec::new();
    let mut failures: Vec<(usize, ResolveFailure)> = Vec::new();

    while let Some((index, target, result)) = results.next().await {
        match result {
            Ok(value) => values.push((index, value)),
            Err(error) => match policy {
                FanOutPolicy::FailFast => return Err(error),
                FanOutPolicy::BestEffort => {
                    warn!("{} request for {} failed: {}", stage, target, error);
                    failures.push((
                        index,
                        ResolveFailure {
                            stage,
                            target,
                            error,
                        },
                    ));
                }
            },
        }
    }

    values.sort_by_key(|(index, _)| *index);
    failures.sort_by_key(|(index, _)| *index);

    Ok(FanOutOutcome {
        values: values.into_iter().map(|(_, value)| value).collect(),
        failures: failures.into_iter().map(|(_, failure)| failure).collect(),
    })
}
