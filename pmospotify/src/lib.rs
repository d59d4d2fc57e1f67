//! # pmospotify - Client Spotify pour PMOMusic
//!
//! Cette crate agrège les sorties d'albums à partir de l'API Web Spotify :
//! à partir d'un token utilisateur, elle parcourt les artistes suivis (ou
//! les top artistes, ou les nouveautés), récupère les albums de chaque
//! artiste, résout leurs métadonnées complètes par lots, puis renvoie les
//! albums normalisés du plus récent au plus ancien.
//!
//! ## Architecture
//!
//! - `SpotifyClient` : points d'entrée haut-niveau (composition)
//! - `api` : exécution des requêtes (rate limiting), endpoints, pagination
//! - `resolver` : résolution concurrente artistes → albums → détails
//! - `normalize` : projection des albums et tri par date de sortie
//! - `models` : structures de données (Artist, RawAlbum, Album, ...)
//! - `config_ext` : paramètres Spotify dans pmoconfig
//!
//! ## Structure des modules
//!
//! ```text
//! pmospotify/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # Client principal et builder
//! │   ├── models.rs           # Structures de données
//! │   ├── api/
//! │   │   ├── mod.rs          # Exécuteur HTTP (429 / Retry-After)
//! │   │   ├── pagination.rs   # Parcours curseur / offset
//! │   │   ├── catalog.rs      # Nouveautés, albums
//! │   │   └── user.rs         # Artistes suivis, top artistes
//! │   ├── resolver.rs         # Fan-out / fan-in par lots
//! │   ├── normalize.rs        # Normalisation et tri
//! │   ├── config_ext.rs       # Extension pmoconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmospotify::{FanOutPolicy, SpotifyClient, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpotifyClient::builder()
//!         .max_concurrency(4)
//!         .fan_out_policy(FanOutPolicy::BestEffort)
//!         .build("BQD...")?;
//!
//!     let releases = client.top_releases(TimeRange::ShortTerm, 0).await?;
//!     for album in &releases.albums {
//!         println!("{} {}", album.release_date.date_naive(), album.name);
//!     }
//!     for failure in &releases.failures {
//!         eprintln!("{} {}: {}", failure.stage, failure.target, failure.error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Rate limiting
//!
//! Un statut 429 n'est jamais remonté à l'appelant : la requête est suspendue
//! pendant la durée `Retry-After` puis rejouée. Les autres erreurs HTTP sont
//! remontées telles quelles (voir [`SpotifyError`]).

pub mod api;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod normalize;
pub mod resolver;

pub use api::pagination::{Listing, Page, PageCursor, PageStrategy};
pub use api::SpotifyApi;
pub use client::{ClientBuilder, Releases, SpotifyClient};
pub use config_ext::SpotifyConfigExt;
pub use error::{Result, SpotifyError};
pub use models::{AccessToken, Album, AlbumRef, Artist, ArtistRef, Image, RawAlbum, TimeRange};
pub use normalize::{normalize, order, parse_release_date};
pub use resolver::{AlbumResolver, FanOutPolicy, ResolveFailure, ResolveStage, Resolution};
