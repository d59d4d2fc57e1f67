//! Structures de données pour représenter les objets Spotify

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Liens externes d'un objet (`{"spotify": "https://open.spotify.com/..."}`)
pub type ExternalUrls = BTreeMap<String, String>;

/// Token d'accès OAuth fourni par l'appelant
///
/// Le token est immuable une fois le client construit. Il n'apparaît
/// jamais en clair dans les sorties `Debug` (et donc dans les logs).
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Valeur brute, à n'utiliser que pour l'en-tête `Authorization`
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Image (pochette, photo d'artiste)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

/// Artiste tel que référencé par un album
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Représente un artiste Spotify (suivi ou "top")
///
/// Seul l'identifiant est utilisé pour résoudre les albums, le reste est
/// conservé tel que renvoyé par l'API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// Identifiant unique de l'artiste
    pub id: String,
    /// Nom de l'artiste
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

/// Référence d'album obtenue en listant les albums d'un artiste
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AlbumRef {
    pub id: String,
}

/// Album complet tel que renvoyé par `/albums`
///
/// Les champs non projetés par la normalisation sont conservés dans
/// `extra` et disparaissent lors du passage à [`Album`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawAlbum {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    /// Date textuelle : `YYYY-MM-DD`, `YYYY-MM` ou `YYYY`
    #[serde(default)]
    pub release_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Album normalisé : projection fixe de [`RawAlbum`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Album {
    pub album_type: String,
    pub artists: Vec<ArtistRef>,
    pub external_urls: ExternalUrls,
    pub href: Option<String>,
    pub id: String,
    pub images: Vec<Image>,
    pub name: String,
    /// Date de sortie, à minuit UTC
    pub release_date: DateTime<Utc>,
}

/// Fenêtre d'historique d'écoute pour les "top artists"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Environ 4 semaines
    ShortTerm,
    /// Environ 6 mois
    MediumTerm,
    /// Plusieurs années
    LongTerm,
}

impl TimeRange {
    /// Valeur du paramètre `time_range`
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
