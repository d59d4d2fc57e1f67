//! Gestion des erreurs pour le client Spotify

use thiserror::Error;

/// Type Result personnalisé pour pmospotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Erreurs possibles lors de l'utilisation du client Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Token refusé ou expiré (401/403)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Ressource non trouvée (artiste, album, etc.)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erreur HTTP (transport)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// URL invalide (base d'API ou lien `next`)
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur de l'API Spotify (tout statut non-2xx autre que 429)
    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Date de sortie dans un format non reconnu (qualité de données)
    #[error("Invalid release date {value:?} for album {album_id}")]
    InvalidReleaseDate { album_id: String, value: String },

    /// Argument refusé avant tout appel réseau
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// La page reçue ne contient pas la clé de listing attendue
    #[error("Listing {0:?} missing from page payload")]
    MissingListing(String),
}

impl SpotifyError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur est une erreur d'authentification (401/403)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::Unauthorized(_))
    }

    /// Vérifie si l'erreur provient des données amont plutôt que du réseau
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            SpotifyError::InvalidReleaseDate { .. } | SpotifyError::MissingListing(_)
        )
    }
}
