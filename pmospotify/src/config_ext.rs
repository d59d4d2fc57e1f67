//! Extension pour intégrer la configuration Spotify dans pmoconfig
//!
//! Ce module fournit le trait `SpotifyConfigExt` qui ajoute à
//! `pmoconfig::Config` les méthodes de lecture/écriture des paramètres
//! Spotify (section `spotify` du fichier de configuration).

use crate::api::{API_BASE_URL, DEFAULT_ALBUMS_PER_ARTIST, DEFAULT_MARKET, DEFAULT_PAGE_SIZE};
use crate::resolver::FanOutPolicy;
use anyhow::{anyhow, Result};
use pmoconfig::Config;
use serde_yaml::{Number, Value};
use std::env;
use tracing::warn;

/// Variable d'environnement de repli pour le token d'accès
pub const ENV_SPOTIFY_TOKEN: &str = "SPOTIFY_TOKEN";

/// Variable d'environnement de repli pour le secret client
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";

/// Nombre de requêtes simultanées par défaut lors de la résolution
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Trait d'extension pour gérer la configuration Spotify dans pmoconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmospotify::SpotifyConfigExt;
///
/// let config = get_config();
/// let token = config.get_spotify_token()?;
/// ```
pub trait SpotifyConfigExt {
    /// Récupère le token d'accès Spotify
    ///
    /// Lu dans `spotify.token`, puis dans la variable `SPOTIFY_TOKEN`.
    ///
    /// # Errors
    ///
    /// Retourne une erreur si aucun token n'est configuré
    fn get_spotify_token(&self) -> Result<String>;

    /// Définit le token d'accès Spotify
    fn set_spotify_token(&self, token: &str) -> Result<()>;

    /// Récupère le secret client Spotify, s'il est configuré
    ///
    /// Lu dans `spotify.client_secret`, puis dans `SPOTIFY_CLIENT_SECRET`.
    fn get_spotify_client_secret(&self) -> Result<Option<String>>;

    /// Définit le secret client Spotify
    fn set_spotify_client_secret(&self, secret: &str) -> Result<()>;

    /// Base de l'API (surchargée pour les tests ou un proxy)
    fn get_spotify_api_base(&self) -> Result<String>;

    /// Marché utilisé pour filtrer le catalogue (code pays ISO)
    fn get_spotify_market(&self) -> Result<String>;

    /// Définit le marché
    fn set_spotify_market(&self, market: &str) -> Result<()>;

    /// Taille de page des listings
    fn get_spotify_page_size(&self) -> Result<u32>;

    /// Nombre d'albums demandés par artiste
    fn get_spotify_albums_per_artist(&self) -> Result<u32>;

    /// Nombre maximal de requêtes simultanées lors de la résolution
    fn get_spotify_max_concurrency(&self) -> Result<usize>;

    /// Définit le nombre maximal de requêtes simultanées
    fn set_spotify_max_concurrency(&self, max: usize) -> Result<()>;

    /// Comportement face aux échecs partiels de la résolution
    fn get_spotify_fan_out_policy(&self) -> Result<FanOutPolicy>;
}

/// Lit une chaîne non vide
fn get_string(config: &Config, key: &str) -> Option<String> {
    match config.get_value(&["spotify", key]) {
        Ok(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Lit un entier positif, avec repli sur `default`
fn get_u64(config: &Config, key: &str, default: u64) -> u64 {
    match config.get_value(&["spotify", key]) {
        Ok(Value::Number(n)) => match n.as_u64() {
            Some(v) if v > 0 => v,
            _ => {
                warn!("Invalid spotify.{} value {}, using default {}", key, n, default);
                default
            }
        },
        Ok(Value::String(s)) => match s.trim().parse::<u64>() {
            Ok(v) if v > 0 => v,
            _ => {
                warn!("Invalid spotify.{} value '{}', using default {}", key, s, default);
                default
            }
        },
        _ => default,
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl SpotifyConfigExt for Config {
    fn get_spotify_token(&self) -> Result<String> {
        get_string(self, "token")
            .or_else(|| env_non_empty(ENV_SPOTIFY_TOKEN))
            .ok_or_else(|| {
                anyhow!(
                    "Spotify token not configured (spotify.token or {})",
                    ENV_SPOTIFY_TOKEN
                )
            })
    }

    fn set_spotify_token(&self, token: &str) -> Result<()> {
        self.set_value(&["spotify", "token"], Value::String(token.to_string()))
    }

    fn get_spotify_client_secret(&self) -> Result<Option<String>> {
        Ok(get_string(self, "client_secret").or_else(|| env_non_empty(ENV_SPOTIFY_CLIENT_SECRET)))
    }

    fn set_spotify_client_secret(&self, secret: &str) -> Result<()> {
        self.set_value(
            &["spotify", "client_secret"],
            Value::String(secret.to_string()),
        )
    }

    fn get_spotify_api_base(&self) -> Result<String> {
        Ok(get_string(self, "api_base").unwrap_or_else(|| API_BASE_URL.to_string()))
    }

    fn get_spotify_market(&self) -> Result<String> {
        Ok(get_string(self, "market").unwrap_or_else(|| DEFAULT_MARKET.to_string()))
    }

    fn set_spotify_market(&self, market: &str) -> Result<()> {
        self.set_value(&["spotify", "market"], Value::String(market.to_string()))
    }

    fn get_spotify_page_size(&self) -> Result<u32> {
        let size = get_u64(self, "page_size", DEFAULT_PAGE_SIZE as u64);
        u32::try_from(size).map_err(|_| anyhow!("spotify.page_size out of range: {}", size))
    }

    fn get_spotify_albums_per_artist(&self) -> Result<u32> {
        let limit = get_u64(self, "albums_per_artist", DEFAULT_ALBUMS_PER_ARTIST as u64);
        u32::try_from(limit)
            .map_err(|_| anyhow!("spotify.albums_per_artist out of range: {}", limit))
    }

    fn get_spotify_max_concurrency(&self) -> Result<usize> {
        Ok(get_u64(self, "max_concurrency", DEFAULT_MAX_CONCURRENCY as u64) as usize)
    }

    fn set_spotify_max_concurrency(&self, max: usize) -> Result<()> {
        self.set_value(
            &["spotify", "max_concurrency"],
            Value::Number(Number::from(max as u64)),
        )
    }

    fn get_spotify_fan_out_policy(&self) -> Result<FanOutPolicy> {
        match get_string(self, "fan_out_policy") {
            Some(policy) => policy.parse().map_err(|e: String| anyhow!(e)),
            None => Ok(FanOutPolicy::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_defaults() {
        let (_dir, config) = config();
        assert_eq!(config.get_spotify_api_base().unwrap(), API_BASE_URL);
        assert_eq!(config.get_spotify_market().unwrap(), "US");
        assert_eq!(config.get_spotify_page_size().unwrap(), 50);
        assert_eq!(config.get_spotify_albums_per_artist().unwrap(), 5);
        assert_eq!(config.get_spotify_max_concurrency().unwrap(), 8);
        assert_eq!(
            config.get_spotify_fan_out_policy().unwrap(),
            FanOutPolicy::FailFast
        );
    }

    #[test]
    fn test_token_roundtrip() {
        let (_dir, config) = config();
        config.set_spotify_token("BQD-abc").unwrap();
        assert_eq!(config.get_spotify_token().unwrap(), "BQD-abc");
    }

    #[test]
    fn test_client_secret_env_fallback() {
        let (_dir, config) = config();

        // SAFETY: seul ce test lit ou modifie SPOTIFY_CLIENT_SECRET
        unsafe { env::set_var(ENV_SPOTIFY_CLIENT_SECRET, "from-env") };
        assert_eq!(
            config.get_spotify_client_secret().unwrap(),
            Some("from-env".to_string())
        );

        config.set_spotify_client_secret("from-config").unwrap();
        assert_eq!(
            config.get_spotify_client_secret().unwrap(),
            Some("from-config".to_string())
        );

        unsafe { env::remove_var(ENV_SPOTIFY_CLIENT_SECRET) };
        config.set_spotify_client_secret("").unwrap();
        assert_eq!(config.get_spotify_client_secret().unwrap(), None);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let (_dir, config) = config();
        config
            .set_value(&["spotify", "page_size"], Value::String("lots".into()))
            .unwrap();
        config.set_spotify_max_concurrency(0).unwrap();

        assert_eq!(config.get_spotify_page_size().unwrap(), 50);
        assert_eq!(config.get_spotify_max_concurrency().unwrap(), 8);
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let (_dir, config) = config();
        config
            .set_value(&["spotify", "fan_out_policy"], Value::String("maybe".into()))
            .unwrap();
        assert!(config.get_spotify_fan_out_policy().is_err());

        config
            .set_value(
                &["spotify", "fan_out_policy"],
                Value::String("best_effort".into()),
            )
            .unwrap();
        assert_eq!(
            config.get_spotify_fan_out_policy().unwrap(),
            FanOutPolicy::BestEffort
        );
    }
}
