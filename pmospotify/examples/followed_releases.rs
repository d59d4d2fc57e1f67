//! Sorties récentes des artistes suivis
//!
//! Cet exemple montre comment :
//! - Créer un client depuis la configuration (`spotify.token` ou `SPOTIFY_TOKEN`)
//! - Agréger les albums des artistes suivis
//! - Afficher les top sorties du mois en mode best-effort
//!
//! ```sh
//! SPOTIFY_TOKEN=BQD... cargo run -p pmospotify --example followed_releases
//! ```

use pmoconfig::get_config;
use pmospotify::{FanOutPolicy, SpotifyClient, SpotifyConfigExt, TimeRange};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();
    let level = config.get_log_min_level()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase())),
        )
        .init();

    println!("=== PMOSpotify - Sorties des artistes suivis ===\n");

    let client = SpotifyClient::from_config_obj(&config)?;

    let releases = client.followed_releases(None).await?;
    println!("✓ {} album(s)\n", releases.albums.len());

    for (i, album) in releases.albums.iter().take(20).enumerate() {
        let artists: Vec<&str> = album.artists.iter().map(|a| a.name.as_str()).collect();
        println!(
            "  {:2}. {}  {} - {} ({})",
            i + 1,
            album.release_date.date_naive(),
            artists.join(", "),
            album.name,
            album.album_type
        );
    }

    println!("\n--- Top artistes (4 dernières semaines) ---");
    let client = SpotifyClient::builder()
        .fan_out_policy(FanOutPolicy::BestEffort)
        .build(config.get_spotify_token()?)?;

    let top = client.top_releases(TimeRange::ShortTerm, 0).await?;
    for album in top.albums.iter().take(10) {
        println!("  {}  {}", album.release_date.date_naive(), album.name);
    }
    for failure in &top.failures {
        eprintln!("  ✗ {} {}: {}", failure.stage, failure.target, failure.error);
    }

    Ok(())
}
