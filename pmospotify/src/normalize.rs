//! Normalisation et tri des albums
//!
//! Projection des albums bruts sur le jeu de champs fixe de [`Album`] et
//! interprétation de la date de sortie, dont Spotify fournit trois
//! précisions : jour (`2020-05-15`), mois (`2020-05`) ou année (`2020`).

use crate::error::{Result, SpotifyError};
use crate::models::{Album, RawAlbum};
use chrono::{DateTime, NaiveDate, Utc};

/// Interprète une date de sortie Spotify, ancrée à minuit UTC
///
/// Les précisions mois et année sont ramenées au premier jour de la
/// période. Toute autre forme est refusée.
pub fn parse_release_date(value: &str) -> Option<DateTime<Utc>> {
    if !value.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let full = match value.len() {
        10 => value.to_string(),
        7 => format!("{}-01", value),
        4 => format!("{}-01-01", value),
        _ => return None,
    };

    NaiveDate::parse_from_str(&full, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Projette un album brut sur sa forme normalisée
pub fn normalize_album(raw: RawAlbum) -> Result<Album> {
    let release_date = parse_release_date(&raw.release_date).ok_or_else(|| {
        SpotifyError::InvalidReleaseDate {
            album_id: raw.id.clone(),
            value: raw.release_date.clone(),
        }
    })?;

    Ok(Album {
        album_type: raw.album_type,
        artists: raw.artists,
        external_urls: raw.external_urls,
        href: raw.href,
        id: raw.id,
        images: raw.images,
        name: raw.name,
        release_date,
    })
}

/// Normalise une liste d'albums bruts
///
/// La première date invalide interrompt la normalisation.
pub fn normalize(raw_albums: Vec<RawAlbum>) -> Result<Vec<Album>> {
    raw_albums.into_iter().map(normalize_album).collect()
}

/// Trie les albums du plus récent au plus ancien
///
/// Le tri est stable : deux albums sortis le même jour gardent leur ordre
/// relatif.
pub fn order(mut albums: Vec<Album>) -> Vec<Album> {
    albums.sort_by(|a, b| b.release_date.cmp(&a.release_date));
    albums
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(id: &str, release_date: &str) -> RawAlbum {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Album {}", id),
            "album_type": "album",
            "release_date": release_date,
            "label": "Some Label",
            "tracks": {"items": []}
        }))
        .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_all_precisions() {
        assert_eq!(parse_release_date("2020-05-15"), Some(utc(2020, 5, 15)));
        assert_eq!(parse_release_date("2020-05"), Some(utc(2020, 5, 1)));
        assert_eq!(parse_release_date("2020"), Some(utc(2020, 1, 1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_release_date("not-a-date"), None);
        assert_eq!(parse_release_date(""), None);
        assert_eq!(parse_release_date("20"), None);
        assert_eq!(parse_release_date("2020-13"), None);
        assert_eq!(parse_release_date("2021-02-30"), None);
        assert_eq!(parse_release_date("2020-05-15T00:00:00Z"), None);
        assert_eq!(parse_release_date("2020-5-1"), None);
        assert_eq!(parse_release_date("+020-05-01"), None);
        assert_eq!(parse_release_date("2020-05-1x"), None);
    }

    #[test]
    fn test_normalize_projects_fixed_fields() {
        let albums = normalize(vec![raw("a", "2020-05"), raw("b", "2020")]).unwrap();

        assert_eq!(albums[0].id, "a");
        assert_eq!(albums[0].release_date, utc(2020, 5, 1));
        assert_eq!(albums[1].release_date, utc(2020, 1, 1));

        let value = serde_json::to_value(&albums[0]).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "album_type",
                "artists",
                "external_urls",
                "href",
                "id",
                "images",
                "name",
                "release_date"
            ]
        );
    }

    #[test]
    fn test_normalize_surfaces_bad_date() {
        let err = normalize(vec![raw("ok", "2020"), raw("bad", "not-a-date")]).unwrap_err();
        match err {
            SpotifyError::InvalidReleaseDate { album_id, value } => {
                assert_eq!(album_id, "bad");
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_order_descending() {
        let albums = normalize(vec![
            raw("old", "2019-01-01"),
            raw("new", "2021-06-01"),
            raw("mid", "2020-03-01"),
        ])
        .unwrap();

        let ids: Vec<String> = order(albums).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_order_is_stable() {
        let albums = normalize(vec![
            raw("first", "2020-03-01"),
            raw("newest", "2022"),
            raw("second", "2020-03-01"),
            raw("third", "2020-03"),
        ])
        .unwrap();

        let ids: Vec<String> = order(albums).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["newest", "first", "second", "third"]);
    }
}
