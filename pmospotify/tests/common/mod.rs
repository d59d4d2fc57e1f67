//! Helpers partagés par les tests d'intégration

#![allow(dead_code)]

use pmospotify::{FanOutPolicy, SpotifyClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Client pointant sur le serveur de mock
pub fn client(server: &MockServer, policy: FanOutPolicy) -> SpotifyClient {
    SpotifyClient::builder()
        .api_base(server.uri())
        .fan_out_policy(policy)
        .max_concurrency(4)
        .build(TOKEN)
        .unwrap()
}

pub fn artist_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Artist {}", id),
        "type": "artist",
        "genres": ["indie"],
        "popularity": 42,
        "followers": {"total": 1000}
    })
}

pub fn album_json(id: &str, release_date: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Album {}", id),
        "album_type": "album",
        "artists": [{"id": "x", "name": "X", "external_urls": {"spotify": "https://open.spotify.com/artist/x"}}],
        "external_urls": {"spotify": format!("https://open.spotify.com/album/{}", id)},
        "href": format!("https://api.spotify.com/v1/albums/{}", id),
        "images": [{"url": "https://i.scdn.co/image/1", "height": 640, "width": 640}],
        "release_date": release_date,
        "release_date_precision": "day",
        "label": "Label",
        "popularity": 12,
        "tracks": {"items": []}
    })
}

/// Page `/me/following`
pub fn following_page(ids: &[&str], after: Option<&str>) -> Value {
    json!({
        "artists": {
            "items": ids.iter().map(|id| artist_json(id)).collect::<Vec<_>>(),
            "cursors": {"after": after},
            "limit": 50,
            "total": 3
        }
    })
}

/// Page `/artists/{id}/albums`
pub fn artist_albums(ids: &[&str]) -> Value {
    json!({
        "items": ids.iter().map(|id| json!({"id": id, "album_group": "album"})).collect::<Vec<_>>(),
        "next": null
    })
}

/// Répond à `/albums?ids=...` avec un album par identifiant demandé
pub struct BulkAlbums {
    pub dates: HashMap<String, String>,
}

impl BulkAlbums {
    pub fn new(dates: &[(&str, &str)]) -> Self {
        Self {
            dates: dates
                .iter()
                .map(|(id, date)| (id.to_string(), date.to_string()))
                .collect(),
        }
    }
}

impl Respond for BulkAlbums {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let albums: Vec<Value> = requested_ids(request)
            .iter()
            .map(|id| {
                let date = self.dates.get(id).map(String::as_str).unwrap_or("2020");
                album_json(id, date)
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "albums": albums }))
    }
}

/// Identifiants du paramètre `ids` d'une requête de lookup
pub fn requested_ids(request: &Request) -> Vec<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == "ids")
        .map(|(_, v)| v.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}
