//! Tests de bout en bout des points d'entrée d'agrégation

mod common;

use chrono::{TimeZone, Utc};
use common::{BulkAlbums, artist_albums, following_page, requested_ids};
use pmospotify::{FanOutPolicy, SpotifyError, TimeRange};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_followed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me/following"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(following_page(&["a1", "a2"], Some("c2"))))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/following"))
        .and(query_param("after", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(following_page(&["a3"], None)))
        .mount(server)
        .await;

    for (artist, album) in [("a1", "al1"), ("a2", "al2"), ("a3", "al3")] {
        Mock::given(method("GET"))
            .and(path(format!("/artists/{}/albums", artist)))
            .respond_with(ResponseTemplate::new(200).set_body_json(artist_albums(&[album])))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_followed_releases_end_to_end() {
    let server = MockServer::start().await;
    mount_followed(&server).await;

    Mock::given(method("GET"))
        .and(path("/albums"))
        .respond_with(BulkAlbums::new(&[
            ("al1", "2019-01-01"),
            ("al2", "2021-06"),
            ("al3", "2020"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server, FanOutPolicy::FailFast);
    let releases = client.followed_releases(None).await.unwrap();

    assert!(releases.failures.is_empty());
    let ids: Vec<&str> = releases.albums.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["al2", "al3", "al1"]);

    let latest = &releases.albums[0];
    assert_eq!(latest.release_date, Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap());
    assert_eq!(latest.album_type, "album");
    assert_eq!(
        latest.external_urls.get("spotify").map(String::as_str),
        Some("https://open.spotify.com/album/al2")
    );
}

#[tokio::test]
async fn test_malformed_release_date_is_a_data_error() {
    let server = MockServer::start().await;
    mount_followed(&server).await;

    Mock::given(method("GET"))
        .and(path("/albums"))
        .respond_with(BulkAlbums::new(&[("al2", "not-a-date")]))
        .mount(&server)
        .await;

    let client = common::client(&server, FanOutPolicy::BestEffort);
    let err = client.followed_releases(None).await.unwrap_err();

    assert!(err.is_data_quality());
    assert!(matches!(err, SpotifyError::InvalidReleaseDate { ref album_id, .. } if album_id == "al2"));
}

#[tokio::test]
async fn test_top_releases() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/top/artists"))
        .and(query_param("time_range", "long_term"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [common::artist_json("t1")],
            "offset": 0,
            "limit": 50,
            "total": 1,
            "next": null
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists/t1/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(artist_albums(&["old", "new"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/albums"))
        .respond_with(BulkAlbums::new(&[("old", "1999-09"), ("new", "2024-02-29")]))
        .mount(&server)
        .await;

    let client = common::client(&server, FanOutPolicy::FailFast);
    let releases = client.top_releases(TimeRange::LongTerm, 0).await.unwrap();

    let ids: Vec<&str> = releases.albums.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[tokio::test]
async fn test_new_release_albums_are_resolved_and_ordered() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/browse/new-releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "albums": {
                "items": [
                    {"id": "r1", "name": "r1", "release_date": "2024-01-05"},
                    {"id": "r2", "name": "r2", "release_date": "2024-01-12"},
                    {"id": "r1", "name": "r1", "release_date": "2024-01-05"}
                ],
                "offset": 0,
                "limit": 50,
                "total": 3,
                "next": null
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/albums"))
        .respond_with(BulkAlbums::new(&[("r1", "2024-01-05"), ("r2", "2024-01-12")]))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server, FanOutPolicy::FailFast);
    let releases = client.new_release_albums(0).await.unwrap();

    let ids: Vec<&str> = releases.albums.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r1"]);

    let requests = server.received_requests().await.unwrap();
    let lookup = requests.iter().find(|r| r.url.path() == "/albums").unwrap();
    assert_eq!(requested_ids(lookup), vec!["r1", "r2"]);
}
