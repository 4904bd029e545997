//! Spotify Web API response types.

use crate::catalog_store::AudioFeatures;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArtistSearchResponse {
    pub artists: ArtistPage,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArtistPage {
    #[serde(default)]
    pub items: Vec<ArtistItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArtistItem {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<TrackRef>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<NamedArtist>,
    pub album: Album,
    pub popularity: Option<f64>,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
pub(super) struct NamedArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Image {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ExternalUrls {
    pub spotify: Option<String>,
}

impl Track {
    /// The second album image (medium size) when there is one, else the first.
    pub fn image_url(&self) -> Option<String> {
        let images = &self.album.images;
        images
            .get(1)
            .or_else(|| images.first())
            .map(|image| image.url.clone())
    }

    pub fn artist_names(&self) -> Vec<String> {
        self.artists.iter().map(|a| a.name.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AudioFeaturesResponse {
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: i64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub key: i32,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
}

impl From<AudioFeaturesResponse> for AudioFeatures {
    fn from(r: AudioFeaturesResponse) -> Self {
        AudioFeatures {
            acousticness: r.acousticness,
            danceability: r.danceability,
            duration_ms: r.duration_ms,
            energy: r.energy,
            instrumentalness: r.instrumentalness,
            key: r.key,
            liveness: r.liveness,
            loudness: r.loudness,
            mode: r.mode,
            speechiness: r.speechiness,
            tempo: r.tempo,
            valence: r.valence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_and_picks_medium_image() {
        let json = r#"{
            "id": "t1",
            "name": "Song",
            "artists": [{"name": "A"}, {"name": "B"}],
            "album": {"images": [{"url": "big"}, {"url": "medium"}, {"url": "small"}]},
            "popularity": 64,
            "preview_url": null,
            "external_urls": {"spotify": "https://open.spotify.com/track/t1"}
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.image_url().as_deref(), Some("medium"));
        assert_eq!(track.artist_names(), vec!["A", "B"]);
        assert_eq!(track.popularity, Some(64.0));
        assert!(track.preview_url.is_none());
    }

    #[test]
    fn single_image_is_used() {
        let json = r#"{"id": "t", "name": "n", "album": {"images": [{"url": "only"}]}}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.image_url().as_deref(), Some("only"));
        assert!(track.popularity.is_none());

        let json = r#"{"id": "t", "name": "n", "album": {"images": []}}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert!(track.image_url().is_none());
    }

    #[test]
    fn parses_audio_features() {
        let json = r#"{
            "acousticness": 0.1, "danceability": 0.8, "duration_ms": 200000,
            "energy": 0.9, "instrumentalness": 0.0, "key": 7, "liveness": 0.2,
            "loudness": -4.2, "mode": 0, "speechiness": 0.05, "tempo": 124.0,
            "valence": 0.7, "type": "audio_features", "id": "t1"
        }"#;
        let features: AudioFeatures = serde_json::from_str::<AudioFeaturesResponse>(json)
            .unwrap()
            .into();
        assert_eq!(features.key, 7);
        assert_eq!(features.tempo, 124.0);
    }
}
