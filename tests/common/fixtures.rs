//! Stores, services and songs for end-to-end tests.

use super::constants::TEST_USER;
use rand::rngs::StdRng;
use rand::SeedableRng;
use songmatch_server::catalog_store::{AudioFeatures, Song, SongStore, SqliteCatalogStore};
use songmatch_server::config::{ClusteringSettings, RecommendationSettings};
use songmatch_server::describe::NoOpDescriptionGenerator;
use songmatch_server::recommendation::RecommendationService;
use songmatch_server::spotify::{CandidateSong, CandidateSupplier};
use songmatch_server::taste::TasteProfileBuilder;
use songmatch_server::user::{FullUserStore, SqliteUserStore, UserManager, UserStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Raw features and popularity whose normalized vector is `point`.
pub fn features_at(point: [f64; 6]) -> (AudioFeatures, Option<f64>) {
    let features = AudioFeatures {
        acousticness: point[0],
        danceability: point[1],
        duration_ms: 200_000,
        energy: 0.5,
        instrumentalness: 0.0,
        key: 0,
        liveness: point[2],
        loudness: -7.0,
        mode: 1,
        speechiness: 0.05,
        tempo: point[3] * 200.0 + 50.0,
        valence: point[4],
    };
    (features, Some(point[5] * 100.0))
}

pub fn candidate(id: &str, point: [f64; 6]) -> CandidateSong {
    let (features, popularity) = features_at(point);
    CandidateSong {
        external_id: id.to_string(),
        name: format!("Song {}", id),
        artists: vec!["The Test Band".to_string()],
        features,
        popularity,
        image_url: None,
        preview_url: Some(format!("https://preview.example/{}.mp3", id)),
        external_url: None,
    }
}

pub struct TestEnv {
    pub catalog: Arc<SqliteCatalogStore>,
    pub users: Arc<SqliteUserStore>,
    pub builder: Arc<TasteProfileBuilder>,
    pub manager: UserManager,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestEnv {
    /// Fresh databases with `TEST_USER` already created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog = Arc::new(
            SqliteCatalogStore::new(temp_dir.path().join("catalog.db"))
                .expect("Failed to open catalog store"),
        );
        let users = Arc::new(
            SqliteUserStore::new(temp_dir.path().join("user.db"))
                .expect("Failed to open user store"),
        );
        let builder = Arc::new(TasteProfileBuilder::new(
            catalog.clone(),
            users.clone(),
            ClusteringSettings::default(),
        ));
        let manager = UserManager::new(catalog.clone(), users.clone(), builder.clone());
        manager.add_user(TEST_USER).expect("Failed to create test user");

        Self {
            catalog,
            users,
            builder,
            manager,
            _temp_dir: temp_dir,
        }
    }

    pub fn user_id(&self, handle: &str) -> usize {
        self.users
            .get_user_id(handle)
            .unwrap()
            .expect("Test user missing")
    }

    /// Puts a song at `point` in the normalized feature space.
    pub fn add_song(&self, id: &str, point: [f64; 6]) -> Song {
        let (song, _) = self
            .catalog
            .get_or_create(id, candidate(id, point).to_defaults())
            .unwrap();
        song
    }

    pub fn catalog_song(&self, id: &str) -> Song {
        self.catalog
            .get_song(id)
            .unwrap()
            .expect("Song missing from catalog")
    }

    pub fn service(
        &self,
        supplier: Arc<dyn CandidateSupplier>,
        settings: RecommendationSettings,
        seed: u64,
    ) -> RecommendationService {
        let users: Arc<dyn FullUserStore> = self.users.clone();
        RecommendationService::with_rng(
            supplier,
            self.catalog.clone(),
            users,
            Arc::new(NoOpDescriptionGenerator),
            &settings,
            StdRng::seed_from_u64(seed),
        )
    }
}

/// No waiting between attempts.
#[allow(dead_code)]
pub fn fast_settings() -> RecommendationSettings {
    RecommendationSettings {
        retry_delay_ms: 0,
        ..Default::default()
    }
}
