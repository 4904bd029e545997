use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songmatch_server::catalog_store::{SongStore, SqliteCatalogStore};
use songmatch_server::config::{AppConfig, CliConfig, FileConfig};
use songmatch_server::describe::{
    DescriptionGenerator, LlmDescriptionGenerator, NoOpDescriptionGenerator,
};
use songmatch_server::metrics;
use songmatch_server::recommendation::{RecommendationError, RecommendationService};
use songmatch_server::spotify::{ClientCredentialsSource, SpotifyClient, TokenCache};
use songmatch_server::taste::TasteProfileBuilder;
use songmatch_server::user::{
    FullUserStore, Rating, RebuildStatus, SqliteUserStore, TasteProfileStore, UserManager,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")))]
struct CliArgs {
    /// Directory holding catalog.db and user.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the CLI ones.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// OpenAI-compatible endpoint used for flavor text. Disabled when unset.
    #[clap(long, env = "DESCRIBER_BASE_URL")]
    pub describer_base_url: Option<String>,

    #[clap(long, env = "DESCRIBER_API_KEY", hide_env_values = true)]
    pub describer_api_key: Option<String>,

    /// Print the Prometheus metrics after the command completes.
    #[clap(long)]
    pub print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RatingArg {
    Like,
    Dislike,
}

impl From<RatingArg> for Rating {
    fn from(value: RatingArg) -> Self {
        match value {
            RatingArg::Like => Rating::Like,
            RatingArg::Dislike => Rating::Dislike,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a user with the given handle.
    CreateUser { user_handle: String },

    /// Likes or dislikes a song that is already in the catalog.
    Rate {
        user_handle: String,
        song_id: String,
        #[clap(value_enum)]
        rating: RatingArg,
    },

    /// Removes a rating without touching the rating counters.
    Unrate { user_handle: String, song_id: String },

    /// Shows liked and disliked songs with the cumulative counters.
    Ratings { user_handle: String },

    /// Rebuilds the taste profile right away.
    Rebuild { user_handle: String },

    /// Shows the stored taste profile.
    Profile { user_handle: String },

    /// Asks the candidate supplier for songs and filters them through the
    /// user's taste profile.
    Recommend {
        user_handle: String,
        /// One to five artist names.
        #[clap(required = true)]
        seed_artists: Vec<String>,
    },
}

struct App {
    config: AppConfig,
    catalog_store: Arc<SqliteCatalogStore>,
    user_store: Arc<SqliteUserStore>,
    profile_builder: Arc<TasteProfileBuilder>,
    user_manager: UserManager,
}

impl App {
    fn open(config: AppConfig) -> Result<Self> {
        info!("Opening catalog database at {:?}...", config.catalog_db_path());
        let catalog_store = Arc::new(SqliteCatalogStore::new(config.catalog_db_path())?);
        info!("Opening user database at {:?}...", config.user_db_path());
        let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);

        metrics::init_metrics();
        metrics::set_catalog_size(catalog_store.get_songs_count()?);

        let profile_builder = Arc::new(TasteProfileBuilder::new(
            catalog_store.clone(),
            user_store.clone(),
            config.clustering.clone(),
        ));
        let user_manager = UserManager::new(
            catalog_store.clone(),
            user_store.clone(),
            profile_builder.clone(),
        );
        Ok(Self {
            config,
            catalog_store,
            user_store,
            profile_builder,
            user_manager,
        })
    }

    fn user_id(&self, user_handle: &str) -> Result<usize> {
        self.user_manager
            .get_user_id(user_handle)?
            .with_context(|| format!("User {} not found", user_handle))
    }

    fn describer(&self) -> Result<Arc<dyn DescriptionGenerator>> {
        if self.config.describer.base_url.is_none() {
            info!("No describer configured, flavor text is disabled");
            return Ok(Arc::new(NoOpDescriptionGenerator));
        }
        Ok(Arc::new(LlmDescriptionGenerator::new(&self.config.describer)?))
    }

    fn recommendation_service(&self) -> Result<RecommendationService> {
        let settings = &self.config.spotify;
        let Some((client_id, client_secret)) = settings.credentials() else {
            bail!(
                "Spotify credentials are required, set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET"
            );
        };
        let http = SpotifyClient::http_client(settings)?;
        let tokens = TokenCache::new(Box::new(ClientCredentialsSource::new(
            http.clone(),
            settings.token_url.clone(),
            client_id,
            client_secret,
        )));
        let supplier = Arc::new(SpotifyClient::new(http, tokens, settings));
        let user_store: Arc<dyn FullUserStore> = self.user_store.clone();

        Ok(RecommendationService::new(
            supplier,
            self.catalog_store.clone(),
            user_store,
            self.describer()?,
            &self.config.recommendation,
        ))
    }

    fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::CreateUser { user_handle } => {
                let id = self.user_manager.add_user(&user_handle)?;
                println!("Created user {} with id {}", user_handle, id);
            }
            Command::Rate {
                user_handle,
                song_id,
                rating,
            } => {
                let user_id = self.user_id(&user_handle)?;
                let outcome = self
                    .user_manager
                    .rate_song(user_id, &song_id, rating.into())?;
                println!(
                    "Rated {} ({} liked, {} disliked)",
                    song_id,
                    outcome.counts.liked_count,
                    outcome.counts.disliked_count
                );
                match outcome.rebuild {
                    RebuildStatus::NotDue => {}
                    RebuildStatus::Rebuilt => println!("Taste profile rebuilt"),
                    RebuildStatus::Failed(message) => println!(
                        "Taste profile rebuild failed, keeping the previous one: {}",
                        message
                    ),
                }
            }
            Command::Unrate {
                user_handle,
                song_id,
            } => {
                let user_id = self.user_id(&user_handle)?;
                match self.user_manager.remove_rating(user_id, &song_id)? {
                    Some(rating) => println!("Removed {} rating of {}", rating.as_str(), song_id),
                    None => println!("{} was not rated", song_id),
                }
            }
            Command::Ratings { user_handle } => {
                let user_id = self.user_id(&user_handle)?;
                let state = self.user_manager.rating_state(user_id)?;
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            Command::Rebuild { user_handle } => {
                let user_id = self.user_id(&user_handle)?;
                let profile = self.profile_builder.rebuild_profile(user_id)?;
                println!(
                    "Rebuilt profile: {} liked clusters, {} disliked clusters",
                    profile.liked_clusters.len(),
                    profile.disliked_clusters.len()
                );
            }
            Command::Profile { user_handle } => {
                let user_id = self.user_id(&user_handle)?;
                match self.user_store.get_taste_profile(user_id)? {
                    Some(profile) => {
                        let json = serde_json::json!({
                            "user_id": profile.user_id,
                            "liked_clusters": profile.liked_clusters,
                            "disliked_clusters": profile.disliked_clusters,
                        });
                        println!("{}", serde_json::to_string_pretty(&json)?);
                    }
                    None => println!("No taste profile yet for {}", user_handle),
                }
            }
            Command::Recommend {
                user_handle,
                seed_artists,
            } => {
                let user_id = self.user_id(&user_handle)?;
                let service = self.recommendation_service()?;
                match service.get_recommendations(user_id, &seed_artists) {
                    Ok(songs) if songs.is_empty() => {
                        println!("No recommendations available, try again later.")
                    }
                    Ok(songs) => println!("{}", serde_json::to_string_pretty(&songs)?),
                    Err(RecommendationError::InvalidInput(message)) => bail!(message),
                    Err(e) => return Err(e.into()),
                }
                metrics::set_catalog_size(self.catalog_store.get_songs_count()?);
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir.clone(),
        spotify_client_id: cli_args.spotify_client_id.clone(),
        spotify_client_secret: cli_args.spotify_client_secret.clone(),
        describer_base_url: cli_args.describer_base_url.clone(),
        describer_api_key: cli_args.describer_api_key.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let app = App::open(config)?;
    let result = app.run(cli_args.command);
    if let Err(e) = &result {
        warn!("Command failed: {:#}", e);
    }

    if cli_args.print_metrics {
        print!("{}", metrics::gather_metrics());
    }
    result
}
