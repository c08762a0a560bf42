//! Application wiring for the command-line front end.

use crate::ai::{BackendHandles, ImageGenerationClient, TextGenerationClient};
use crate::display::{ConsoleDisplay, DisplaySink};
use crate::image::PlaceholderRenderer;
use crate::models::{Config, GenerationOptions, MovieDetail, MovieSummary};
use crate::movies::{ImdbDetailFetcher, ImdbLister, MovieDetailFetcher, MovieLister};
use crate::orchestrator::{GenerationOrchestrator, GenerationRun, OrchestratorServices};
use crate::storage::{ArtifactSink, FileArtifactSink};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Front-end state: the loaded movie list, the selection and its details.
pub struct App {
    lister: Arc<dyn MovieLister>,
    details: Arc<dyn MovieDetailFetcher>,
    display: Arc<dyn DisplaySink>,
    orchestrator: GenerationOrchestrator,
    movies: Vec<MovieSummary>,
    selected: Option<usize>,
    loaded: Option<MovieDetail>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub lister: Arc<dyn MovieLister>,
    pub details: Arc<dyn MovieDetailFetcher>,
    pub text: TextGenerationClient,
    pub image: ImageGenerationClient,
    pub display: Arc<dyn DisplaySink>,
    pub sink: Arc<dyn ArtifactSink>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        let orchestrator = GenerationOrchestrator::with_services(OrchestratorServices {
            text: services.text,
            image: services.image,
            details: Arc::clone(&services.details),
            display: Arc::clone(&services.display),
            sink: services.sink,
        });

        Self {
            lister: services.lister,
            details: services.details,
            display: services.display,
            orchestrator,
            movies: Vec::new(),
            selected: None,
            loaded: None,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &Config) -> Self {
        // One connection pool for scraping and both backends.
        let http_client = reqwest::Client::new();

        let backends = BackendHandles::from_config(config, http_client.clone());
        let placeholders =
            PlaceholderRenderer::from_optional_font(config.placeholder_font_path.as_deref());

        info!("Saving artifacts to {}", config.save_directory.display());

        Self::with_services(AppServices {
            lister: Arc::new(ImdbLister::new_with_client(
                config.top_movies_url.clone(),
                config.imdb_base_url.clone(),
                http_client.clone(),
            )),
            details: Arc::new(ImdbDetailFetcher::new_with_client(http_client)),
            text: TextGenerationClient::new(backends.text),
            image: ImageGenerationClient::new(backends.image).with_placeholders(placeholders),
            display: Arc::new(ConsoleDisplay),
            sink: Arc::new(FileArtifactSink::new(config.save_directory.clone())),
        })
    }

    pub fn selected(&self) -> Option<&MovieSummary> {
        self.selected.and_then(|index| self.movies.get(index))
    }

    /// Refresh the top-movie list. A failed fetch leaves an empty list.
    pub async fn load_movies(&mut self) -> &[MovieSummary] {
        self.display.status("Fetching movie list from IMDb...");
        self.selected = None;

        self.movies = match self.lister.list_top_movies().await {
            Ok(movies) => movies,
            Err(e) => {
                warn!("Failed to fetch movie list: {}", e);
                self.display
                    .status(&format!("Failed to fetch data from IMDb: {}", e));
                Vec::new()
            }
        };

        self.display
            .status(&format!("Loaded {} top movies from IMDb", self.movies.len()));
        &self.movies
    }

    /// Select a movie by its 1-based rank and load its details unless they
    /// are already loaded.
    pub async fn select(&mut self, rank: usize) -> Result<&MovieDetail> {
        let index = rank
            .checked_sub(1)
            .filter(|index| *index < self.movies.len())
            .ok_or(Error::NoSelection)?;
        self.selected = Some(index);
        let movie = self.movies[index].clone();
        self.display
            .status(&format!("Selected movie: {}", movie.title));

        let stale = self.loaded.as_ref().map_or(true, |d| d.id != movie.id);
        if stale {
            self.display
                .status(&format!("Fetching details for '{}'...", movie.title));
            let detail = self.details.fetch_detail(&movie).await.map_err(|e| {
                self.display
                    .status(&format!("Error fetching movie details: {}", e));
                e
            })?;
            self.loaded = Some(detail);
        }

        let detail = self
            .loaded
            .as_ref()
            .ok_or_else(|| Error::Invariant("Details missing after load".to_string()))?;
        Ok(detail)
    }

    /// Run the generation pipeline for the current selection.
    pub async fn generate(&mut self, options: &GenerationOptions) -> Result<GenerationRun> {
        let selected = self.selected.and_then(|index| self.movies.get(index));
        if let Some(movie) = selected {
            self.display
                .status(&format!("Generating content for '{}'...", movie.title));
        }
        self.orchestrator
            .run(selected, &mut self.loaded, options)
            .await
    }
}
