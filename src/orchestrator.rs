//! Generation pipeline
//!
//! Turns a selected movie and the user's options into dialogue, a scene
//! description and a scene image. Only validation can abort a run; every
//! later stage degrades into its output (failure text or placeholder image).

use crate::ai::{ImageGenerationClient, TextGenerationClient};
use crate::display::DisplaySink;
use crate::image::fit_for_display;
use crate::models::{
    derive_character_names, GenerationOptions, GenerationRequest, GenerationResult, MovieDetail,
    MovieSummary, MAX_CHARACTERS, MIN_CHARACTERS,
};
use crate::movies::MovieDetailFetcher;
use crate::storage::ArtifactSink;
use crate::{prompts, Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    GeneratingDialogue,
    GeneratingSceneDescription,
    GeneratingImage,
    Done,
    Aborted,
}

impl Stage {
    /// Progress text for the stages that do backend work.
    pub fn progress_label(&self) -> Option<&'static str> {
        match self {
            Stage::GeneratingDialogue => Some("Generating dialogue..."),
            Stage::GeneratingSceneDescription => Some("Generating scene description..."),
            Stage::GeneratingImage => Some("Generating image..."),
            Stage::Idle | Stage::Validating | Stage::Done | Stage::Aborted => None,
        }
    }
}

/// Hands out increasing request ids; only the newest one may commit.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, request_id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == request_id
    }
}

#[derive(Debug, Clone)]
pub enum GenerationRun {
    /// Artifacts were displayed and saved.
    Completed(GenerationResult),
    /// A newer run started first; nothing was committed.
    Superseded(GenerationResult),
}

impl GenerationRun {
    pub fn result(&self) -> &GenerationResult {
        match self {
            GenerationRun::Completed(result) | GenerationRun::Superseded(result) => result,
        }
    }

    pub fn into_result(self) -> GenerationResult {
        match self {
            GenerationRun::Completed(result) | GenerationRun::Superseded(result) => result,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, GenerationRun::Superseded(_))
    }
}

/// Parse and range-check the numeric options.
pub fn validate_options(options: &GenerationOptions) -> Result<(usize, u32)> {
    let invalid =
        || Error::InvalidInput("Invalid input for number of characters or dialogue length.".into());

    let character_count: usize = options
        .character_count
        .trim()
        .parse()
        .map_err(|_| invalid())?;
    let dialogue_max_words: u32 = options
        .dialogue_max_words
        .trim()
        .parse()
        .map_err(|_| invalid())?;

    if !(MIN_CHARACTERS..=MAX_CHARACTERS).contains(&character_count) {
        return Err(Error::InvalidInput(format!(
            "Number of characters must be between {} and {}.",
            MIN_CHARACTERS, MAX_CHARACTERS
        )));
    }
    if dialogue_max_words == 0 {
        return Err(Error::InvalidInput(
            "Dialogue length must be a positive number of words.".into(),
        ));
    }

    Ok((character_count, dialogue_max_words))
}

/// Collaborators of the pipeline, injected at construction.
pub struct OrchestratorServices {
    pub text: TextGenerationClient,
    pub image: ImageGenerationClient,
    pub details: Arc<dyn MovieDetailFetcher>,
    pub display: Arc<dyn DisplaySink>,
    pub sink: Arc<dyn ArtifactSink>,
}

pub struct GenerationOrchestrator {
    text: TextGenerationClient,
    image: ImageGenerationClient,
    details: Arc<dyn MovieDetailFetcher>,
    display: Arc<dyn DisplaySink>,
    sink: Arc<dyn ArtifactSink>,
    tracker: RequestTracker,
}

impl GenerationOrchestrator {
    pub fn with_services(services: OrchestratorServices) -> Self {
        Self {
            text: services.text,
            image: services.image,
            details: services.details,
            display: services.display,
            sink: services.sink,
            tracker: RequestTracker::new(),
        }
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Run the whole pipeline for `selected`.
    ///
    /// `loaded` is the caller's currently loaded detail record; it is replaced
    /// when it belongs to a different movie. Errors are returned only from
    /// validation (including that re-fetch).
    pub async fn run(
        &self,
        selected: Option<&MovieSummary>,
        loaded: &mut Option<MovieDetail>,
        options: &GenerationOptions,
    ) -> Result<GenerationRun> {
        let request_id = self.tracker.begin();
        self.stage(request_id, Stage::Validating);

        let request = match self.validate(selected, loaded, options).await {
            Ok(request) => request,
            Err(e) => {
                warn!("[{}] Generation aborted: {}", request_id, e);
                self.notify(request_id, |display| display.status(&format!("Error: {}", e)));
                self.stage(request_id, Stage::Aborted);
                return Err(e);
            }
        };

        info!(
            "[{}] Generating content for '{}' with {:?}",
            request_id, request.movie.title, request.character_names
        );
        let title = request.movie.title.as_str();
        let storyline = request.movie.storyline.as_str();

        self.stage(request_id, Stage::GeneratingDialogue);
        let dialogue_prompt = prompts::build_dialogue_prompt(
            title,
            storyline,
            &request.character_names,
            request.character_count,
            request.dialogue_max_words,
        );
        let dialogue = match self.text.generate_dialogue(&dialogue_prompt).await {
            Ok(dialogue) => dialogue,
            Err(e) => {
                error!("[{}] Dialogue generation failed: {}", request_id, e);
                format!("Failed to generate dialogue: {}", e)
            }
        };
        self.notify(request_id, |display| display.show_dialogue(&dialogue));

        self.stage(request_id, Stage::GeneratingSceneDescription);
        let scene_prompt = prompts::build_scene_description_prompt(title, storyline);
        let scene_description = match self.text.generate(&scene_prompt).await {
            Ok(scene) => scene,
            Err(e) => {
                error!("[{}] Scene description failed: {}", request_id, e);
                format!("Failed to generate scene description: {}", e)
            }
        };

        self.stage(request_id, Stage::GeneratingImage);
        let image_prompt = prompts::build_image_prompt(
            title,
            &scene_description,
            &request.location,
            &request.characters_description(),
            &request.style,
        );
        let image = self.image.generate(&image_prompt).await;
        info!(
            "[{}] Image ready ({} bytes, {:?})",
            request_id,
            image.bytes.len(),
            image.kind
        );

        let result = GenerationResult {
            request_id,
            character_names: request.character_names.clone(),
            dialogue,
            scene_description,
            image_is_fallback: image.is_placeholder(),
            image_bytes: image.bytes,
        };

        let fitted = fit_for_display(result.image_bytes.clone()).await;

        if !self.tracker.is_current(request_id) {
            info!("[{}] Superseded by a newer request; discarding", request_id);
            return Ok(GenerationRun::Superseded(result));
        }

        match &fitted {
            Ok(fitted) => self.display.show_image(fitted),
            Err(e) => warn!("[{}] Could not prepare image for display: {}", request_id, e),
        }
        if !self.sink.save_dialogue(&result.dialogue).await {
            warn!("[{}] Dialogue was not saved", request_id);
        }
        if !self.sink.save_image(&result.image_bytes).await {
            warn!("[{}] Image was not saved", request_id);
        }

        let summary = if result.image_is_fallback {
            "Image generation failed"
        } else {
            "Content generation complete"
        };
        self.notify(request_id, |display| display.status(summary));
        self.stage(request_id, Stage::Done);

        Ok(GenerationRun::Completed(result))
    }

    async fn validate(
        &self,
        selected: Option<&MovieSummary>,
        loaded: &mut Option<MovieDetail>,
        options: &GenerationOptions,
    ) -> Result<GenerationRequest> {
        let (character_count, dialogue_max_words) = validate_options(options)?;
        let selected = selected.ok_or(Error::NoSelection)?;

        let movie = match loaded.as_ref() {
            Some(detail) if detail.id == selected.id => detail.clone(),
            _ => {
                info!("Loading details for '{}' before generating", selected.title);
                let detail = self.details.fetch_detail(selected).await?;
                *loaded = Some(detail.clone());
                detail
            }
        };

        if !movie.has_storyline() {
            return Err(Error::MissingStoryline(movie.title));
        }

        let character_names = derive_character_names(&movie.characters, character_count);
        Ok(GenerationRequest {
            movie,
            character_count,
            dialogue_max_words,
            location: options.location.trim().to_string(),
            style: options.style.clone(),
            character_names,
        })
    }

    fn stage(&self, request_id: u64, stage: Stage) {
        self.notify(request_id, |display| display.stage_changed(stage));
    }

    /// Forward to the display unless a newer request has started.
    fn notify(&self, request_id: u64, update: impl FnOnce(&dyn DisplaySink)) {
        if self.tracker.is_current(request_id) {
            update(self.display.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{BackendHandle, MockImageBackend, MockTextBackend};
    use crate::display::{DisplayEvent, RecordingDisplay};
    use crate::models::{Style, NO_STORYLINE};
    use crate::movies::MockMovieDetailFetcher;
    use crate::storage::MockArtifactSink;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct Fixture {
        text: MockTextBackend,
        image: MockImageBackend,
        details: MockMovieDetailFetcher,
        display: RecordingDisplay,
        sink: MockArtifactSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                text: MockTextBackend::new()
                    .with_response("**Ava**: We should talk.")
                    .with_response("A windswept rooftop at dusk."),
                image: MockImageBackend::new(),
                details: MockMovieDetailFetcher::new().with_detail(detail()),
                display: RecordingDisplay::new(),
                sink: MockArtifactSink::new(),
            }
        }

        fn orchestrator(&self) -> GenerationOrchestrator {
            GenerationOrchestrator::with_services(OrchestratorServices {
                text: TextGenerationClient::new(BackendHandle::Ready(Arc::new(self.text.clone()))),
                image: ImageGenerationClient::new(BackendHandle::Ready(Arc::new(
                    self.image.clone(),
                ))),
                details: Arc::new(self.details.clone()),
                display: Arc::new(self.display.clone()),
                sink: Arc::new(self.sink.clone()),
            })
        }

        fn backend_calls(&self) -> usize {
            self.text.get_call_count() + self.image.get_call_count()
        }
    }

    fn summary() -> MovieSummary {
        MovieSummary {
            id: "tt0000001".to_string(),
            title: "Example Film".to_string(),
            detail_url: "https://www.imdb.com/title/tt0000001/".to_string(),
        }
    }

    fn detail() -> MovieDetail {
        MovieDetail {
            id: "tt0000001".to_string(),
            title: "Example Film".to_string(),
            url: "https://www.imdb.com/title/tt0000001/".to_string(),
            poster_url: None,
            year: "1999".to_string(),
            parental_guide: "R".to_string(),
            rating: "8.1".to_string(),
            genres: vec!["Drama".to_string()],
            director: "Jane Doe".to_string(),
            cast: vec!["Actor One".to_string()],
            characters: vec!["Ava".to_string()],
            storyline: "Two rivals reconcile".to_string(),
        }
    }

    #[test]
    fn test_request_tracker_latest_wins() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn test_validate_options() {
        let options = GenerationOptions::default();
        assert_eq!(validate_options(&options).unwrap(), (2, 500));
        assert_eq!(
            validate_options(&options.clone().with_character_count(" 4 ")).unwrap(),
            (4, 500)
        );

        for bad in [
            options.clone().with_dialogue_max_words("0"),
            options.clone().with_dialogue_max_words("many"),
            options.clone().with_dialogue_max_words("-5"),
        ] {
            assert!(matches!(validate_options(&bad), Err(Error::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_out_of_range_character_count_aborts_without_backend_calls() {
        for count in ["0", "1", "5", "12", "two", ""] {
            let fixture = Fixture::new();
            let options = GenerationOptions::default().with_character_count(count);

            let err = fixture
                .orchestrator()
                .run(Some(&summary()), &mut Some(detail()), &options)
                .await
                .unwrap_err();

            assert!(matches!(err, Error::InvalidInput(_)), "count {:?}", count);
            assert_eq!(fixture.backend_calls(), 0);
            assert_eq!(fixture.details.get_call_count(), 0);
            assert_eq!(fixture.sink.get_save_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_selection_aborts() {
        let fixture = Fixture::new();

        let err = fixture
            .orchestrator()
            .run(None, &mut None, &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoSelection));
        assert_eq!(fixture.backend_calls(), 0);
        assert_eq!(
            fixture.display.get_stages(),
            vec![Stage::Validating, Stage::Aborted]
        );
        assert_eq!(fixture.display.get_statuses(), vec!["Error: No movie selected"]);
    }

    #[tokio::test]
    async fn test_sentinel_storyline_aborts_before_text_backend() {
        let fixture = Fixture::new();
        let mut loaded = Some(MovieDetail {
            storyline: NO_STORYLINE.to_string(),
            ..detail()
        });

        let err = fixture
            .orchestrator()
            .run(Some(&summary()), &mut loaded, &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingStoryline(ref title) if title == "Example Film"));
        assert!(err.is_validation());
        assert_eq!(fixture.text.get_call_count(), 0);
        assert_eq!(fixture.image.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_detail_is_refetched() {
        let fixture = Fixture::new();
        let mut loaded = Some(MovieDetail {
            id: "tt9999999".to_string(),
            title: "Other Film".to_string(),
            ..detail()
        });

        let run = fixture
            .orchestrator()
            .run(Some(&summary()), &mut loaded, &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(fixture.details.get_fetched_ids(), vec!["tt0000001"]);
        assert_eq!(loaded.unwrap().title, "Example Film");
        assert!(fixture.text.get_prompts()[0].contains("Example Film"));
        assert!(!run.is_superseded());
    }

    #[tokio::test]
    async fn test_matching_detail_is_reused() {
        let fixture = Fixture::new();

        fixture
            .orchestrator()
            .run(Some(&summary()), &mut Some(detail()), &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(fixture.details.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_detail_fetch_failure_aborts() {
        let mut fixture = Fixture::new();
        fixture.details = MockMovieDetailFetcher::new().with_failure("HTTP 503");

        let err = fixture
            .orchestrator()
            .run(Some(&summary()), &mut None, &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Scrape(_)));
        assert_eq!(fixture.backend_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_run_stages_and_artifacts() {
        let fixture = Fixture::new();
        let options = GenerationOptions::default()
            .with_character_count(3)
            .with_dialogue_max_words(100)
            .with_location("Rooftop")
            .with_style(Style::Cartoon);

        let result = fixture
            .orchestrator()
            .run(Some(&summary()), &mut Some(detail()), &options)
            .await
            .unwrap()
            .into_result();

        assert_eq!(
            result.character_names,
            vec!["Ava", "Character 2", "Character 3"]
        );
        assert_eq!(result.dialogue, "**Ava**: We should talk.");
        assert_eq!(result.scene_description, "A windswept rooftop at dusk.");
        assert!(!result.image_is_fallback);

        let prompts = fixture.text.get_prompts();
        assert!(prompts[0].contains("Ava, Character 2, Character 3"));
        assert!(prompts[0].contains("100 words"));
        assert!(prompts[1].contains("Two rivals reconcile"));

        let image_prompt = &fixture.image.get_prompts()[0];
        assert!(image_prompt.contains("A windswept rooftop at dusk."));
        assert!(image_prompt.contains("Setting: Rooftop"));
        assert!(image_prompt.contains("3 characters from the movie Example Film"));
        assert!(image_prompt.contains("Style: Cartoon"));

        assert_eq!(
            fixture.display.get_stages(),
            vec![
                Stage::Validating,
                Stage::GeneratingDialogue,
                Stage::GeneratingSceneDescription,
                Stage::GeneratingImage,
                Stage::Done,
            ]
        );
        assert_eq!(
            fixture.sink.get_dialogue().as_deref(),
            Some("**Ava**: We should talk.")
        );
        assert_eq!(fixture.sink.get_image(), Some(result.image_bytes));
        assert_eq!(
            fixture.display.get_statuses(),
            vec!["Content generation complete"]
        );
    }

    #[tokio::test]
    async fn test_dialogue_is_shown_before_scene_work() {
        let fixture = Fixture::new();

        fixture
            .orchestrator()
            .run(Some(&summary()), &mut Some(detail()), &GenerationOptions::default())
            .await
            .unwrap();

        let events = fixture.display.get_events();
        let dialogue_at = events
            .iter()
            .position(|e| matches!(e, DisplayEvent::Dialogue(_)))
            .unwrap();
        let scene_at = events
            .iter()
            .position(|e| *e == DisplayEvent::Stage(Stage::GeneratingSceneDescription))
            .unwrap();
        let image_at = events
            .iter()
            .position(|e| matches!(e, DisplayEvent::Image { .. }))
            .unwrap();

        assert!(dialogue_at < scene_at);
        assert!(scene_at < image_at);
    }

    #[tokio::test]
    async fn test_text_failures_do_not_abort() {
        let mut fixture = Fixture::new();
        fixture.text = MockTextBackend::new().with_failure("connection reset");

        let result = fixture
            .orchestrator()
            .run(Some(&summary()), &mut Some(detail()), &GenerationOptions::default())
            .await
            .unwrap()
            .into_result();

        assert!(result
            .dialogue
            .starts_with("Failed to generate dialogue: "));
        assert!(result.dialogue.contains("connection reset"));
        assert!(result
            .scene_description
            .starts_with("Failed to generate scene description: "));

        // The image stage still runs, from the failure text.
        assert_eq!(fixture.image.get_call_count(), 1);
        assert!(fixture.image.get_prompts()[0].contains("Failed to generate scene description"));
        assert_eq!(fixture.display.get_dialogue(), Some(result.dialogue));
    }

    #[tokio::test]
    async fn test_unavailable_backends_still_produce_artifacts() {
        let fixture = Fixture::new();
        let orchestrator = GenerationOrchestrator::with_services(OrchestratorServices {
            text: TextGenerationClient::new(BackendHandle::unavailable("no text model")),
            image: ImageGenerationClient::new(BackendHandle::unavailable("no image model")),
            details: Arc::new(fixture.details.clone()),
            display: Arc::new(fixture.display.clone()),
            sink: Arc::new(fixture.sink.clone()),
        });

        let result = orchestrator
            .run(Some(&summary()), &mut Some(detail()), &GenerationOptions::default())
            .await
            .unwrap()
            .into_result();

        assert!(result.dialogue.contains("no text model"));
        assert!(result.image_is_fallback);
        assert!(!result.image_bytes.is_empty());
        assert_eq!(fixture.display.get_statuses(), vec!["Image generation failed"]);
    }

    #[tokio::test]
    async fn test_sink_failures_are_not_fatal() {
        let mut fixture = Fixture::new();
        fixture.sink = MockArtifactSink::new().with_failures();

        let run = fixture
            .orchestrator()
            .run(Some(&summary()), &mut Some(detail()), &GenerationOptions::default())
            .await
            .unwrap();

        assert!(!run.is_superseded());
        assert_eq!(fixture.sink.get_save_count(), 2);
    }

    #[tokio::test]
    async fn test_newer_request_during_saves_suppresses_final_updates() {
        let mut fixture = Fixture::new();
        fixture.sink = MockArtifactSink::new().with_delay(Duration::from_millis(30));
        let orchestrator = fixture.orchestrator();
        let mut loaded = Some(detail());
        let summary = summary();
        let options = GenerationOptions::default();

        let (run, _) = tokio::join!(
            orchestrator.run(Some(&summary), &mut loaded, &options),
            async {
                while fixture.sink.get_save_count() == 0 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                orchestrator.tracker().begin();
            },
        );

        assert!(!run.unwrap().is_superseded());
        assert_eq!(fixture.sink.get_save_count(), 2);
        assert!(fixture.display.get_statuses().is_empty());
        assert_eq!(
            fixture.display.get_stages().last(),
            Some(&Stage::GeneratingImage)
        );
    }

    #[tokio::test]
    async fn test_older_run_is_superseded_by_newer_one() {
        let mut fixture = Fixture::new();
        fixture.text = MockTextBackend::new()
            .with_response("slow text")
            .with_delay(Duration::from_millis(20));
        let orchestrator = fixture.orchestrator();

        let options = GenerationOptions::default();
        let selected = summary();
        let (mut first_loaded, mut second_loaded) = (Some(detail()), Some(detail()));

        let (first, second) = tokio::join!(
            orchestrator.run(Some(&selected), &mut first_loaded, &options),
            orchestrator.run(Some(&selected), &mut second_loaded, &options),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(first.is_superseded());
        assert!(!second.is_superseded());
        assert!(first.result().request_id < second.result().request_id);

        let images = fixture
            .display
            .get_events()
            .into_iter()
            .filter(|e| matches!(e, DisplayEvent::Image { .. }))
            .count();
        assert_eq!(images, 1);
        assert_eq!(fixture.sink.get_save_count(), 2);
        assert_eq!(fixture.display.get_stages().last(), Some(&Stage::Done));
    }
}
