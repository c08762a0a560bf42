use super::{MovieDetailFetcher, MovieLister};
use crate::models::{MovieDetail, MovieSummary, NO_STORYLINE};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockMovieLister {
    movies: Arc<Mutex<Vec<MovieSummary>>>,
    failure: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockMovieLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(self, movie: MovieSummary) -> Self {
        self.movies.lock().unwrap().push(movie);
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl MovieLister for MockMovieLister {
    async fn list_top_movies(&self) -> Result<Vec<MovieSummary>> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Scrape(message));
        }
        Ok(self.movies.lock().unwrap().clone())
    }
}

/// Detail fetcher serving canned records keyed by movie id.
///
/// Unknown ids get a record with no storyline.
#[derive(Clone, Default)]
pub struct MockMovieDetailFetcher {
    details: Arc<Mutex<HashMap<String, MovieDetail>>>,
    failure: Arc<Mutex<Option<String>>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockMovieDetailFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detail(self, detail: MovieDetail) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(detail.id.clone(), detail);
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    /// Ids passed to `fetch_detail`, in call order.
    pub fn get_fetched_ids(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MovieDetailFetcher for MockMovieDetailFetcher {
    async fn fetch_detail(&self, movie: &MovieSummary) -> Result<MovieDetail> {
        self.fetched.lock().unwrap().push(movie.id.clone());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Scrape(message));
        }

        let details = self.details.lock().unwrap();
        Ok(details.get(&movie.id).cloned().unwrap_or_else(|| MovieDetail {
            id: movie.id.clone(),
            title: movie.title.clone(),
            url: movie.detail_url.clone(),
            poster_url: None,
            year: String::new(),
            parental_guide: String::new(),
            rating: "Unknown".to_string(),
            genres: Vec::new(),
            director: String::new(),
            cast: Vec::new(),
            characters: Vec::new(),
            storyline: NO_STORYLINE.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str) -> MovieSummary {
        MovieSummary {
            id: id.to_string(),
            title: title.to_string(),
            detail_url: format!("https://www.imdb.com/title/{}/", id),
        }
    }

    #[tokio::test]
    async fn test_mock_lister_returns_movies_in_order() {
        let lister = MockMovieLister::new()
            .with_movie(summary("tt1", "First"))
            .with_movie(summary("tt2", "Second"));

        let movies = lister.list_top_movies().await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "Second");
        assert_eq!(lister.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_lister_failure() {
        let lister = MockMovieLister::new().with_failure("blocked");
        assert!(matches!(
            lister.list_top_movies().await,
            Err(Error::Scrape(message)) if message == "blocked"
        ));
    }

    #[tokio::test]
    async fn test_mock_fetcher_unknown_id_has_no_storyline() {
        let fetcher = MockMovieDetailFetcher::new();
        let detail = fetcher.fetch_detail(&summary("tt9", "Unknown")).await.unwrap();

        assert_eq!(detail.title, "Unknown");
        assert!(!detail.has_storyline());
        assert_eq!(fetcher.get_fetched_ids(), vec!["tt9"]);
    }
}
