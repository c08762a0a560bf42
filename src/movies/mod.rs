//! Movie metadata sources
//!
//! A lister yields the ranked top-movie list and a detail fetcher turns one
//! entry into a full [`MovieDetail`]. The IMDb implementations scrape HTML.

pub mod imdb;
pub mod mock;

pub use imdb::{ImdbDetailFetcher, ImdbLister};
pub use mock::{MockMovieDetailFetcher, MockMovieLister};

use crate::models::{MovieDetail, MovieSummary};
use crate::Result;
use async_trait::async_trait;

/// Upper bound on the number of movies offered for selection.
pub const TOP_MOVIES_LIMIT: usize = 10;

#[async_trait]
pub trait MovieLister: Send + Sync {
    /// Most acclaimed first, deduplicated by title, at most [`TOP_MOVIES_LIMIT`].
    async fn list_top_movies(&self) -> Result<Vec<MovieSummary>>;
}

#[async_trait]
pub trait MovieDetailFetcher: Send + Sync {
    async fn fetch_detail(&self, movie: &MovieSummary) -> Result<MovieDetail>;
}
