use super::{MovieDetailFetcher, MovieLister, TOP_MOVIES_LIMIT};
use crate::models::{MovieDetail, MovieSummary, NO_STORYLINE};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

const CAST_LIMIT: usize = 10;
const UNKNOWN_RATING: &str = "Unknown";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Scrape(format!("Invalid selector '{}': {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed, non-empty texts of every match, in document order.
fn all_texts(document: &Html, css: &str) -> Result<Vec<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect())
}

/// First non-empty text matched by any of `candidates`, tried in order.
fn first_text(document: &Html, candidates: &[&str]) -> Result<Option<String>> {
    for css in candidates {
        if let Some(text) = all_texts(document, css)?.into_iter().next() {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    debug!("Fetching {}", url);
    let response = client
        .get(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(ACCEPT_LANGUAGE, BROWSER_ACCEPT_LANGUAGE)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Scrape(format!("HTTP {} from {}", status, url)));
    }

    Ok(response.text().await?)
}

/// Drop a leading `"12. "` style rank from a chart entry.
fn strip_rank_prefix(title: &str) -> &str {
    let rest = title.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == title.len() {
        return title;
    }
    match rest.strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => title,
    }
}

/// The `tt1234567` id of a `/title/tt1234567/...` link.
fn title_id(href: &str) -> Option<String> {
    let digits: String = href
        .strip_prefix("/title/tt")?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("tt{}", digits))
    }
}

/// Extract the ranked movie list from a chart page.
///
/// Markup without any title links yields an empty list.
pub fn parse_top_movies(html: &str, base_url: &str) -> Result<Vec<MovieSummary>> {
    let document = Html::parse_document(html);
    let links = selector("a[href]")?;
    let base_url = base_url.trim_end_matches('/');

    let mut movies: Vec<MovieSummary> = Vec::new();
    for link in document.select(&links) {
        if movies.len() >= TOP_MOVIES_LIMIT {
            break;
        }

        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(id) = title_id(href) else {
            continue;
        };

        let text = element_text(link);
        if text.chars().count() <= 1 {
            continue;
        }
        let title = strip_rank_prefix(&text);
        if title.is_empty() || movies.iter().any(|movie| movie.title == title) {
            continue;
        }

        movies.push(MovieSummary {
            id,
            title: title.to_string(),
            detail_url: format!("{}{}", base_url, href),
        });
    }

    Ok(movies)
}

/// Text of the first credit linked from the metadata row labelled `label`.
fn credit_for_label(document: &Html, label: &str) -> Result<Option<String>> {
    let rows = selector("li.ipc-metadata-list__item")?;
    let labels = selector(".ipc-metadata-list-item__label")?;
    let credits = selector("a.ipc-metadata-list-item__list-content-item")?;

    for row in document.select(&rows) {
        let labelled = row.select(&labels).map(element_text).any(|text| {
            text == label || text.strip_suffix('s').is_some_and(|singular| singular == label)
        });
        if !labelled {
            continue;
        }
        if let Some(credit) = row.select(&credits).map(element_text).find(|t| !t.is_empty()) {
            return Ok(Some(credit));
        }
    }
    Ok(None)
}

/// Texts of the links under the title: release year first, then the certificate.
fn hero_metadata(document: &Html) -> Result<Vec<String>> {
    for css in [
        "div.sc-bf57f3f2-0 a.ipc-link",
        r#"[data-testid="hero-title-block__metadata"] a"#,
    ] {
        let texts = all_texts(document, css)?;
        if !texts.is_empty() {
            return Ok(texts);
        }
    }
    Ok(Vec::new())
}

/// Absolute poster viewer link, resolved against the title page.
fn poster_url(document: &Html, page_url: &str) -> Result<Option<String>> {
    let overlay = selector("a.ipc-lockup-overlay")?;
    let Some(href) = document
        .select(&overlay)
        .find_map(|link| link.value().attr("href"))
    else {
        return Ok(None);
    };

    Ok(Url::parse(page_url)
        .and_then(|base| base.join(href))
        .ok()
        .map(|mut url| {
            url.set_query(None);
            url.to_string()
        }))
}

fn without_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Build a [`MovieDetail`] from a title page.
pub fn parse_detail(html: &str, movie: &MovieSummary) -> Result<MovieDetail> {
    let document = Html::parse_document(html);

    let metadata = hero_metadata(&document)?;
    let year = metadata.first().cloned().unwrap_or_default();
    let parental_guide = metadata.get(1).cloned().unwrap_or_default();
    let poster_url = poster_url(&document, &movie.detail_url)?;

    let rating = first_text(
        &document,
        &[
            r#"[data-testid="hero-rating-bar__aggregate-rating__score"] span"#,
            "span.sc-d541859f-1",
        ],
    )?
    .unwrap_or_else(|| UNKNOWN_RATING.to_string());

    let genres = all_texts(&document, "div.ipc-chip-list a.ipc-chip")?;
    let director = credit_for_label(&document, "Director")?.unwrap_or_default();

    let mut cast = all_texts(&document, r#"a[data-testid="title-cast-item__actor"]"#)?;
    cast.truncate(CAST_LIMIT);

    let mut characters = all_texts(&document, r#"a[data-testid="cast-item-characters-link"] span"#)?;
    if characters.is_empty() {
        characters = all_texts(&document, "li.ipc-inline-list__item span.sc-cd7dc4b7-4")?;
    }

    let storyline = first_text(
        &document,
        &[
            r#"[data-testid="plot-xl"]"#,
            r#"[data-testid="plot-l"]"#,
            r#"[data-testid="plot"] span"#,
        ],
    )?
    .unwrap_or_else(|| {
        warn!("No storyline found for '{}'", movie.title);
        NO_STORYLINE.to_string()
    });

    Ok(MovieDetail {
        id: movie.id.clone(),
        title: movie.title.clone(),
        url: without_query(&movie.detail_url).to_string(),
        poster_url,
        year,
        parental_guide,
        rating,
        genres,
        director,
        cast,
        characters,
        storyline,
    })
}

/// Top-movie list scraped from the IMDb chart page.
pub struct ImdbLister {
    client: Client,
    chart_url: String,
    base_url: String,
}

impl ImdbLister {
    pub fn new(chart_url: String, base_url: String) -> Self {
        Self::new_with_client(chart_url, base_url, Client::new())
    }

    pub fn new_with_client(chart_url: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            chart_url,
            base_url,
        }
    }
}

#[async_trait]
impl MovieLister for ImdbLister {
    async fn list_top_movies(&self) -> Result<Vec<MovieSummary>> {
        let html = fetch_html(&self.client, &self.chart_url).await?;
        let movies = parse_top_movies(&html, &self.base_url)?;

        if movies.is_empty() {
            warn!("No movies found on {}", self.chart_url);
        } else {
            info!("Loaded {} top movies", movies.len());
        }
        Ok(movies)
    }
}

/// Title details scraped from a movie's IMDb page.
pub struct ImdbDetailFetcher {
    client: Client,
}

impl ImdbDetailFetcher {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ImdbDetailFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MovieDetailFetcher for ImdbDetailFetcher {
    async fn fetch_detail(&self, movie: &MovieSummary) -> Result<MovieDetail> {
        info!("Fetching details for '{}'", movie.title);
        let html = fetch_html(&self.client, &movie.detail_url).await?;
        parse_detail(&html, movie)
    }
}
