//! Search pipeline over real downloads and grid rendering against a local server.

mod common;

use mockito::Server;
use std::sync::Arc;
use std::time::Duration;

use common::{png, FixedLabelJudge};
use picsearch::adapters::http::HttpContentFetcher;
use picsearch::adapters::mock::MockCandidateSource;
use picsearch::adapters::render::{GridCompositeRenderer, GridLayout};
use picsearch::domain::errors::PicSearchError;
use picsearch::domain::models::Resolution;
use picsearch::services::{
    PicSearchService, ResultFinalizer, RoundExecutorConfig, TournamentEngine,
};

fn service(urls: Vec<String>, judge: Arc<FixedLabelJudge>) -> PicSearchService {
    let fetcher = Arc::new(HttpContentFetcher::new(Duration::from_secs(5)).unwrap());
    let renderer = Arc::new(GridCompositeRenderer::new(
        fetcher.clone(),
        GridLayout::new(32, 4),
    ));
    let engine = TournamentEngine::new(renderer, judge, 4, RoundExecutorConfig::default())
        .unwrap();
    PicSearchService::new(
        Arc::new(MockCandidateSource::new(urls)),
        engine,
        ResultFinalizer::new(fetcher),
    )
}

#[tokio::test]
async fn test_search_renders_judges_and_delivers() {
    let mut server = Server::new_async().await;
    let red = png([255, 0, 0], 40);
    let blue = png([0, 0, 255], 24);

    let _red = server
        .mock("GET", "/red.png")
        .with_header("content-type", "image/png")
        .with_body(&red)
        .create_async()
        .await;
    let _blue = server
        .mock("GET", "/blue.png")
        .with_header("content-type", "image/png")
        .with_body(&blue)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/broken.png")
        .with_status(404)
        .create_async()
        .await;
    let _text = server
        .mock("GET", "/page.html")
        .with_header("content-type", "text/html")
        .with_body("<html></html>")
        .create_async()
        .await;

    let urls = ["broken.png", "page.html", "blue.png", "red.png"]
        .iter()
        .map(|p| format!("{}/{p}", server.url()))
        .collect();
    // Label 2 is red: the broken and non-image entries never get a tile.
    let judge = Arc::new(FixedLabelJudge::new(vec![2]));
    let report = service(urls, judge.clone())
        .search("primary colors", "a red square", 10)
        .await
        .unwrap();

    assert_eq!(report.candidates, 4);
    assert!(report.outcome.winner.as_str().ends_with("/red.png"));
    assert_eq!(report.outcome.resolution, Resolution::Judged);
    assert_eq!(report.content.bytes, red);
    assert_eq!(report.content.content_type.as_deref(), Some("image/png"));
    assert_eq!(judge.seen(), vec![(128, 32)]);
}

#[tokio::test]
async fn test_search_with_nothing_downloadable() {
    let mut server = Server::new_async().await;
    let _gone = server
        .mock("GET", mockito::Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let urls = (0..3).map(|i| format!("{}/{i}.png", server.url())).collect();
    let judge = Arc::new(FixedLabelJudge::new(vec![1]));
    let err = service(urls, judge.clone())
        .search("anything", "anything", 3)
        .await
        .unwrap_err();

    assert!(matches!(err, PicSearchError::Tournament(_)));
    assert!(judge.seen().is_empty());
}
