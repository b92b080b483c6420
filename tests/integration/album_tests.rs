//! End-to-end tests for the album pipeline
//!
//! A wiremock server plays the gallery site: album pages, picture pages with
//! their reload control, and the image host. Delays are recorded instead of
//! slept, and the RNG is seeded.

use album_ripper::config::Config;
use album_ripper::download::RecordingSleeper;
use album_ripper::pipeline::run_with;
use album_ripper::progress::{category, RecordingReporter};
use album_ripper::RipperError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALBUM_PATH: &str = "/g/1/abc/";

/// Picture key of image `image` (1-based) on album page `page` (0-based)
fn picture_key(page: usize, image: usize) -> String {
    format!("p{}i{}", page, image)
}

fn album_page_html(page: usize, pages: usize, images: usize) -> String {
    let mut html = String::from(r#"<html><head><title>Fallback</title></head><body>"#);
    html.push_str(r#"<h1 id="gn">Test Album</h1>"#);
    for index in 0..pages {
        html.push_str(&format!(r#"<a href="{}?p={}">{}</a>"#, ALBUM_PATH, index, index + 1));
    }
    for image in 1..=images {
        html.push_str(&format!(
            r#"<a href="/s/{}/1-{}">thumb</a>"#,
            picture_key(page, image),
            image
        ));
    }
    html.push_str(&format!(r#"<a href="/g/{}/other/">related</a>"#, page + 2));
    html.push_str("</body></html>");
    html
}

fn picture_page_html(base: &str, key: &str) -> String {
    format!(
        r##"<html><body>
            <img id="img" src="{}/h/{}.jpg">
            <a id="loadfail" href="#" onclick="return nl('4242-1717')">Reload broken image</a>
        </body></html>"##,
        base, key
    )
}

/// Mounts an album of `pages` pages with `images` pictures each
///
/// Every album page must be requested exactly once. Images listed in
/// `broken` always answer 500.
async fn mount_album(server: &MockServer, pages: usize, images: usize, broken: &[String]) {
    for page in (1..pages).rev() {
        Mock::given(method("GET"))
            .and(path(ALBUM_PATH))
            .and(query_param("p", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(album_page_html(page, pages, images)),
            )
            .expect(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(ALBUM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(album_page_html(0, pages, images)))
        .expect(1)
        .mount(server)
        .await;

    for page in 0..pages {
        for image in 1..=images {
            let key = picture_key(page, image);
            Mock::given(method("GET"))
                .and(path(format!("/s/{}/1-{}", key, image)))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(picture_page_html(&server.uri(), &key)),
                )
                .mount(server)
                .await;

            let response = if broken.contains(&key) {
                ResponseTemplate::new(500)
            } else {
                ResponseTemplate::new(200).set_body_bytes(format!("jpeg:{}", key).into_bytes())
            };
            Mock::given(method("GET"))
                .and(path(format!("/h/{}.jpg", key)))
                .respond_with(response)
                .mount(server)
                .await;
        }
    }
}

struct Run {
    dir: TempDir,
    config: Config,
    reporter: Arc<RecordingReporter>,
    sleeper: Arc<RecordingSleeper>,
}

impl Run {
    fn new(urls: &[String]) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.download_root = dir.path().join("Downloads").display().to_string();
        config.paths.urls_file = dir.path().join("URLs.txt").display().to_string();
        config.paths.session_log = dir.path().join("session_log.txt").display().to_string();
        config.http.page_timeout_secs = 5;
        config.http.download_timeout_secs = 5;
        std::fs::write(&config.paths.urls_file, urls.join("\n")).unwrap();

        Self {
            dir,
            config,
            reporter: Arc::new(RecordingReporter::new()),
            sleeper: Arc::new(RecordingSleeper::new()),
        }
    }

    async fn execute(&self) -> album_ripper::Result<album_ripper::RunSummary> {
        run_with(
            self.config.clone(),
            self.reporter.clone(),
            self.sleeper.clone(),
            StdRng::seed_from_u64(99),
        )
        .await
    }

    fn album_dir(&self) -> PathBuf {
        self.dir.path().join("Downloads").join("Test Album")
    }

    fn session_log(&self) -> String {
        std::fs::read_to_string(&self.config.paths.session_log).unwrap()
    }

    fn url_list(&self) -> String {
        std::fs::read_to_string(&self.config.paths.urls_file).unwrap()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_two_page_album_downloads_every_image() {
    let server = MockServer::start().await;
    mount_album(&server, 2, 3, &[]).await;

    let run = Run::new(&[format!("{}{}", server.uri(), ALBUM_PATH)]);
    let summary = run.execute().await.unwrap();

    assert_eq!(summary.albums, 1);
    assert_eq!(summary.downloaded, 6);
    assert!(summary.failed.is_empty());

    let files = files_in(&run.album_dir());
    assert_eq!(
        files,
        vec!["p0i1.jpg", "p0i2.jpg", "p0i3.jpg", "p1i1.jpg", "p1i2.jpg", "p1i3.jpg"]
    );
    assert_eq!(
        std::fs::read(run.album_dir().join("p1i2.jpg")).unwrap(),
        b"jpeg:p1i2"
    );
    assert_eq!(run.session_log(), "");

    let overall = run.reporter.overall_tasks();
    assert_eq!(overall.len(), 1);
    assert_eq!(overall[0].description, "Test Album");
    assert_eq!((overall[0].completed, overall[0].total), (2, 2));

    let pages = run.reporter.page_tasks();
    assert_eq!(pages.len(), 2);
    for (index, page) in pages.iter().enumerate() {
        assert_eq!(page.parent, Some(index));
        assert_eq!((page.completed, page.total), (3, 3));
    }

    // One pause between the two pages, two between the images of each page
    assert_eq!(run.reporter.count(category::PREPARING_TO_RESUME), 1);
    assert_eq!(run.sleeper.durations().len(), 5);
    assert_eq!(run.reporter.count(category::FAILED_DOWNLOADS), 0);
    assert!(run.reporter.is_stopped());
    assert_eq!(run.url_list(), "");
}

#[tokio::test]
async fn test_failed_image_is_logged_and_run_continues() {
    let server = MockServer::start().await;
    let broken = picture_key(0, 4);
    mount_album(&server, 1, 6, std::slice::from_ref(&broken)).await;

    let run = Run::new(&[format!("{}{}", server.uri(), ALBUM_PATH)]);
    let summary = run.execute().await.unwrap();

    assert_eq!(summary.downloaded, 5);
    assert_eq!(files_in(&run.album_dir()).len(), 5);

    let broken_url = format!("{}/h/{}.jpg", server.uri(), broken);
    assert_eq!(summary.failed, vec![broken_url.clone()]);
    assert_eq!(run.session_log(), format!("{}\n", broken_url));

    assert_eq!(run.reporter.count(category::FAILED_DOWNLOADS), 1);
    assert_eq!(run.reporter.count(category::FAILED_DOWNLOAD), 1);
    assert_eq!(run.reporter.count(category::RETRYING), 4);
    assert_eq!(run.reporter.count(category::FETCH_FAILED), 1);

    let image_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == format!("/h/{}.jpg", broken))
        .count();
    assert_eq!(image_requests, 5);

    let page = &run.reporter.page_tasks()[0];
    assert_eq!((page.completed, page.total), (5, 6));
}

#[tokio::test]
async fn test_rate_limited_image_cools_down_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/h/{}.jpg", picture_key(0, 2))))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_album(&server, 1, 2, &[]).await;

    let run = Run::new(&[format!("{}{}", server.uri(), ALBUM_PATH)]);
    let summary = run.execute().await.unwrap();

    assert_eq!(summary.downloaded, 2);
    assert_eq!(run.reporter.count(category::RATE_LIMIT), 1);
    assert_eq!(run.reporter.count(category::RETRYING), 0);
    assert_eq!(run.sleeper.count_of(Duration::from_secs(60)), 1);
}

#[tokio::test]
async fn test_empty_url_list_resets_session_log() {
    let run = Run::new(&[]);
    std::fs::write(&run.config.paths.session_log, "https://old.example/h/1.jpg\n").unwrap();

    let summary = run.execute().await.unwrap();

    assert_eq!(summary.albums, 0);
    assert_eq!(run.session_log(), "");
    assert!(run.reporter.tasks().is_empty());
}

#[tokio::test]
async fn test_missing_reload_control_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/p0i1/1-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<html><body>Removed</body></html>"#),
        )
        .mount(&server)
        .await;
    mount_album(&server, 1, 1, &[]).await;

    let album_url = format!("{}{}", server.uri(), ALBUM_PATH);
    let run = Run::new(std::slice::from_ref(&album_url));
    let result = run.execute().await;

    assert!(matches!(result, Err(RipperError::Layout { .. })));
    assert!(run.reporter.is_stopped());
    // The list is kept for the next attempt
    assert_eq!(run.url_list(), album_url);
}
