//! Per-album orchestration
//!
//! For every album page: picture pages are extracted from its anchors,
//! resolved to reloaded links, and each link's image is fetched and written
//! to the album directory. Pages and images are processed strictly in order.

use super::headers::HeaderFactory;
use super::pause::{random_pause, Sleeper};
use super::retry::{build_download_client, RetryPolicy, RetryingFetcher};
use crate::config::Config;
use crate::crawler::{extract_picture_pages, Crawler, ElementQuery, PageDocument, PageFetcher};
use crate::progress::{category, ProgressReporter};
use crate::storage::{
    create_download_directory, image_filename, unique_filename, write_stream, SessionLog,
    SinkError,
};
use crate::{Result, RipperError};
use rand::Rng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared collaborators of one run
///
/// Built once per run and borrowed by every [`AlbumDownloader`].
pub struct DownloadContext {
    pub config: Arc<Config>,
    pub pages: PageFetcher,
    pub images: RetryingFetcher,
    pub headers: HeaderFactory,
    pub reporter: Arc<dyn ProgressReporter>,
    pub sleeper: Arc<dyn Sleeper>,
    pub session_log: SessionLog,
}

impl DownloadContext {
    pub fn new(
        config: Arc<Config>,
        reporter: Arc<dyn ProgressReporter>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let pages = PageFetcher::new(config.http.page_timeout())?;
        let images = RetryingFetcher::new(
            build_download_client(config.http.download_timeout())?,
            RetryPolicy::from(&config.retry),
            Arc::clone(&reporter),
            Arc::clone(&sleeper),
        );

        Ok(Self {
            headers: HeaderFactory::new(&config.http.referer),
            session_log: SessionLog::new(&config.paths.session_log),
            pages,
            images,
            reporter,
            sleeper,
            config,
        })
    }
}

/// Outcome of one album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumReport {
    pub album_name: String,
    pub directory: PathBuf,
    pub pages: usize,
    pub downloaded: usize,
    /// Image URLs that could not be downloaded, in processing order
    pub failed: Vec<String>,
}

/// Results of one album page
#[derive(Debug, Default)]
struct PageOutcome {
    downloaded: usize,
    failed: Vec<String>,
}

/// Downloads a single album
pub struct AlbumDownloader<'a> {
    ctx: &'a DownloadContext,
    crawler: Crawler,
    album_name: String,
    download_path: PathBuf,
    used_names: HashSet<String>,
}

impl<'a> AlbumDownloader<'a> {
    /// Fetches the album root, derives its name and creates its directory
    pub async fn new(url: &str, ctx: &'a DownloadContext) -> Result<Self> {
        let root = ctx.pages.fetch(url).await?;
        let crawler = Crawler::new(root, ctx.pages.clone(), Arc::clone(&ctx.reporter));
        let album_name = crawler.album_name()?;
        let download_path =
            create_download_directory(Path::new(&ctx.config.paths.download_root), &album_name)?;
        tracing::info!("Album '{}' -> {}", album_name, download_path.display());

        Ok(Self {
            ctx,
            crawler,
            album_name,
            download_path,
            used_names: HashSet::new(),
        })
    }

    pub fn album_name(&self) -> &str {
        &self.album_name
    }

    pub fn download_path(&self) -> &Path {
        &self.download_path
    }

    /// Downloads every image of every album page
    ///
    /// Per-image failures are recorded in the session log and the report;
    /// only structural errors end the album early.
    pub async fn download_album<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<AlbumReport> {
        let pages = self.crawler.collect_album_pages().await?;
        let num_pages = pages.len();
        let reporter = Arc::clone(&self.ctx.reporter);
        let overall = reporter.add_overall_task(&self.album_name, num_pages as u64);

        let mut report = AlbumReport {
            album_name: self.album_name.clone(),
            directory: self.download_path.clone(),
            pages: num_pages,
            downloaded: 0,
            failed: Vec::new(),
        };

        for (current, page) in pages.iter().enumerate() {
            let reloaded = self.reloaded_links(page).await?;
            let outcome = self.download_page(&reloaded, current, rng).await?;

            if !outcome.failed.is_empty() {
                reporter.update_log(
                    category::FAILED_DOWNLOADS,
                    &format!(
                        "Failed downloads for page {}. Check the log file.",
                        current + 1
                    ),
                );
            }
            report.downloaded += outcome.downloaded;
            report.failed.extend(outcome.failed);
            reporter.update_task(overall, 1);

            if current + 1 < num_pages {
                reporter.update_log(
                    category::PREPARING_TO_RESUME,
                    "Pausing before resuming the download...",
                );
                let pacing = &self.ctx.config.pacing;
                let pause =
                    random_pause(rng, pacing.page_pause_min_secs, pacing.page_pause_max_secs);
                self.ctx.sleeper.sleep(pause).await;
            }
        }

        tracing::info!(
            "Album '{}': {} downloaded, {} failed",
            report.album_name,
            report.downloaded,
            report.failed.len()
        );
        Ok(report)
    }

    /// Picture pages linked from `page`, resolved and reloaded
    async fn reloaded_links(&self, page: &PageDocument) -> Result<Vec<String>> {
        let anchors = page.find_all(&ElementQuery::tag("a").with_attr("href"))?;
        let picture_pages: Vec<String> = extract_picture_pages(&anchors)
            .iter()
            .filter_map(|href| page.resolve(href))
            .map(String::from)
            .collect();

        tracing::debug!(
            "{} picture page(s) on {}",
            picture_pages.len(),
            page.url()
        );
        self.crawler.get_reloaded_pages(&picture_pages).await
    }

    async fn download_page<R: Rng + ?Sized>(
        &mut self,
        reloaded: &[String],
        current: usize,
        rng: &mut R,
    ) -> Result<PageOutcome> {
        let task = self
            .ctx
            .reporter
            .add_task(current, reloaded.len() as u64);
        let mut outcome = PageOutcome::default();

        for (index, reloaded_page) in reloaded.iter().enumerate() {
            if index > 0 {
                let pacing = &self.ctx.config.pacing;
                let pause =
                    random_pause(rng, pacing.image_pause_min_secs, pacing.image_pause_max_secs);
                self.ctx.sleeper.sleep(pause).await;
            }

            let document = self.ctx.pages.fetch(reloaded_page).await?;
            let image_url = direct_image_url(&document)?;
            let headers = self.ctx.headers.headers(&image_url, rng);

            let Some(response) = self
                .ctx
                .images
                .fetch_with_retries(image_url.as_str(), &headers, rng)
                .await
            else {
                self.record_failure(image_url.as_str(), &mut outcome)?;
                continue;
            };

            let fallback = format!("image-{}-{}", current + 1, index + 1);
            let filename =
                unique_filename(&image_filename(&image_url, &fallback), &mut self.used_names);
            let path = self.download_path.join(&filename);

            match write_stream(response.bytes_stream(), &path, self.ctx.config.http.chunk_size)
                .await
            {
                Ok(bytes) => {
                    tracing::debug!("Saved {} ({} bytes)", path.display(), bytes);
                    outcome.downloaded += 1;
                    self.ctx.reporter.update_task(task, 1);
                }
                Err(SinkError::Body(e)) => {
                    tracing::warn!("Transfer of {} interrupted: {}", image_url, e);
                    self.record_failure(image_url.as_str(), &mut outcome)?;
                }
                Err(SinkError::Io(source)) => {
                    tracing::error!("Error writing {}: {}", path.display(), source);
                    return Err(RipperError::Write { path, source });
                }
            }
        }

        Ok(outcome)
    }

    fn record_failure(&self, url: &str, outcome: &mut PageOutcome) -> Result<()> {
        self.ctx.reporter.update_log(
            category::FAILED_DOWNLOAD,
            &format!("Could not download {}, check the log file", url),
        );
        self.ctx.session_log.append(url)?;
        outcome.failed.push(url.to_string());
        Ok(())
    }
}

/// The full-resolution image URL of a reloaded picture page
fn direct_image_url(document: &PageDocument) -> Result<url::Url> {
    let layout_error = |message: &str| RipperError::Layout {
        url: document.url().to_string(),
        message: message.to_string(),
    };

    let image = document
        .find_first(&ElementQuery::tag("img").with_attr_eq("id", "img").with_attr("src"))?
        .ok_or_else(|| layout_error("image element not found"))?;

    image
        .attr("src")
        .and_then(|src| document.resolve(src))
        .ok_or_else(|| layout_error("image source is not a usable URL"))
}
