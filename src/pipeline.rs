//! Pipeline driver: processes every album in the URL list, one at a time

use crate::config::Config;
use crate::download::{AlbumDownloader, AlbumReport, DownloadContext, Sleeper, TokioSleeper};
use crate::progress::ProgressReporter;
use crate::{Result, RipperError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;

/// Totals of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub albums: usize,
    pub downloaded: usize,
    pub failed: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, report: AlbumReport) {
        self.albums += 1;
        self.downloaded += report.downloaded;
        self.failed.extend(report.failed);
    }
}

/// Reads album URLs, one per line; blank lines are skipped
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|source| RipperError::UrlList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Truncates the URL list
pub fn clear_url_list(path: &Path) -> Result<()> {
    std::fs::write(path, "").map_err(|source| RipperError::UrlList {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the whole pipeline with real delays and an entropy-seeded RNG
pub async fn run(config: Config, reporter: Arc<dyn ProgressReporter>) -> Result<RunSummary> {
    run_with(config, reporter, Arc::new(TokioSleeper), StdRng::from_entropy()).await
}

/// Runs the whole pipeline with the given sleeper and random source
///
/// The session log is reset first. Albums are processed sequentially and
/// the first structural error ends the run. The reporter is stopped in
/// every case; the URL list is cleared only after a successful run.
pub async fn run_with(
    config: Config,
    reporter: Arc<dyn ProgressReporter>,
    sleeper: Arc<dyn Sleeper>,
    mut rng: StdRng,
) -> Result<RunSummary> {
    let config = Arc::new(config);
    let ctx = DownloadContext::new(Arc::clone(&config), Arc::clone(&reporter), sleeper)?;
    let urls_file = Path::new(&config.paths.urls_file);

    let result = process_url_list(&ctx, urls_file, &mut rng).await;

    reporter.stop();
    let summary = result?;

    if config.paths.clear_urls_on_success {
        clear_url_list(urls_file)?;
    }

    tracing::info!(
        "Run complete: {} album(s), {} image(s) downloaded, {} failed",
        summary.albums,
        summary.downloaded,
        summary.failed.len()
    );
    Ok(summary)
}

async fn process_url_list(
    ctx: &DownloadContext,
    urls_file: &Path,
    rng: &mut StdRng,
) -> Result<RunSummary> {
    ctx.session_log.reset()?;
    let urls = read_url_list(urls_file)?;
    tracing::info!("{} album(s) to download", urls.len());

    let mut summary = RunSummary::default();

    for url in &urls {
        tracing::info!("Processing album {}", url);
        let mut downloader = AlbumDownloader::new(url, ctx).await?;
        let report = downloader.download_album(rng).await?;
        summary.record(report);
    }

    Ok(summary)
}
