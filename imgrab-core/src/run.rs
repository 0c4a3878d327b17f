use crate::config::RunConfig;
use imgrab_scanner::error::Result;
use imgrab_scanner::{
    DownloadResult, DownloadSummary, Downloader, Fetcher, MissingSrcPolicy, extract_image_sources,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Options for configuring a run
pub struct RunOptions {
    pub config: RunConfig,
    pub show_progress_bars: bool,
}

/// Callback for operator-facing status lines
pub type RunProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for each download outcome as it happens
pub type RunResultCallback = Arc<dyn Fn(&DownloadResult) + Send + Sync>;

/// Output format for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub page: String,
    pub destination: PathBuf,
    pub images_found: usize,
    pub summary: DownloadSummary,
}

/// The console line for one download outcome
pub fn outcome_line(result: &DownloadResult) -> String {
    if result.is_success() {
        format!("{} downloaded successfully.", result.display_url())
    } else {
        format!("Failed to download file: {}", result.display_url())
    }
}

/// Fetch the page, extract its image sources and download them all.
///
/// Page fetch and extraction failures end the run. Individual download
/// failures are only reported.
pub async fn execute_run(
    options: RunOptions,
    progress_callback: Option<RunProgressCallback>,
    result_callback: Option<RunResultCallback>,
) -> Result<RunReport> {
    let RunOptions {
        config,
        show_progress_bars,
    } = options;
    let page_url = config.page.url();

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Fetching {}", page_url));
        Some(pb)
    } else {
        None
    };
    // Print above the spinner instead of through it
    let emit = {
        let pb = progress_bar.clone();
        move |msg: String| {
            if let Some(ref callback) = progress_callback {
                match pb {
                    Some(ref pb) => pb.suspend(|| callback(msg)),
                    None => callback(msg),
                }
            }
        }
    };

    let fetcher = Fetcher::with_timeout(config.timeout_secs)?;

    let sources = match fetch_image_sources(&fetcher, page_url, config.missing_src).await {
        Ok(sources) => sources,
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.finish_and_clear();
            }
            return Err(e);
        }
    };
    info!("Found {} image references on {}", sources.len(), page_url);

    emit(format!(
        "Downloading {} images from: {}",
        sources.len(),
        page_url
    ));

    let mut downloader = Downloader::new(fetcher);

    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        downloader = downloader.with_progress_callback(Arc::new(
            move |idx: usize, total: usize, source: &str| {
                pb_clone.set_message(format!("[{}/{}] {}", idx + 1, total, source));
            },
        ));
    }

    if let Some(ref cb) = result_callback {
        let cb_clone = cb.clone();
        let pb_clone = progress_bar.clone();
        downloader = downloader.with_result_callback(Arc::new(move |result: &DownloadResult| {
            match pb_clone {
                Some(ref pb) => pb.suspend(|| cb_clone(result)),
                None => cb_clone(result),
            }
        }));
    }

    let summary = downloader
        .download_all(&sources, page_url, config.destination.path())
        .await;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    Ok(RunReport {
        page: page_url.to_string(),
        destination: config.destination.path().to_path_buf(),
        images_found: sources.len(),
        summary,
    })
}

async fn fetch_image_sources(
    fetcher: &Fetcher,
    page_url: &Url,
    policy: MissingSrcPolicy,
) -> Result<Vec<String>> {
    let html = fetcher.fetch_page(page_url).await?;
    Ok(extract_image_sources(&html, policy)?)
}

/// Render the end-of-run report
pub fn render_report(report: &RunReport, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => generate_run_report(report),
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize report: {}\"}}", e)),
    }
}

/// Generate a plain-text summary of a run
pub fn generate_run_report(report: &RunReport) -> String {
    let summary = &report.summary;

    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Page: {}\n", report.page));
    out.push_str(&format!("  Destination: {}\n", report.destination.display()));
    out.push_str(&format!("  Images found: {}\n", report.images_found));
    out.push_str(&format!("  Downloaded: {}\n", summary.succeeded));
    out.push_str(&format!("  Failed: {}\n", summary.failed));

    if summary.failed > 0 {
        out.push_str("\n## Failures\n");
        for result in summary.failures() {
            let kind = result.error_kind.map(|k| k.as_str()).unwrap_or("unknown");
            out.push_str(&format!(
                "  [{}] {} - {}\n",
                kind,
                result.display_url(),
                result.error.as_deref().unwrap_or("")
            ));
        }
    }

    out
}
