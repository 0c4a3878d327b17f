use crate::error::DownloadError;
use crate::fetcher::Fetcher;
use crate::resolve::{basename, is_usable_file_name, resolve};
use crate::result::{DownloadResult, DownloadSummary};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

/// Called before each attempt with (index, total, raw source)
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;
/// Called after each attempt with its outcome
pub type ResultCallback = Arc<dyn Fn(&DownloadResult) + Send + Sync>;

/// Downloads image references one after another into a directory.
pub struct Downloader {
    fetcher: Fetcher,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Downloader {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            progress_callback: None,
            result_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Download every source in order. A failed item is reported and
    /// skipped; it never stops the batch.
    pub async fn download_all(&self, sources: &[String], base: &Url, dest: &Path) -> DownloadSummary {
        info!("Downloading {} images from {}", sources.len(), base);

        let mut summary = DownloadSummary::default();
        for (idx, source) in sources.iter().enumerate() {
            if let Some(ref callback) = self.progress_callback {
                callback(idx, sources.len(), source);
            }

            let result = self.download_one(source, base, dest).await;

            if let Some(ref callback) = self.result_callback {
                callback(&result);
            }
            summary.push(result);
        }

        info!(
            "Batch complete: {} downloaded, {} failed",
            summary.succeeded, summary.failed
        );
        summary
    }

    /// Resolve one reference against `base` and save it as
    /// `dest/<basename of source>`.
    pub async fn download_one(&self, source: &str, base: &Url, dest: &Path) -> DownloadResult {
        let resolved = match resolve(base, source) {
            Ok(url) => url,
            Err(e) => {
                let err = DownloadError::Resolve {
                    reference: source.to_string(),
                    source: e,
                };
                debug!(kind = err.kind().as_str(), "{}", err);
                return DownloadResult::with_error(source.to_string(), None, &err);
            }
        };

        match self.save(source, &resolved, dest).await {
            Ok((path, bytes_written)) => {
                debug!("Saved {} ({} bytes) to {}", resolved, bytes_written, path.display());
                DownloadResult::succeeded(source.to_string(), resolved.to_string(), path, bytes_written)
            }
            Err(err) => {
                debug!(kind = err.kind().as_str(), url = %resolved, "{}", err);
                DownloadResult::with_error(source.to_string(), Some(resolved.to_string()), &err)
            }
        }
    }

    async fn save(&self, source: &str, url: &Url, dest: &Path) -> Result<(PathBuf, u64), DownloadError> {
        let name = basename(source);
        if !is_usable_file_name(name) {
            return Err(DownloadError::FileName(source.to_string()));
        }
        let target = dest.join(name);

        let response = self
            .fetcher
            .client()
            .get(url.clone())
            .send()
            .await
            .map_err(DownloadError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(DownloadError::Body)?;
        write_atomically(&target, &bytes)?;

        Ok((target, bytes.len() as u64))
    }
}

/// Write through a temp file in the same directory, then rename over
/// `target`. The temp file is removed on any failure.
fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let write_error = |source: std::io::Error| DownloadError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.persist(target).map_err(|e| write_error(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownloadErrorKind;
    use std::fs;
    use std::sync::Mutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image body";

    async fn mount_image(server: &MockServer, image_path: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(image_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(body),
            )
            .mount(server)
            .await;
    }

    fn page_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/page.html", server.uri())).unwrap()
    }

    fn downloader() -> Downloader {
        Downloader::new(Fetcher::new().unwrap())
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_relative_source_is_resolved_against_page() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/pic.png", PNG_BYTES).await;
        let dest = tempfile::tempdir().unwrap();

        let summary = downloader()
            .download_all(&["pic.png".to_string()], &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(summary.succeeded, 1);
        let result = &summary.results[0];
        assert_eq!(
            result.resolved_url.as_deref(),
            Some(format!("{}/pic.png", mock_server.uri()).as_str())
        );
        assert_eq!(fs::read(dest.path().join("pic.png")).unwrap(), PNG_BYTES);
        assert_eq!(result.bytes_written, PNG_BYTES.len() as u64);
    }

    #[tokio::test]
    async fn test_relative_and_absolute_sources() {
        let page_server = MockServer::start().await;
        let other_server = MockServer::start().await;
        mount_image(&page_server, "/a.jpg", b"from page host").await;
        mount_image(&other_server, "/b.jpg", b"from other host").await;
        let dest = tempfile::tempdir().unwrap();

        let absolute = format!("{}/b.jpg", other_server.uri());
        let sources = vec!["a.jpg".to_string(), absolute.clone()];
        let summary = downloader()
            .download_all(&sources, &page_url(&page_server), dest.path())
            .await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(
            summary.results[0].resolved_url.as_deref(),
            Some(format!("{}/a.jpg", page_server.uri()).as_str())
        );
        assert_eq!(summary.results[1].resolved_url.as_deref(), Some(absolute.as_str()));
        assert_eq!(fs::read(dest.path().join("a.jpg")).unwrap(), b"from page host");
        assert_eq!(fs::read(dest.path().join("b.jpg")).unwrap(), b"from other host");
    }

    #[tokio::test]
    async fn test_failed_item_is_skipped_without_leftovers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;
        mount_image(&mock_server, "/ok.png", PNG_BYTES).await;
        let dest = tempfile::tempdir().unwrap();

        let sources = vec!["missing.png".to_string(), "ok.png".to_string()];
        let summary = downloader()
            .download_all(&sources, &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results[0].error_kind, Some(DownloadErrorKind::Status));
        assert!(!dest.path().join("missing.png").exists());
        assert_eq!(dir_entries(dest.path()), vec!["ok.png"]);
    }

    #[tokio::test]
    async fn test_same_basename_overwrites() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/one/logo.png", b"first").await;
        mount_image(&mock_server, "/two/logo.png", b"second").await;
        let dest = tempfile::tempdir().unwrap();

        let sources = vec!["/one/logo.png".to_string(), "/two/logo.png".to_string()];
        let summary = downloader()
            .download_all(&sources, &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(fs::read(dest.path().join("logo.png")).unwrap(), b"second");
        assert_eq!(dir_entries(dest.path()), vec!["logo.png"]);
    }

    #[tokio::test]
    async fn test_duplicate_sources_each_attempted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dup.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
            .expect(2)
            .mount(&mock_server)
            .await;
        let dest = tempfile::tempdir().unwrap();

        let sources = vec!["dup.png".to_string(), "dup.png".to_string()];
        let summary = downloader()
            .download_all(&sources, &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.succeeded, 2);
    }

    #[tokio::test]
    async fn test_unusable_file_name() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
            .expect(0)
            .mount(&mock_server)
            .await;
        let dest = tempfile::tempdir().unwrap();

        let result = downloader()
            .download_one("images/", &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(result.error_kind, Some(DownloadErrorKind::FileName));
        assert!(dir_entries(dest.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_source() {
        let mock_server = MockServer::start().await;
        let dest = tempfile::tempdir().unwrap();

        let result = downloader()
            .download_one("http://[::1/x.png", &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(result.error_kind, Some(DownloadErrorKind::Resolve));
        assert_eq!(result.resolved_url, None);
        assert_eq!(result.display_url(), "http://[::1/x.png");
    }

    #[tokio::test]
    async fn test_missing_destination_is_write_error() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/pic.png", PNG_BYTES).await;
        let dest = tempfile::tempdir().unwrap();
        let gone = dest.path().join("not-created");

        let result = downloader()
            .download_one("pic.png", &page_url(&mock_server), &gone)
            .await;

        assert_eq!(result.error_kind, Some(DownloadErrorKind::Write));
        assert!(!gone.exists());
    }

    #[tokio::test]
    async fn test_callbacks_fire_in_order() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/a.png", PNG_BYTES).await;
        mount_image(&mock_server, "/b.png", PNG_BYTES).await;
        let dest = tempfile::tempdir().unwrap();

        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let progress_events = events.clone();
        let result_events = events.clone();

        let downloader = downloader()
            .with_progress_callback(Arc::new(move |idx: usize, total: usize, source: &str| {
                progress_events
                    .lock()
                    .unwrap()
                    .push(format!("start {}/{} {}", idx + 1, total, source));
            }))
            .with_result_callback(Arc::new(move |result: &DownloadResult| {
                result_events
                    .lock()
                    .unwrap()
                    .push(format!("done {} {}", result.source, result.is_success()));
            }));

        let sources = vec!["a.png".to_string(), "b.png".to_string()];
        downloader
            .download_all(&sources, &page_url(&mock_server), dest.path())
            .await;

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "start 1/2 a.png",
                "done a.png true",
                "start 2/2 b.png",
                "done b.png true",
            ]
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_item_failures_stay_below_warn_level() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        let dest = tempfile::tempdir().unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let sources = vec!["gone.png".to_string(), "a\\b".to_string()];
        let summary = downloader()
            .download_all(&sources, &page_url(&mock_server), dest.path())
            .await;

        // Failures reach the operator through the result callback only
        assert_eq!(summary.failed, 2);
        assert!(logs.0.lock().unwrap().is_empty());
    }
}
