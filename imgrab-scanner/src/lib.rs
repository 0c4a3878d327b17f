pub mod downloader;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod resolve;
pub mod result;

pub use downloader::{Downloader, ProgressCallback, ResultCallback};
pub use error::{DownloadError, DownloadErrorKind, ExtractError, FetchError, ScanError};
pub use extract::{MissingSrcPolicy, extract_image_sources};
pub use fetcher::{DEFAULT_TIMEOUT_SECS, Fetcher};
pub use resolve::{basename, resolve};
pub use result::{DownloadResult, DownloadSummary};
