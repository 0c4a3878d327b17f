use crate::error::ExtractError;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do with an `<img>` that has no `src` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSrcPolicy {
    /// Fail the whole extraction
    #[default]
    Abort,
    /// Skip the element and keep going
    Skip,
}

/// Collect the `src` value of every `<img>` in document order.
///
/// The markup is parsed leniently, so unclosed tags and bad nesting are
/// tolerated. Values are returned verbatim (after entity decoding) and may
/// repeat.
pub fn extract_image_sources(
    html: &str,
    policy: MissingSrcPolicy,
) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);
    let img_selector =
        Selector::parse("img").map_err(|e| ExtractError::Selector(e.to_string()))?;

    let mut sources = Vec::new();
    for (index, element) in document.select(&img_selector).enumerate() {
        match element.value().attr("src") {
            Some(src) => {
                debug!("Found image source: {}", src);
                sources.push(src.to_string());
            }
            None => match policy {
                MissingSrcPolicy::Abort => {
                    return Err(ExtractError::MissingAttribute {
                        tag: "img",
                        attribute: "src",
                        index,
                    });
                }
                MissingSrcPolicy::Skip => {
                    warn!("Skipping <img> #{} without a src attribute", index);
                }
            },
        }
    }

    Ok(sources)
}
