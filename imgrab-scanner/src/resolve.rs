use url::Url;

/// Resolve an image reference against the page it was found on.
///
/// Absolute references come back unchanged; scheme-relative, path-relative,
/// query-only and fragment-only references inherit from `base`.
pub fn resolve(base: &Url, reference: &str) -> Result<Url, url::ParseError> {
    base.join(reference)
}

/// The part of a raw image reference after its final `/`.
///
/// Query strings are kept, so `a/b.png?x=1` gives `b.png?x=1`.
pub fn basename(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// A basename can be used as a file name inside the destination directory.
pub fn is_usable_file_name(name: &str) -> bool {
    !(name.is_empty() || name == "." || name == ".." || name.contains('\\'))
}
