use thiserror::Error;

/// The signed URL carries no parseable expiry, so it cannot be trusted for
/// window planning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no parseable Expires= timestamp in signed URL")]
pub struct MalformedUrl;

/// Extract the `Expires=<unix seconds>` field embedded in a signed URL.
///
/// Returns the value of the first `Expires=` occurrence that is followed by
/// at least one digit. Total over arbitrary input: a URL without such a
/// field, or with a value too large for `i64`, is `MalformedUrl`.
pub fn extract_expiry(url: &str) -> Result<i64, MalformedUrl> {
    let mut rest = url;
    while let Some(idx) = rest.find("Expires=") {
        let after = &rest[idx + "Expires=".len()..];
        let end = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        if end > 0 {
            return after[..end].parse().map_err(|_| MalformedUrl);
        }
        rest = after;
    }

    Err(MalformedUrl)
}
