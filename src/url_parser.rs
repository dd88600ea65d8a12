//! URL parser for extracting share and receive codes from share links.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, ShareError};
use crate::models::ShareCode;

/// Share link, optionally carrying the receive code as a `-xxxx` suffix.
static SHARE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:www\.)?(?:115|115cdn|anxia)\.com/s/([a-zA-Z0-9]+)(?:-([a-zA-Z0-9]{4}))?",
    )
    .expect("Invalid share URL regex")
});

/// Receive code given as a query parameter or after a label in the surrounding text.
static RECEIVE_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:password=|pwd=|访问码[:：]?\s*|提取码[:：]?\s*)([a-zA-Z0-9]{4})")
        .expect("Invalid receive code regex")
});

/// Extract the share code and receive code from a share link.
///
/// Supports the following formats, anywhere inside the input text:
/// - `https://115.com/s/<code>?password=<rc>`
/// - `https://115cdn.com/s/<code>?password=<rc>#`
/// - `https://anxia.com/s/<code>-<rc>`
/// - a link followed by `访问码：<rc>` or `提取码：<rc>`
///
/// A link without any receive code yields an empty `receive_code`.
///
/// # Examples
///
/// ```
/// use share_transfer::url_parser::extract_share_code;
///
/// let code = extract_share_code("https://115.com/s/sw3abc?password=x1y2").unwrap();
/// assert_eq!(code.share_code, "sw3abc");
/// assert_eq!(code.receive_code, "x1y2");
/// ```
pub fn extract_share_code(url: &str) -> Result<ShareCode> {
    let trimmed = url.trim();

    let captures = SHARE_URL_REGEX
        .captures(trimmed)
        .ok_or_else(|| ShareError::InvalidShareUrl(url.to_string()))?;

    let share_code = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ShareError::InvalidShareUrl(url.to_string()))?;

    // Suffix form first, then any labelled code after the link itself
    let receive_code = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            let rest = &trimmed[captures.get(0).map_or(0, |m| m.end())..];
            RECEIVE_CODE_REGEX
                .captures(rest)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_default();

    Ok(ShareCode {
        share_code,
        receive_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_password_query() {
        let code = extract_share_code("https://115.com/s/sw3abc123?password=ab12").unwrap();
        assert_eq!(code, ShareCode::new("sw3abc123", "ab12"));
    }

    #[test]
    fn test_extract_cdn_host_with_fragment() {
        let code = extract_share_code("https://115cdn.com/s/swzq9x?password=k9k9#").unwrap();
        assert_eq!(code, ShareCode::new("swzq9x", "k9k9"));
    }

    #[test]
    fn test_extract_suffix_form() {
        let code = extract_share_code("https://anxia.com/s/sw3abc-zz11").unwrap();
        assert_eq!(code, ShareCode::new("sw3abc", "zz11"));
    }

    #[test]
    fn test_extract_labelled_receive_code() {
        let text = "链接：https://115.com/s/sw3abc 访问码：qw12 复制后打开";
        let code = extract_share_code(text).unwrap();
        assert_eq!(code, ShareCode::new("sw3abc", "qw12"));
    }

    #[test]
    fn test_missing_receive_code() {
        let code = extract_share_code("https://115.com/s/sw3abc").unwrap();
        assert_eq!(code.share_code, "sw3abc");
        assert!(code.receive_code.is_empty());
        assert!(!code.is_complete());
    }

    #[test]
    fn test_invalid_url() {
        assert!(extract_share_code("https://example.com/s/sw3abc").is_err());
        assert!(extract_share_code("").is_err());
        assert!(extract_share_code("   ").is_err());
    }
}
