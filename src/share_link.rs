//! Memoized share URL resolution.

use tracing::error;

use crate::cache::TtlCache;
use crate::error::Result;
use crate::models::ShareCode;
use crate::url_parser::extract_share_code;

/// Signature of a share URL parser.
pub type ShareUrlParser = fn(&str) -> Result<ShareCode>;

/// Parses share URLs once per exact URL string.
///
/// Share codes never change once issued, so successful parses are kept for
/// the life of the resolver. Failures are not cached.
pub struct ShareLinkResolver {
    parser: ShareUrlParser,
    cache: TtlCache<String, ShareCode>,
}

impl Default for ShareLinkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareLinkResolver {
    pub fn new() -> Self {
        Self::with_parser(extract_share_code)
    }

    pub fn with_parser(parser: ShareUrlParser) -> Self {
        Self {
            parser,
            cache: TtlCache::unbounded(),
        }
    }

    /// `None` when the URL cannot be parsed.
    pub fn resolve(&self, url: &str) -> Option<ShareCode> {
        if let Some(code) = self.cache.get(url) {
            return Some(code);
        }

        match (self.parser)(url) {
            Ok(code) => {
                self.cache.set(url.to_string(), code.clone());
                Some(code)
            }
            Err(e) => {
                error!("Failed to parse share link: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
