//! URL handling for discovered links
//!
//! Links found on a page are normalized before they reach the frontier so
//! trivially different spellings of one page deduplicate in the pool.

mod normalize;

pub use normalize::normalize_url;

/// Normalizes a batch of links, dropping the ones that fail to normalize
pub fn normalize_links<'a, I>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    links
        .into_iter()
        .filter_map(|link| match normalize_url(link) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::debug!("Dropping link {}: {}", link, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_links_drops_bad_entries() {
        let links = vec![
            "https://example.com/a/#top".to_string(),
            "mailto:someone@example.com".to_string(),
            "https://example.com/b?utm_source=x".to_string(),
        ];
        assert_eq!(
            normalize_links(&links),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
