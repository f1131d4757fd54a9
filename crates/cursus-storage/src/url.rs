//! Provider URL shapes and id resolution.
//!
//! Domain records embed the remote object as a plain URL string, so the id
//! has to be recoverable from the URL's textual shape alone. Two shapes are
//! in circulation: the canonical view URL returned by the provider and an
//! older constructed download URL.

const PROVIDER_HOST: &str = "https://drive.google.com";

/// Canonical viewable URL for an object id.
pub fn view_url(object_id: &str) -> String {
    format!("{}/file/d/{}/view", PROVIDER_HOST, object_id)
}

/// Constructed fallback URL (legacy records).
pub fn download_url(object_id: &str) -> String {
    format!("{}/uc?id={}&export=download", PROVIDER_HOST, object_id)
}

/// Whether a URL belongs to the provider at all. Records may also carry
/// externally hosted URLs that the pipeline must leave alone.
pub fn is_provider_url(url: &str) -> bool {
    url.starts_with(PROVIDER_HOST)
}

/// Extract the object id embedded in a provider URL, handling both the
/// canonical `/file/d/{id}/view` shape and the `uc?id={id}` fallback.
pub fn object_id_from_url(url: &str) -> Option<String> {
    if !is_provider_url(url) {
        return None;
    }

    if let Some(rest) = url.split("/file/d/").nth(1) {
        let id: &str = rest.split('/').next().unwrap_or("");
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }

    if let Some(query) = url.split('?').nth(1) {
        for pair in query.split('&') {
            if let Some(id) = pair.strip_prefix("id=") {
                if !id.is_empty() {
                    return Some(id.to_string());
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_view_url() {
        let url = view_url("1AbC-xyz_9");
        assert_eq!(object_id_from_url(&url), Some("1AbC-xyz_9".to_string()));
    }

    #[test]
    fn resolves_fallback_download_url() {
        let url = download_url("1AbC-xyz_9");
        assert_eq!(object_id_from_url(&url), Some("1AbC-xyz_9".to_string()));
    }

    #[test]
    fn resolves_fallback_url_with_reordered_params() {
        let url = "https://drive.google.com/uc?export=download&id=xyz42";
        assert_eq!(object_id_from_url(url), Some("xyz42".to_string()));
    }

    #[test]
    fn foreign_urls_are_not_provider_urls() {
        assert!(!is_provider_url("https://example.com/file/d/abc/view"));
        assert_eq!(object_id_from_url("https://example.com/file/d/abc/view"), None);
    }

    #[test]
    fn malformed_provider_urls_yield_no_id() {
        assert_eq!(object_id_from_url("https://drive.google.com/file/d//view"), None);
        assert_eq!(object_id_from_url("https://drive.google.com/uc?export=download"), None);
    }
}
