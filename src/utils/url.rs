//! URL helpers
//!
//! Reference resolution for the URL root, which may be a bare path
//! (`/rattic/`) or an absolute URL (`https://host/rattic/`)

use ::url::{ParseError, Url};

/// Anchor used to resolve path-only roots; never appears in output
const PATH_ANCHOR: &str = "http://ratticweb.invalid/";

/// Resolve `reference` against `base` per RFC 3986
///
/// Absolute bases keep their scheme and host. Path-only bases return a path
/// (plus query and fragment when present).
pub fn urljoin(base: &str, reference: &str) -> Result<String, ParseError> {
    if let Ok(absolute) = Url::parse(base) {
        return Ok(absolute.join(reference)?.to_string());
    }

    let resolved = Url::parse(PATH_ANCHOR)?.join(base)?.join(reference)?;

    let mut joined = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        joined.push('?');
        joined.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        joined.push('#');
        joined.push_str(fragment);
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_root_path() {
        assert_eq!(urljoin("/", "media/").unwrap(), "/media/");
        assert_eq!(urljoin("/", "cred/list/").unwrap(), "/cred/list/");
    }

    #[test]
    fn test_join_nested_root() {
        assert_eq!(urljoin("/rattic/", "static/").unwrap(), "/rattic/static/");
        // Without the trailing slash the last segment is replaced
        assert_eq!(urljoin("/rattic", "static/").unwrap(), "/static/");
    }

    #[test]
    fn test_join_absolute_root() {
        assert_eq!(
            urljoin("https://vault.example.com/rattic/", "account/login-error/").unwrap(),
            "https://vault.example.com/rattic/account/login-error/"
        );
    }

    #[test]
    fn test_join_absolute_reference() {
        assert_eq!(urljoin("/rattic/", "/media/").unwrap(), "/media/");
    }
}
