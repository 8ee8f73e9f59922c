//! Reference resolution against a session base URL.

use url::Url;

/// Resolves `reference` against an optional base URL.
///
/// Absolute references pass through untouched. Relative references are
/// joined as `<base without trailing separators>/<reference>`; with no
/// base configured the reference is returned unchanged.
pub fn resolve(base: Option<&str>, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_owned();
    }
    match base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), reference),
        None => reference.to_owned(),
    }
}

fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Directory of a URL, used as the fallback base when none was
/// configured but the playlist itself came from the network.
/// `https://cdn.example.com/live/x/index.m3u8` yields
/// `https://cdn.example.com/live/x/`.
pub fn parent_base(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let directory = parsed.join(".").ok()?;
    Some(directory.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://cdn.example.com/stream", "seg-1.ts", "http://cdn.example.com/stream/seg-1.ts")]
    #[case("http://cdn.example.com/stream/", "seg-1.ts", "http://cdn.example.com/stream/seg-1.ts")]
    #[case("http://cdn.example.com/stream//", "seg-1.ts", "http://cdn.example.com/stream/seg-1.ts")]
    #[case("http://cdn.example.com", "hd/seg-1.ts", "http://cdn.example.com/hd/seg-1.ts")]
    fn joins_relative_references(
        #[case] base: &str,
        #[case] reference: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(resolve(Some(base), reference), expected);
    }

    #[rstest]
    #[case("http://other.example.com/direct.ts")]
    #[case("https://other.example.com/direct.ts")]
    fn absolute_references_pass_through(#[case] reference: &str) {
        assert_eq!(resolve(Some("http://cdn.example.com"), reference), reference);
    }

    #[test]
    fn no_base_leaves_relative_references_unchanged() {
        assert_eq!(resolve(None, "seg-1.ts"), "seg-1.ts");
    }

    #[test]
    fn resolution_is_idempotent_on_absolute_uris() {
        let base = Some("http://cdn.example.com/stream");
        let once = resolve(base, "seg-1.ts");
        assert_eq!(resolve(base, &once), once);
    }

    #[rstest]
    #[case("https://cdn.example.com/live/x/index.m3u8", "https://cdn.example.com/live/x/")]
    #[case("https://cdn.example.com/index.m3u8?token=abc", "https://cdn.example.com/")]
    #[case("https://cdn.example.com", "https://cdn.example.com/")]
    fn parent_base_strips_the_document_segment(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(parent_base(url).as_deref(), Some(expected));
    }

    #[test]
    fn parent_base_rejects_non_urls() {
        assert!(parent_base("not a url").is_none());
    }
}
