use std::process::Command;
use url::Url;

/// Give protocol-relative urls an https scheme.
pub fn https(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Trim and collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve an href found on a site page against the site root.
/// Blank hrefs resolve to `None`.
pub fn fix_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("//") {
        return Some(https(href));
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Text between the first and last `-`, trimmed.
///
/// Episode list entries read like `"Title - Episode 12 - Sub"`. Without a
/// dash the whole text is kept.
pub fn between_dashes(text: &str) -> String {
    let after_first = text.split_once('-').map(|(_, rest)| rest).unwrap_or(text);
    let before_last = after_first.rsplit_once('-').map(|(head, _)| head).unwrap_or(after_first);
    before_last.trim().to_string()
}

pub fn is_program_installed(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https() {
        assert_eq!(https("//cdn.test/a"), "https://cdn.test/a");
        assert_eq!(https("http://cdn.test/a"), "http://cdn.test/a");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("\n   English\n\t 1080p\n"), "English 1080p");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_fix_url() {
        let base = Url::parse("https://animexin.dev").unwrap();
        assert_eq!(fix_url(&base, "/anime/foo/").as_deref(), Some("https://animexin.dev/anime/foo/"));
        assert_eq!(fix_url(&base, "https://img.test/p.jpg").as_deref(), Some("https://img.test/p.jpg"));
        assert_eq!(fix_url(&base, "//img.test/p.jpg").as_deref(), Some("https://img.test/p.jpg"));
        assert_eq!(fix_url(&base, "  "), None);
    }

    #[test]
    fn test_between_dashes() {
        assert_eq!(between_dashes("Soul Land - Episode 12 - Sub"), "Episode 12");
        assert_eq!(between_dashes("A - B - C - D"), "B - C");
        assert_eq!(between_dashes("Only - one"), "one");
        assert_eq!(between_dashes("Episode 3"), "Episode 3");
    }
}
