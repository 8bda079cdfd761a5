//! Link labeling.
//!
//! Resolved links arrive named after whatever extractor produced them. This
//! rewrites the name from the originating option so users can tell mirrors
//! apart, and fills in a quality when the extractor could not tell.

use crate::extractor::{ExtractorLink, Quality};
use crate::source::CandidateSource;

pub const SEPARATOR: &str = " · ";

/// Extractor names too vague to be worth showing.
const GENERIC_NAMES: [&str; 5] = ["Dailymotion", "StreamSB", "StreamWish", "FileMoon", "Main"];

/// Case-insensitive equality, Unicode aware.
fn same_text(a: &str, b: &str) -> bool {
    a.chars().flat_map(char::to_lowercase).eq(b.chars().flat_map(char::to_lowercase))
}

fn is_generic(name: &str) -> bool {
    GENERIC_NAMES.iter().any(|g| same_text(g, name))
}

fn push_part(parts: &mut Vec<String>, value: Option<&str>) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    if parts.iter().any(|p| same_text(p, value)) {
        return;
    }
    parts.push(value.to_string());
}

/// Display name for a link resolved from `source`.
pub fn decorated_name(link_name: &str, source: &CandidateSource) -> String {
    let label = source.label.as_str();
    let host = Some(source.host.as_str()).filter(|h| !h.trim().is_empty());
    let language = source.language.display_name();

    let extractor = Some(link_name).filter(|name| {
        !is_generic(name)
            && !same_text(name, label)
            && !host.is_some_and(|h| same_text(h, name))
    });

    let mut parts = Vec::new();
    push_part(&mut parts, Some(label));
    push_part(&mut parts, extractor);
    push_part(&mut parts, host.filter(|h| !same_text(h, label)));
    push_part(
        &mut parts,
        Some(language).filter(|lang| !lang.is_empty() && !label.to_lowercase().contains(&lang.to_lowercase())),
    );

    if parts.is_empty() {
        link_name.to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

/// Known link qualities win; otherwise the option's label quality fills in.
pub fn resolved_quality(link: Quality, source: &CandidateSource) -> Quality {
    if link.is_known() {
        return link;
    }
    match source.quality {
        Some(height) => Quality::from_height(Some(height)),
        None => link,
    }
}

pub fn decorate(link: ExtractorLink, source: &CandidateSource) -> ExtractorLink {
    ExtractorLink {
        name: decorated_name(&link.name, source),
        quality: resolved_quality(link.quality, source),
        ..link
    }
}
