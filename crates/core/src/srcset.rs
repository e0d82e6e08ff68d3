//! `srcset` attribute parsing and serialization.
//!
//! Candidates are split the way browsers split them: the URL runs up to the
//! first whitespace and the descriptor up to the next comma. A URL that ends
//! in a comma has no descriptor.

/// One image candidate of a `srcset` list.
#[derive(Debug, Clone, PartialEq)]
pub struct SrcsetEntry {
    pub url: String,
    /// Density (`2x`), width (`640w`) or height (`480h`) descriptor, if any.
    /// Unrecognised descriptors are kept verbatim.
    pub descriptor: Option<String>,
}

impl SrcsetEntry {
    /// Numeric part of the descriptor and its unit.
    pub fn descriptor_value(&self) -> Option<(f64, char)> {
        let descriptor = self.descriptor.as_deref()?;
        let unit = descriptor.chars().last().filter(|c| matches!(c, 'x' | 'w' | 'h'))?;
        let value: f64 = descriptor[..descriptor.len() - 1].parse().ok()?;
        (value.is_finite() && value > 0.0).then_some((value, unit))
    }

    /// True when a descriptor is present but is not `Nx`, `Nw` or `Nh`.
    pub fn is_malformed(&self) -> bool {
        self.descriptor.is_some() && self.descriptor_value().is_none()
    }
}

/// Splits a `srcset` value into its candidates, in order.
pub fn parse_srcset(value: &str) -> Vec<SrcsetEntry> {
    let mut entries = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (url, after) = rest.split_at(url_end);
        if url.ends_with(',') {
            entries.push(SrcsetEntry { url: url.trim_end_matches(',').to_string(), descriptor: None });
            rest = after;
            continue;
        }

        let descriptor_end = after.find(',').unwrap_or(after.len());
        let descriptor = after[..descriptor_end].trim();
        entries.push(SrcsetEntry {
            url: url.to_string(),
            descriptor: (!descriptor.is_empty()).then(|| descriptor.to_string()),
        });
        rest = &after[descriptor_end..];
    }

    entries
}

/// Joins candidates back into a `srcset` value.
pub fn serialize_srcset(entries: &[SrcsetEntry]) -> String {
    entries
        .iter()
        .map(|entry| match &entry.descriptor {
            Some(descriptor) => format!("{} {}", entry.url, descriptor),
            None => entry.url.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Picks the candidate with the largest descriptor (first one on ties or
/// when no descriptors are present). Malformed candidates are never picked.
pub fn best_candidate(entries: &[SrcsetEntry]) -> Option<&SrcsetEntry> {
    let mut best: Option<(&SrcsetEntry, f64)> = None;
    for entry in entries.iter().filter(|entry| !entry.is_malformed()) {
        let weight = entry.descriptor_value().map(|(value, _)| value).unwrap_or(1.0);
        if best.is_none_or(|(_, max)| weight > max) {
            best = Some((entry, weight));
        }
    }
    best.map(|(entry, _)| entry)
}
