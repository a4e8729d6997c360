//! Collision-free file naming
//!
//! Names are kept unique within a session by appending `_N` to the stem of a
//! clashing name, probing N = 1, 2, ... until a free name is found.

use std::collections::HashSet;

/// Return `candidate` unchanged if it is free, otherwise the first free
/// `stem_N.ext` probe.
pub fn normalize_name(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }

    let (stem, extension) = split_extension(candidate);
    let mut counter = 1u64;
    loop {
        let probe = format!("{stem}_{counter}{extension}");
        if !taken.contains(&probe) {
            return probe;
        }
        counter += 1;
    }
}

/// Assign names to a whole batch, in order.
///
/// Every assigned name is added to `taken` before the next one is resolved,
/// so duplicates inside the batch are resolved as well.
pub fn normalize_batch<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    taken: &mut HashSet<String>,
) -> Vec<String> {
    candidates
        .into_iter()
        .map(|candidate| {
            let name = normalize_name(candidate, taken);
            taken.insert(name.clone());
            name
        })
        .collect()
}

/// Split `name` into stem and extension (the extension keeps its dot).
///
/// Only the last `.xxx` suffix counts, so `.env` is all extension and an
/// empty stem. A trailing dot (`notes.`) does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() && !name[idx + 1..].contains('/') => {
            name.split_at(idx)
        }
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_last_suffix_only() {
        assert_eq!(split_extension("photo.png"), ("photo", ".png"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("readme"), ("readme", ""));
        assert_eq!(split_extension(".env"), ("", ".env"));
        assert_eq!(split_extension("dir.v1/file"), ("dir.v1/file", ""));
        assert_eq!(split_extension("notes."), ("notes.", ""));
    }
}
