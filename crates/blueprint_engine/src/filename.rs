use std::fmt::Write;

use sha2::{Digest, Sha256};

const MAX_STEM_CHARS: usize = 80;

/// Deterministic, Windows-safe export name: `{title}--{hash(key)}.{extension}`.
///
/// The same `key` always yields the same hash, so re-exporting a result for
/// the same project or idea overwrites the earlier file.
pub fn export_filename(title: &str, key: &str, extension: &str) -> String {
    let stem = sanitize_stem(title);
    let hash = short_hash(key);
    format!("{stem}--{hash}.{extension}")
}

fn sanitize_stem(input: &str) -> String {
    let mut stem = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if is_forbidden(c) || c.is_whitespace() {
            pending_dash = !stem.is_empty();
            continue;
        }
        if pending_dash {
            stem.push('-');
            pending_dash = false;
        }
        stem.push(c);
    }

    let mut stem: String = stem
        .trim_end_matches('.')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    if stem.is_empty() {
        stem.push_str("untitled");
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &["CON", "PRN", "AUX", "NUL"];
    if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return true;
    }
    let upper = name.to_ascii_uppercase();
    ["COM", "LPT"].iter().any(|prefix| {
        upper
            .strip_prefix(prefix)
            .is_some_and(|digit| digit.len() == 1 && matches!(digit.as_bytes()[0], b'1'..=b'9'))
    })
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).fold(String::with_capacity(8), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_characters_and_spaces_collapse_to_dashes() {
        let name = export_filename("My: Project?/Bad  name", "https://devpost.com/software/x", "json");
        assert!(name.starts_with("My-Project-Bad-name--"), "{name}");
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn hash_depends_only_on_key() {
        let a = export_filename("One", "key", "md");
        let b = export_filename("One", "key", "md");
        let c = export_filename("One", "other", "md");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), "One--".len() + 8 + ".md".len());
    }

    #[test]
    fn reserved_and_empty_names_are_patched() {
        assert!(export_filename("com3", "k", "md").starts_with("com3_--"));
        assert!(export_filename("COM10", "k", "md").starts_with("COM10--"));
        assert!(export_filename(" ?? ", "k", "md").starts_with("untitled--"));
    }

    #[test]
    fn long_multibyte_titles_truncate_on_char_boundary() {
        let title = "é".repeat(200);
        let name = export_filename(&title, "k", "md");
        let stem = name.split("--").next().unwrap();
        assert_eq!(stem.chars().count(), MAX_STEM_CHARS);
    }
}
