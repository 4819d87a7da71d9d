//! Merge-on-update: patch fields override stored ones only when present and
//! not blank.

/// The patch value, if it should replace the stored one.
#[must_use]
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn overlay(current: &mut String, patch: Option<String>) {
    if let Some(value) = present(patch) {
        *current = value;
    }
}

pub fn overlay_opt(current: &mut Option<String>, patch: Option<String>) {
    if let Some(value) = present(patch) {
        *current = Some(value);
    }
}
