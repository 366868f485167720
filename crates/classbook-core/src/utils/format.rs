/// Turn a field key into a column label: "class_name" becomes "Class name".
/// A trailing "_id" is dropped, so "studio_id" becomes "Studio".
pub fn humanize(key: &str) -> String {
    let key = key.strip_suffix("_id").unwrap_or(key);
    let spaced = key.replace('_', " ");
    let trimmed = spaced.trim().to_lowercase();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Mask a secret for display, one `*` per character up to `max_len`.
pub fn mask(secret: &str, max_len: usize) -> String {
    "*".repeat(secret.chars().count().min(max_len))
}
