/// Turn a free-text name or email into a comparison key.
///
/// The result may be empty; callers must never index or match on an empty key.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
