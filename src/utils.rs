/// Convert a place name into a string safe for file names
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, capped at 60 characters.
pub fn sanitize_place(place: &str) -> String {
    place
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(60)
        .collect()
}
