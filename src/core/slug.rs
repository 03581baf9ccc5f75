//! URL slugs for CMS records.

/// Derive a URL-safe slug from a video title.
///
/// Symbols are stripped first, then words of three characters or fewer are
/// dropped, so digits survive but short words like "the" or "#12" do not.
/// The result may be empty.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let joined = cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    let trimmed = joined.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());

    let mut slug = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}
