//! Role-name slugging shared by the skill-gap and clustering lookups.

/// Converts a role name to its URL slug: lower-case, drop anything outside
/// `[a-z0-9 -]`, collapse whitespace/hyphen runs to a single hyphen, trim
/// edge hyphens.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
        // every other character is dropped
    }

    slug
}
