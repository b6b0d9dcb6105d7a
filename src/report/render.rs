use std::fmt::Write;

use crate::models::display_name;

use super::digest::Digest;

/// Render the digest as markdown, one section per non-empty week.
pub fn render_markdown(digest: &Digest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} 半导体产业周报", digest.year);
    let _ = writeln!(out, "\n共 {} 条摘要", digest.total);

    for week in &digest.weeks {
        let _ = writeln!(out, "\n## {} {}", week.badge, week.label);
        let _ = writeln!(out);
        for item in &week.items {
            let _ = writeln!(
                out,
                "- [{}] {} ({}) <{}>",
                display_name(&item.category),
                item.summary,
                item.date,
                item.url
            );
        }
    }

    out
}
