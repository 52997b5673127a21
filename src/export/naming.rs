// Export filename templating

use crate::events::SampleType;

/// Values available to a naming pattern
#[derive(Debug, Clone, Copy)]
pub struct NamingContext<'a> {
    pub name: &'a str,
    pub sample_type: SampleType,
    /// 1-based position in the export batch
    pub index: usize,
    /// Seconds
    pub duration: f64,
}

/// Keep word characters, whitespace and hyphens
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect()
}

/// Substitute `{name}`, `{type}`, `{index}` and `{duration}` into `pattern`
///
/// Whitespace runs become a single underscore and repeated underscores are
/// collapsed. Only the name is stripped of special characters.
pub fn apply_naming_pattern(pattern: &str, ctx: &NamingContext<'_>) -> String {
    let substituted = pattern
        .replace("{name}", &sanitize_name(ctx.name))
        .replace("{type}", ctx.sample_type.as_str())
        .replace("{index}", &ctx.index.to_string())
        .replace("{duration}", &format!("{:.2}", ctx.duration));

    let mut out = String::with_capacity(substituted.len());
    for c in substituted.chars() {
        let c = if c.is_whitespace() { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}
