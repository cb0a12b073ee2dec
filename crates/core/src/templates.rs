//! Placeholder substitution for configurable email templates.

use std::sync::LazyLock;

use regex::Regex;

/// Pattern matching `{placeholder}` tokens in an email template. Keys may
/// contain spaces, matching the long-standing template vocabulary
/// (`{enrolment token}`, `{ACTIVATION_LINK}`, ...).
pub const TEMPLATE_PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z][A-Za-z0-9_ ]*)\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TEMPLATE_PLACEHOLDER_PATTERN).expect("valid regex"));

/// Substitute `{placeholder}` tokens in an email template.
///
/// Unknown placeholders are left in place so a misconfigured template stays
/// visibly wrong instead of silently losing text.
pub fn render_template(template: &str, args: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            match args.iter().find(|(name, _)| *name == key) {
                Some((_, value)) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}
