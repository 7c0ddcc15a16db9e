use std::collections::BTreeMap;
use std::sync::LazyLock;

use handlebars::Handlebars;

use super::TemplateError;

/// Shared registry. Non-strict, so a placeholder without a value renders
/// as an empty string; `{{key}}` output is HTML-escaped.
static REGISTRY: LazyLock<Handlebars<'static>> = LazyLock::new(Handlebars::new);

/// Fill every `{{key}}` in `html` with its HTML-escaped value.
/// Placeholders without a value are removed.
pub fn render(
    html: &str,
    values: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    REGISTRY
        .render_template(html, values)
        .map_err(|e| TemplateError::Render(e.to_string()))
}
