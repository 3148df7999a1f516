//! Template engine for outgoing e-mail using Jinja2 syntax.
//!
//! Templates live under `templates/emails/` and are compiled into the binary.
//! Names ending in `.html` are auto-escaped.

use minijinja::{Environment, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const EMAIL_TEMPLATES: &[(&str, &str)] = &[
    (
        "status_change.html",
        include_str!("../../../templates/emails/status_change.html.jinja"),
    ),
    (
        "status_change.txt",
        include_str!("../../../templates/emails/status_change.txt.jinja"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in EMAIL_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        } else {
            tracing::debug!("Loaded template: {}", name);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a template by name, e.g. `status_change.html`
pub fn render_template(template_name: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}
