//! Prompt Loader
//!
//! Loads templates from the override directory or falls back to embedded defaults,
//! and renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Loads and renders templates
pub struct PromptLoader {
    /// Handlebars template engine (no HTML escaping: output is markdown or plain text)
    hbs: Handlebars<'static>,
    /// User override directory (`planning.prompts-dir`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers `{user_dir}/{name}.hbs` over the embedded templates
    ///
    /// A directory that does not exist is ignored.
    pub fn new(user_dir: Option<impl AsRef<Path>>) -> Self {
        let user_dir = user_dir.map(|d| d.as_ref().to_path_buf()).filter(|d| d.is_dir());
        debug!(?user_dir, "PromptLoader::new: called");
        Self {
            hbs: engine(),
            user_dir,
        }
    }

    /// Create a loader that only uses embedded templates
    pub fn embedded_only() -> Self {
        Self {
            hbs: engine(),
            user_dir: None,
        }
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{prompts-dir}/{name}.hbs`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.hbs", name));
            if path.exists() {
                debug!("Loading template from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user template {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(|content| {
                debug!("Using embedded template: {}", name);
                content.to_string()
            })
            .ok_or_else(|| eyre!("Template not found: {}", name))
    }

    /// Render a template, honoring user overrides
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "render: called");
        let template = self.load_template(template_name)?;
        self.render_source(template_name, &template, context)
    }

    /// Render an embedded template, ignoring user overrides
    pub fn render_embedded<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "render_embedded: called");
        let template =
            embedded::get_embedded(template_name).ok_or_else(|| eyre!("Template not found: {}", template_name))?;
        self.render_source(template_name, template, context)
    }

    fn render_source<T: Serialize>(&self, template_name: &str, template: &str, context: &T) -> Result<String> {
        self.hbs
            .render_template(template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_render_embedded_user_prompt() {
        let loader = PromptLoader::embedded_only();
        let rendered = loader
            .render("decompose-user", &json!({"title": "Plan <the> trip & pack"}))
            .unwrap();
        // no HTML escaping
        assert_eq!(rendered, "Please break down this task: Plan <the> trip & pack");
    }

    #[test]
    fn test_override_wins_for_render() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("decompose-user.hbs"), "Split up: {{title}}").unwrap();

        let loader = PromptLoader::new(Some(temp.path()));
        let rendered = loader.render("decompose-user", &json!({"title": "laundry"})).unwrap();
        assert_eq!(rendered, "Split up: laundry");
    }

    #[test]
    fn test_render_embedded_ignores_override() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("daily-empty.hbs"), "overridden").unwrap();

        let loader = PromptLoader::new(Some(temp.path()));
        let rendered = loader.render_embedded("daily-empty", &json!({"day": "2024-03-09"})).unwrap();
        assert!(rendered.contains("2024-03-09"));
        assert!(!rendered.contains("overridden"));
    }

    #[test]
    fn test_missing_dir_is_ignored() {
        let loader = PromptLoader::new(Some("/definitely/not/a/real/dir"));
        assert!(loader.user_dir.is_none());
        assert!(loader.render("decompose-user", &json!({"title": "x"})).is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
        assert!(loader.render_embedded("nonexistent-template", &json!({})).is_err());
    }

    #[test]
    fn test_broken_override_fails_to_render() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("decompose-system.hbs"), "{{#if}} unclosed").unwrap();

        let loader = PromptLoader::new(Some(temp.path()));
        assert!(loader.render("decompose-system", &json!({})).is_err());
    }
}
