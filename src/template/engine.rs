//! Templating engine capability.
//!
//! The compiler and renderer only need two things from an engine: turn a set
//! of named sources into one executable artifact, and execute that artifact
//! against [`TemplateData`]. [`TeraEngine`] is the implementation used by the
//! server; pages compose with layouts through `{% extends %}` and
//! `{% block %}`.

use std::error::Error as StdError;

use tera::{Context, ErrorKind, Tera};
use thiserror::Error;

use super::data::TemplateData;
use super::types::TemplateSource;

/// Failure reported by an engine, optionally attributed to one source
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Name of the offending source, when the engine can tell
    pub template: Option<String>,
    pub message: String,
}

impl EngineError {
    pub fn new(template: Option<String>, message: impl Into<String>) -> Self {
        Self {
            template,
            message: message.into(),
        }
    }
}

pub trait TemplateEngine: Send + Sync + 'static {
    type Compiled: Send + Sync + 'static;

    /// Compile `sources` into one artifact whose entry point is `root`
    fn compile(&self, root: &str, sources: &[TemplateSource])
        -> Result<Self::Compiled, EngineError>;

    /// Execute the artifact's `root` template, appending output to `out`
    fn execute(
        &self,
        compiled: &Self::Compiled,
        root: &str,
        data: &TemplateData,
        out: &mut Vec<u8>,
    ) -> Result<(), EngineError>;
}

/// [`TemplateEngine`] backed by Tera
#[derive(Debug, Clone)]
pub struct TeraEngine {
    autoescape: Vec<&'static str>,
}

impl Default for TeraEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TeraEngine {
    /// Escapes HTML in `.tmpl` and `.html` sources
    pub fn new() -> Self {
        Self {
            autoescape: vec![".tmpl", ".html"],
        }
    }

    /// Parse a single source on its own so errors name the right file.
    /// A missing parent is fine here; parents are resolved once every source
    /// is loaded together.
    fn check_source(&self, source: &TemplateSource) -> Result<(), EngineError> {
        let mut scratch = Tera::default();
        match scratch.add_raw_template(&source.name, &source.content) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind, ErrorKind::MissingParent { .. }) => Ok(()),
            Err(e) => Err(EngineError::new(Some(source.name.clone()), describe(&e))),
        }
    }
}

impl TemplateEngine for TeraEngine {
    type Compiled = Tera;

    fn compile(&self, root: &str, sources: &[TemplateSource]) -> Result<Tera, EngineError> {
        for source in sources {
            self.check_source(source)?;
        }

        let mut tera = Tera::default();
        tera.autoescape_on(self.autoescape.clone());
        tera.add_raw_templates(
            sources
                .iter()
                .map(|s| (s.name.as_str(), s.content.as_str())),
        )
        .map_err(|e| {
            let culprit = match &e.kind {
                ErrorKind::MissingParent { current, .. } => current.clone(),
                _ => root.to_string(),
            };
            EngineError::new(Some(culprit), describe(&e))
        })?;

        Ok(tera)
    }

    fn execute(
        &self,
        compiled: &Tera,
        root: &str,
        data: &TemplateData,
        out: &mut Vec<u8>,
    ) -> Result<(), EngineError> {
        let context = Context::from_serialize(data)
            .map_err(|e| EngineError::new(Some(root.to_string()), describe(&e)))?;

        compiled
            .render_to(root, &context, out)
            .map_err(|e| EngineError::new(Some(root.to_string()), describe(&e)))
    }
}

/// Flatten a Tera error chain; the useful detail is usually in a source
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn source(name: &str, content: &str) -> TemplateSource {
        TemplateSource {
            name: name.to_string(),
            path: PathBuf::from(name),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_page_fills_layout_block() {
        let engine = TeraEngine::new();
        let sources = vec![
            source(
                "home.page.tmpl",
                r#"{% extends "base.layout.tmpl" %}{% block content %}<h1>Home</h1>{% endblock %}"#,
            ),
            source(
                "base.layout.tmpl",
                "<html><body>{% block content %}{% endblock %}</body></html>",
            ),
        ];

        let compiled = engine.compile("home.page.tmpl", &sources).unwrap();
        let mut out = Vec::new();
        engine
            .execute(&compiled, "home.page.tmpl", &TemplateData::new(), &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<html><body><h1>Home</h1></body></html>"
        );
    }

    #[test]
    fn test_syntax_error_names_source() {
        let engine = TeraEngine::new();
        let sources = vec![
            source("ok.page.tmpl", "fine"),
            source("broken.layout.tmpl", "{% block content %}"),
        ];

        let err = engine.compile("ok.page.tmpl", &sources).unwrap_err();
        assert_eq!(err.template.as_deref(), Some("broken.layout.tmpl"));
    }

    #[test]
    fn test_missing_parent_names_page() {
        let engine = TeraEngine::new();
        let sources = vec![source(
            "orphan.page.tmpl",
            r#"{% extends "nowhere.layout.tmpl" %}{% block content %}x{% endblock %}"#,
        )];

        let err = engine.compile("orphan.page.tmpl", &sources).unwrap_err();
        assert_eq!(err.template.as_deref(), Some("orphan.page.tmpl"));
    }

    #[test]
    fn test_output_is_escaped() {
        let engine = TeraEngine::new();
        let sources = vec![source("x.page.tmpl", "{{ string_map.name }}")];
        let compiled = engine.compile("x.page.tmpl", &sources).unwrap();

        let data = TemplateData::new().with_string("name", "<b>");
        let mut out = Vec::new();
        engine
            .execute(&compiled, "x.page.tmpl", &data, &mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "&lt;b&gt;");
    }

    #[test]
    fn test_undefined_variable_is_execution_error() {
        let engine = TeraEngine::new();
        let sources = vec![source("x.page.tmpl", "{{ string_map.missing }}")];
        let compiled = engine.compile("x.page.tmpl", &sources).unwrap();

        let mut out = Vec::new();
        let err = engine
            .execute(&compiled, "x.page.tmpl", &TemplateData::new(), &mut out)
            .unwrap_err();
        assert_eq!(err.template.as_deref(), Some("x.page.tmpl"));
    }
}
