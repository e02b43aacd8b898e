//! Page template cache and rendering pipeline.
//!
//! This module provides:
//! - Discovery of page (`*.page.tmpl`) and layout (`*.layout.tmpl`) sources
//! - One compiled template set per page, with all layouts composed in
//! - A read-only store of compiled sets shared across requests
//! - A renderer that merges per-request data and executes into a buffer
//!
//! # Example
//!
//! ```ignore
//! let renderer = Renderer::from_config(&settings.templates)?;
//!
//! let data = TemplateData::new().with_string("test", "Hello, again");
//! let html = renderer.render("about.page.tmpl", data, Some(&session)).await?;
//! ```

mod compiler;
mod data;
mod engine;
mod merger;
mod renderer;
mod store;
mod types;

pub use compiler::TemplateCompiler;
pub use data::TemplateData;
pub use engine::{EngineError, TemplateEngine, TeraEngine};
pub use merger::{
    DataMerger, CSRF_TOKEN_KEY, ERROR_KEY, FLASH_KEY, REMOTE_IP_KEY, WARNING_KEY,
};
pub use renderer::Renderer;
pub use store::TemplateStore;
pub use types::{TemplateError, TemplateResult, TemplateSet, TemplateSource};
