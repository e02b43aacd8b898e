use std::path::PathBuf;

use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template directory unreadable or file pattern malformed
    #[error("Template discovery failed in {dir}: {reason}")]
    Discovery { dir: PathBuf, reason: String },

    /// A page or layout source failed to parse
    #[error("Failed to compile {path}: {message}")]
    Compile { path: PathBuf, message: String },

    /// A page name that is not in the cache
    #[error("Template not found in cache: {0}")]
    LookupMiss(String),

    #[error("Failed to execute template {name}: {message}")]
    Execution { name: String, message: String },

    /// The background rebuild used when caching is off did not complete
    #[error("Template rebuild did not complete: {0}")]
    Rebuild(String),

    #[error("Failed to write rendered page: {0}")]
    Write(#[from] std::io::Error),
}

impl TemplateError {
    /// Errors that indicate a broken deployment rather than a bad request
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TemplateError::Discovery { .. }
                | TemplateError::Compile { .. }
                | TemplateError::LookupMiss(_)
        )
    }
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// One template source file read from disk
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Base file name, used as the template's name inside the engine
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

/// A compiled page together with every layout it may reference.
///
/// Immutable once built; shared behind an `Arc` by the store.
#[derive(Debug)]
pub struct TemplateSet<T> {
    name: String,
    layouts: Vec<String>,
    compiled: T,
}

impl<T> TemplateSet<T> {
    pub fn new(name: String, layouts: Vec<String>, compiled: T) -> Self {
        Self {
            name,
            layouts,
            compiled,
        }
    }

    /// The page's base file name, e.g. `home.page.tmpl`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the layouts composed into this set
    pub fn layouts(&self) -> &[String] {
        &self.layouts
    }

    pub fn compiled(&self) -> &T {
        &self.compiled
    }
}
