use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use walkdir::WalkDir;

use super::engine::{TemplateEngine, TeraEngine};
use super::store::TemplateStore;
use super::types::{TemplateError, TemplateResult, TemplateSet, TemplateSource};
use crate::config::TemplateConfig;

/// Discovers page and layout sources and compiles one set per page.
pub struct TemplateCompiler<E: TemplateEngine = TeraEngine> {
    engine: E,
    dir: PathBuf,
    page_pattern: String,
    layout_pattern: String,
    builds: AtomicU64,
}

impl TemplateCompiler<TeraEngine> {
    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::with_engine(
            TeraEngine::new(),
            config.dir.clone(),
            config.page_pattern.clone(),
            config.layout_pattern.clone(),
        )
    }
}

impl<E: TemplateEngine> TemplateCompiler<E> {
    pub fn with_engine(
        engine: E,
        dir: impl Into<PathBuf>,
        page_pattern: impl Into<String>,
        layout_pattern: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            dir: dir.into(),
            page_pattern: page_pattern.into(),
            layout_pattern: layout_pattern.into(),
            builds: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of full builds started so far
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Page sources in the template directory, sorted by file name
    pub fn discover_pages(&self) -> TemplateResult<Vec<PathBuf>> {
        self.discover(&self.page_pattern)
    }

    /// Layout sources in the template directory, sorted by file name
    pub fn discover_layouts(&self) -> TemplateResult<Vec<PathBuf>> {
        self.discover(&self.layout_pattern)
    }

    fn discover(&self, pattern: &str) -> TemplateResult<Vec<PathBuf>> {
        let suffix = pattern_suffix(pattern).map_err(|reason| TemplateError::Discovery {
            dir: self.dir.clone(),
            reason,
        })?;

        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| TemplateError::Discovery {
                dir: self.dir.clone(),
                reason: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(suffix));
            if matches {
                paths.push(entry.into_path());
            }
        }

        Ok(paths)
    }

    /// Compile one page with every layout attached.
    ///
    /// The resulting set is named after the page's base file name.
    pub fn compile_page(
        &self,
        page: &Path,
        layouts: &[PathBuf],
    ) -> TemplateResult<TemplateSet<E::Compiled>> {
        let layouts = layouts
            .iter()
            .map(|path| read_source(path))
            .collect::<TemplateResult<Vec<_>>>()?;
        self.compile_with_layouts(page, &layouts)
    }

    fn compile_with_layouts(
        &self,
        page: &Path,
        layouts: &[TemplateSource],
    ) -> TemplateResult<TemplateSet<E::Compiled>> {
        let root = read_source(page)?;
        let name = root.name.clone();

        let mut sources = Vec::with_capacity(layouts.len() + 1);
        sources.push(root);
        sources.extend(layouts.iter().cloned());

        let compiled = self.engine.compile(&name, &sources).map_err(|e| {
            let path = e
                .template
                .as_deref()
                .and_then(|culprit| sources.iter().find(|s| s.name == culprit))
                .map(|s| s.path.clone())
                .unwrap_or_else(|| page.to_path_buf());
            TemplateError::Compile {
                path,
                message: e.message,
            }
        })?;

        let layout_names = layouts.iter().map(|s| s.name.clone()).collect();
        Ok(TemplateSet::new(name, layout_names, compiled))
    }

    /// Compile every discovered page into a fresh store.
    ///
    /// Any single failure fails the whole build; no partial store is returned.
    pub fn build(&self) -> TemplateResult<TemplateStore<E::Compiled>> {
        self.builds.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let pages = self.discover_pages()?;
        let layouts = self
            .discover_layouts()?
            .iter()
            .map(|path| read_source(path))
            .collect::<TemplateResult<Vec<_>>>()?;

        let mut store = TemplateStore::new();
        for page in &pages {
            let set = self.compile_with_layouts(page, &layouts)?;
            store.insert(set);
        }

        tracing::debug!(
            dir = %self.dir.display(),
            pages = store.len(),
            layouts = layouts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Template cache built"
        );

        Ok(store)
    }
}

/// Accept only `*<suffix>` where the suffix is a literal file-name ending
fn pattern_suffix(pattern: &str) -> Result<&str, String> {
    let suffix = pattern
        .strip_prefix('*')
        .ok_or_else(|| format!("pattern {:?} must start with '*'", pattern))?;

    if suffix.is_empty() {
        return Err(format!("pattern {:?} has no file suffix", pattern));
    }

    if suffix
        .chars()
        .any(|c| matches!(c, '*' | '?' | '[' | ']' | '/' | '\\'))
    {
        return Err(format!(
            "pattern {:?} may only contain a single leading '*'",
            pattern
        ));
    }

    Ok(suffix)
}

fn read_source(path: &Path) -> TemplateResult<TemplateSource> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TemplateError::Compile {
            path: path.to_path_buf(),
            message: "file name is not valid UTF-8".to_string(),
        })?
        .to_string();

    let content = fs::read_to_string(path).map_err(|e| TemplateError::Compile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(TemplateSource {
        name,
        path: path.to_path_buf(),
        content,
    })
}
