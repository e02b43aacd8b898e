use std::io::Write;
use std::sync::Arc;

use super::compiler::TemplateCompiler;
use super::data::TemplateData;
use super::engine::{TemplateEngine, TeraEngine};
use super::merger::DataMerger;
use super::store::TemplateStore;
use super::types::{TemplateError, TemplateResult, TemplateSet};
use crate::config::TemplateConfig;
use crate::session::Session;

/// Turns a page name plus handler data into HTML.
///
/// With caching on, every lookup reads the store built at construction. With
/// caching off, each lookup compiles a private store used only by that call,
/// so concurrent requests never share a half-built cache.
pub struct Renderer<E: TemplateEngine = TeraEngine> {
    compiler: Arc<TemplateCompiler<E>>,
    cache: TemplateStore<E::Compiled>,
    use_cache: bool,
    merger: DataMerger,
}

impl Renderer<TeraEngine> {
    /// Build the template cache described by `config`.
    ///
    /// Fails when any page or layout fails to compile.
    pub fn from_config(config: &TemplateConfig) -> TemplateResult<Self> {
        let compiler = Arc::new(TemplateCompiler::from_config(config));
        let merger = DataMerger::new(config.globals.clone());
        Self::build(compiler, config.use_cache, merger)
    }
}

impl<E: TemplateEngine> Renderer<E> {
    /// Run a full build and keep the result as the cache
    pub fn build(
        compiler: Arc<TemplateCompiler<E>>,
        use_cache: bool,
        merger: DataMerger,
    ) -> TemplateResult<Self> {
        let cache = compiler.build()?;

        tracing::info!(
            dir = %compiler.dir().display(),
            pages = cache.len(),
            use_cache = use_cache,
            "Template cache created"
        );

        Ok(Self {
            compiler,
            cache,
            use_cache,
            merger,
        })
    }

    pub fn uses_cache(&self) -> bool {
        self.use_cache
    }

    /// The store built at startup
    pub fn cache(&self) -> &TemplateStore<E::Compiled> {
        &self.cache
    }

    pub fn compiler(&self) -> &TemplateCompiler<E> {
        &self.compiler
    }

    /// Find the compiled set for `name` under the active caching policy
    pub fn resolve(&self, name: &str) -> TemplateResult<Arc<TemplateSet<E::Compiled>>> {
        let found = if self.use_cache {
            self.cache.get(name)
        } else {
            self.compiler.build()?.get(name)
        };

        found.ok_or_else(|| TemplateError::LookupMiss(name.to_string()))
    }

    /// Async form of [`resolve`](Self::resolve) for request handlers.
    ///
    /// A rebuild reads every template file, so with caching off it runs on
    /// the blocking pool instead of the request's worker thread.
    pub async fn lookup(&self, name: &str) -> TemplateResult<Arc<TemplateSet<E::Compiled>>> {
        if self.use_cache {
            return self.resolve(name);
        }

        let compiler = Arc::clone(&self.compiler);
        let store = tokio::task::spawn_blocking(move || compiler.build())
            .await
            .map_err(|e| TemplateError::Rebuild(e.to_string()))??;

        store
            .get(name)
            .ok_or_else(|| TemplateError::LookupMiss(name.to_string()))
    }

    /// Render a page into an in-memory buffer.
    ///
    /// Output is only returned once execution finished, so a failing
    /// template never produces a half-written response.
    pub async fn render(
        &self,
        name: &str,
        data: TemplateData,
        session: Option<&Session>,
    ) -> TemplateResult<Vec<u8>> {
        let set = self.lookup(name).await?;
        let data = self.merger.merge(data, session).await;

        let mut buf = Vec::new();
        self.compiler
            .engine()
            .execute(set.compiled(), set.name(), &data, &mut buf)
            .map_err(|e| TemplateError::Execution {
                name: set.name().to_string(),
                message: e.message,
            })?;

        tracing::debug!(template = name, bytes = buf.len(), "Template rendered");
        Ok(buf)
    }

    /// Render a page and write it to `sink`.
    ///
    /// A failed write is logged and otherwise ignored; the client may see a
    /// truncated page but nothing else is affected.
    pub async fn render_to<W: Write>(
        &self,
        name: &str,
        data: TemplateData,
        session: Option<&Session>,
        sink: &mut W,
    ) -> TemplateResult<()> {
        let buf = self.render(name, data, session).await?;

        if let Err(e) = sink.write_all(&buf).and_then(|_| sink.flush()) {
            let e = TemplateError::Write(e);
            tracing::warn!(template = name, error = %e, "Error writing template to the client");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};

    use super::*;
    use crate::template::{EngineError, TemplateSource};

    /// Tera engine that remembers which thread each compile ran on
    #[derive(Default)]
    struct ThreadRecordingEngine {
        inner: TeraEngine,
        compile_threads: Mutex<Vec<ThreadId>>,
    }

    impl TemplateEngine for ThreadRecordingEngine {
        type Compiled = <TeraEngine as TemplateEngine>::Compiled;

        fn compile(
            &self,
            root: &str,
            sources: &[TemplateSource],
        ) -> Result<Self::Compiled, EngineError> {
            self.compile_threads.lock().unwrap().push(thread::current().id());
            self.inner.compile(root, sources)
        }

        fn execute(
            &self,
            compiled: &Self::Compiled,
            root: &str,
            data: &TemplateData,
            out: &mut Vec<u8>,
        ) -> Result<(), EngineError> {
            self.inner.execute(compiled, root, data, out)
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn renderer(dir: &std::path::Path, use_cache: bool) -> Renderer {
        let compiler = Arc::new(TemplateCompiler::with_engine(
            TeraEngine::new(),
            dir,
            "*.page.tmpl",
            "*.layout.tmpl",
        ));
        Renderer::build(compiler, use_cache, DataMerger::default()).unwrap()
    }

    #[tokio::test]
    async fn test_write_failure_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("home.page.tmpl"), "home").unwrap();
        let renderer = renderer(dir.path(), true);

        let result = renderer
            .render_to("home.page.tmpl", TemplateData::new(), None, &mut BrokenSink)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_render_to_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("home.page.tmpl"), "<p>home</p>").unwrap();
        let renderer = renderer(dir.path(), true);

        let mut sink = Vec::new();
        renderer
            .render_to("home.page.tmpl", TemplateData::new(), None, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink, b"<p>home</p>");
    }

    #[tokio::test]
    async fn test_execution_error_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.page.tmpl"), "{{ int_map.rooms + 1 }}").unwrap();
        fs::write(dir.path().join("good.page.tmpl"), "ok").unwrap();
        let renderer = renderer(dir.path(), true);

        let err = renderer
            .render("bad.page.tmpl", TemplateData::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateError::Execution { .. }));
        assert!(!err.is_configuration());

        let page = renderer
            .render("good.page.tmpl", TemplateData::new(), None)
            .await
            .unwrap();
        assert_eq!(page, b"ok");
    }

    #[tokio::test]
    async fn test_bypass_picks_up_edits() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("home.page.tmpl");
        fs::write(&page, "v1").unwrap();
        let renderer = renderer(dir.path(), false);

        fs::write(&page, "v2").unwrap();
        let out = renderer
            .render("home.page.tmpl", TemplateData::new(), None)
            .await
            .unwrap();
        assert_eq!(out, b"v2");
        // The startup cache is left as it was
        assert_eq!(renderer.cache().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_bypass_rebuild_runs_off_the_runtime_thread() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("home.page.tmpl"), "home").unwrap();
        let compiler = Arc::new(TemplateCompiler::with_engine(
            ThreadRecordingEngine::default(),
            dir.path(),
            "*.page.tmpl",
            "*.layout.tmpl",
        ));
        let renderer = Renderer::build(compiler, false, DataMerger::default()).unwrap();
        let runtime_thread = thread::current().id();

        let out = renderer
            .render("home.page.tmpl", TemplateData::new(), None)
            .await
            .unwrap();
        assert_eq!(out, b"home");

        let threads = renderer.compiler().engine().compile_threads.lock().unwrap().clone();
        assert_eq!(threads.len(), 2);
        // Startup build ran inline, the per-request rebuild did not
        assert_eq!(threads[0], runtime_thread);
        assert_ne!(threads[1], runtime_thread);
    }
}
