//! Render Service - main application orchestrator.
//!
//! This service coordinates the whole rendering workflow:
//! 1. Load a template (trying the `.tpl` suffix when needed)
//! 2. Compile it with the domain compiler
//! 3. Run the script through the runtime port
//! 4. Map runtime failures back to template lines
//!
//! `include(...)` calls come back into the service through an
//! [`IncludeHost`], so every nested template goes through the same steps and
//! its failures are wrapped in the includer's frame.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError, Diagnostics, ExecutionFailure, Location, RenderOptions,
        ports::{IncludeHost, ScriptFailure, ScriptRequest, ScriptRuntime, TemplateLoader},
    },
    domain::{CompiledTemplate, Compiler, RenderedTemplate, Scope, Template},
    error::{KilnError, KilnResult},
};

/// Main render service.
///
/// Cheap to clone: all state sits behind `Arc`s.
#[derive(Clone)]
pub struct RenderService {
    loader: Arc<dyn TemplateLoader>,
    runtime: Arc<dyn ScriptRuntime>,
    compiler: Arc<Compiler>,
    options: Arc<RenderOptions>,
}

impl RenderService {
    /// Create a render service with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use kiln_core::prelude::*;
    ///
    /// # fn demo(loader: Arc<dyn TemplateLoader>, runtime: Arc<dyn ScriptRuntime>) -> KilnResult<()> {
    /// let service = RenderService::new(
    ///     loader,  // impl TemplateLoader
    ///     runtime, // impl ScriptRuntime
    ///     RenderOptions::default().with_debug(true),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        loader: Arc<dyn TemplateLoader>,
        runtime: Arc<dyn ScriptRuntime>,
        options: RenderOptions,
    ) -> KilnResult<Self> {
        options.validate()?;
        let compiler = Compiler::new(&options.syntax, options.indent_unit)?;
        Ok(Self {
            loader,
            runtime,
            compiler: Arc::new(compiler),
            options: Arc::new(options),
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Load a template from `path`, falling back to `path.<suffix>`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> KilnResult<Template> {
        let attempted = self.candidates(path);
        for candidate in &attempted {
            if self.loader.exists(candidate) {
                let source = self.loader.load_text(candidate)?;
                debug!(resolved = %candidate.display(), bytes = source.len(), "template loaded");
                return Ok(Template::from_file(candidate.clone(), source));
            }
        }
        Err(ApplicationError::TemplateNotFound { attempted }.into())
    }

    /// Compile without running.
    pub fn compile(&self, template: &Template) -> KilnResult<CompiledTemplate> {
        Ok(self.compiler.compile(template)?)
    }

    /// Compile and let the runtime load the script without running it.
    #[instrument(skip_all, fields(template = %template.description()))]
    pub fn check(&self, template: &Template) -> KilnResult<CompiledTemplate> {
        let compiled = self.compile(template)?;
        self.runtime
            .check(compiled.code())
            .map_err(|failure| self.execution_error(template, &compiled, failure))?;
        Ok(compiled)
    }

    /// Render a template with the given scope.
    #[instrument(skip_all, fields(template = %template.description(), vars = scope.len()))]
    pub fn render(&self, template: &Template, scope: &Scope) -> KilnResult<RenderedTemplate> {
        let rendered = self.render_nested(template, scope, 0)?;
        info!(bytes = rendered.output.len(), "template rendered");
        Ok(rendered)
    }

    /// Load and render the template at `path`.
    pub fn render_file(&self, path: impl AsRef<Path>, scope: &Scope) -> KilnResult<RenderedTemplate> {
        let template = self.load(path.as_ref())?;
        self.render(&template, scope)
    }

    /// Render template source given as a string.
    pub fn render_str(&self, source: &str, scope: &Scope) -> KilnResult<RenderedTemplate> {
        self.render(&Template::inline(source), scope)
    }

    /// Run an already compiled template.
    pub fn execute(
        &self,
        template: &Template,
        compiled: &CompiledTemplate,
        scope: &Scope,
    ) -> KilnResult<String> {
        self.execute_at_depth(template, compiled, scope, 0)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        let mut suffixed = OsString::from(path.as_os_str());
        suffixed.push(".");
        suffixed.push(&self.options.template_suffix);
        vec![path.to_path_buf(), PathBuf::from(suffixed)]
    }

    fn render_nested(
        &self,
        template: &Template,
        scope: &Scope,
        depth: usize,
    ) -> KilnResult<RenderedTemplate> {
        let compiled = self.compile(template)?;
        let output = self.execute_at_depth(template, &compiled, scope, depth)?;
        Ok(RenderedTemplate {
            output,
            compiled: compiled.into_code(),
        })
    }

    fn execute_at_depth(
        &self,
        template: &Template,
        compiled: &CompiledTemplate,
        scope: &Scope,
        depth: usize,
    ) -> KilnResult<String> {
        let mut variables = self.options.globals.clone();
        variables.merge(scope);

        let request = ScriptRequest {
            code: compiled.code().to_string(),
            scope: variables,
            builtins: self.options.builtins.clone(),
        };
        let host: Arc<dyn IncludeHost> = Arc::new(IncludeContext {
            service: self.clone(),
            base_dir: template.base_dir().map(Path::to_path_buf),
            depth,
        });

        self.runtime
            .execute(&request, host)
            .map_err(|failure| self.execution_error(template, compiled, failure))
    }

    /// Turn a runtime failure into a template-level error.
    fn execution_error(
        &self,
        template: &Template,
        compiled: &CompiledTemplate,
        failure: ScriptFailure,
    ) -> KilnError {
        let location = Location {
            template: template.description(),
            source_line: failure.line.map(|line| compiled.source_line(line)),
            compiled_line: failure.line,
        };

        if let Some(inner) = failure.include {
            return ApplicationError::NestedInclude { location, inner }.into();
        }

        let diagnostics = self.options.debug.then(|| Diagnostics {
            attributes: failure.attributes,
            listing: compiled.numbered_listing(),
        });
        ApplicationError::Execution(Box::new(ExecutionFailure {
            location,
            kind: failure.kind,
            message: failure.message,
            diagnostics,
        }))
        .into()
    }
}

/// Include callback bound to one executing template.
struct IncludeContext {
    service: RenderService,
    /// Directory relative include paths resolve against.
    base_dir: Option<PathBuf>,
    /// Depth of the template that is including.
    depth: usize,
}

impl IncludeHost for IncludeContext {
    fn include(&self, path: &str, scope: Scope) -> KilnResult<String> {
        let depth = self.depth + 1;
        let limit = self.service.options.max_include_depth;
        if depth > limit {
            return Err(ApplicationError::IncludeDepthExceeded {
                limit,
                path: path.to_string(),
            }
            .into());
        }

        let target = match &self.base_dir {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        };
        debug!(path = %target.display(), depth, "including template");

        let template = self.service.load(&target)?;
        let rendered = self.service.render_nested(&template, &scope, depth)?;
        Ok(rendered.output)
    }
}
