//! `kiln render`: render a template to stdout.

use tracing::{debug, instrument};

use kiln_core::domain::Scope;

use crate::{
    cli::RenderArgs,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `kiln render` command.
///
/// 1. Build the render service from config and flags
/// 2. Turn `-D` definitions into the template scope
/// 3. Load the template (file or stdin)
/// 4. Render and write the output untouched
#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(args: RenderArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let service = super::render_service(&config, args.debug)?;

    let mut scope = Scope::new();
    scope
        .merge_strings(args.defines)
        .map_err(|e| CliError::InvalidInput {
            message: e.to_string(),
            source: Some(Box::new(e)),
        })?;
    debug!(vars = scope.len(), "scope prepared");

    let template = super::load_template(&service, &args.file)?;

    if args.show_compiled {
        let compiled = service.compile(&template)?;
        output.diagnostic(
            &format!("compiled source of {}:", template.description()),
            &compiled.numbered_listing(),
        )?;
    }

    let rendered = service.render(&template, &scope)?;
    output.emit(&rendered.output)?;
    Ok(())
}
