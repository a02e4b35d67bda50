//! `kiln check`: compile a template and load the script without running it.

use tracing::info;

use crate::{cli::CheckArgs, config::AppConfig, error::CliResult, output::OutputManager};

pub fn execute(args: CheckArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let service = super::render_service(&config, false)?;
    let template = super::load_template(&service, &args.file)?;
    let compiled = service.check(&template)?;

    info!(
        template = %template.description(),
        lines = compiled.code().lines().count(),
        "template checked"
    );
    output.success(&format!("{}: no syntax errors", template.description()))?;
    Ok(())
}
