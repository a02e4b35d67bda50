//! `kiln compile`: print the compiled Lua source.

use crate::{cli::CompileArgs, config::AppConfig, error::CliResult, output::OutputManager};

pub fn execute(args: CompileArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let service = super::render_service(&config, false)?;
    let template = super::load_template(&service, &args.file)?;
    let compiled = service.compile(&template)?;

    let text = if args.numbered {
        compiled.numbered_listing()
    } else {
        compiled.into_code()
    };
    output.emit(&text)?;
    output.emit("\n")?;
    Ok(())
}
