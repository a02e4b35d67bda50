//! Command handlers. One module per subcommand.

use std::io::Read as _;
use std::path::Path;
use std::sync::Arc;

use kiln_adapters::{LocalFilesystem, LuaRuntime};
use kiln_core::{application::RenderService, domain::Template};

use crate::{
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
};

pub mod check;
pub mod compile;
pub mod completions;
pub mod config;
pub mod init;
pub mod render;

/// Path that stands for standard input.
const STDIN_PATH: &str = "-";

/// Wire the local filesystem and the Lua runtime into a render service.
fn render_service(config: &AppConfig, debug: bool) -> CliResult<RenderService> {
    let options = config.render_options(debug).map_err(|e| CliError::ConfigError {
        message: format!("Invalid render settings: {e}"),
        source: Some(Box::new(e)),
    })?;
    Ok(RenderService::new(
        Arc::new(LocalFilesystem::new()),
        Arc::new(LuaRuntime::new()),
        options,
    )?)
}

/// Load `file`, or read an inline template from stdin for `-`.
fn load_template(service: &RenderService, file: &Path) -> CliResult<Template> {
    if file == Path::new(STDIN_PATH) {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .with_cli_context(|| "Failed to read template from stdin")?;
        return Ok(Template::inline(source));
    }
    Ok(service.load(file)?)
}
