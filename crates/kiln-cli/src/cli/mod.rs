//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "kiln",
    bin_name = "kiln",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Line-oriented templates compiled to sandboxed Lua",
    long_about = "Kiln compiles text templates with embedded Lua into a script, \
                  runs it in a sandbox and prints whatever the script printed.",
    after_help = "EXAMPLES:\n\
        \x20 kiln render page.tpl -D title=Home\n\
        \x20 echo 'hello <% name %>!' | kiln render - -D name=world\n\
        \x20 kiln compile page.tpl --numbered\n\
        \x20 kiln completions bash > /usr/share/bash-completion/completions/kiln",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a template to stdout.
    #[command(
        visible_alias = "r",
        about = "Render a template",
        after_help = "EXAMPLES:\n\
            \x20 kiln render page.tpl\n\
            \x20 kiln render page -D title=Home -D lang=en\n\
            \x20 kiln render page.tpl --debug --show-compiled"
    )]
    Render(RenderArgs),

    /// Print the compiled Lua source of a template.
    #[command(
        about = "Show compiled source",
        after_help = "EXAMPLES:\n\
            \x20 kiln compile page.tpl\n\
            \x20 kiln compile page.tpl --numbered"
    )]
    Compile(CompileArgs),

    /// Compile a template and load it without running it.
    #[command(
        about = "Check a template for syntax errors",
        after_help = "EXAMPLES:\n\
            \x20 kiln check page.tpl"
    )]
    Check(CheckArgs),

    /// Initialise a Kiln configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 kiln init           # user config directory\n\
            \x20 kiln init --local   # .kiln.toml in the current directory"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 kiln completions bash > ~/.local/share/bash-completion/completions/kiln\n\
            \x20 kiln completions zsh  > ~/.zfunc/_kiln\n\
            \x20 kiln completions fish > ~/.config/fish/completions/kiln.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Kiln configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 kiln config get render.indent_unit\n\
            \x20 kiln config list\n\
            \x20 kiln config path"
    )]
    Config(ConfigCommands),
}

// ── render ────────────────────────────────────────────────────────────────────

/// Arguments for `kiln render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template path, or `-` to read the template from stdin.
    ///
    /// The `.tpl` suffix may be omitted.
    #[arg(value_name = "FILE", help = "Template file, or - for stdin")]
    pub file: PathBuf,

    /// Template variables.
    #[arg(
        short = 'D',
        long = "define",
        value_name = "KEY=VALUE",
        value_parser = parse_define,
        help = "Set a template variable (repeatable)"
    )]
    pub defines: Vec<(String, String)>,

    /// Attach the compiled listing and native error details to failures.
    #[arg(long = "debug", help = "Show compiled source in error reports")]
    pub debug: bool,

    /// Print the compiled source to stderr before rendering.
    #[arg(long = "show-compiled", help = "Print the compiled source to stderr")]
    pub show_compiled: bool,
}

// ── compile ───────────────────────────────────────────────────────────────────

/// Arguments for `kiln compile`.
#[derive(Debug, Args)]
pub struct CompileArgs {
    #[arg(value_name = "FILE", help = "Template file, or - for stdin")]
    pub file: PathBuf,

    /// Prefix every line with its number.
    #[arg(short = 'n', long = "numbered", help = "Number the compiled lines")]
    pub numbered: bool,
}

// ── check ─────────────────────────────────────────────────────────────────────

/// Arguments for `kiln check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(value_name = "FILE", help = "Template file, or - for stdin")]
    pub file: PathBuf,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `kiln init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.kiln.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `kiln completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `kiln config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `render.indent_unit`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the user configuration file.
    Path,
}

// ── value parsers ─────────────────────────────────────────────────────────────

/// Parse `KEY=VALUE`. The value may itself contain `=`.
fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_render_command() {
        let cli = Cli::parse_from([
            "kiln", "render", "page.tpl", "-D", "title=Home", "--define", "q=a=b", "--debug",
        ]);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.file, PathBuf::from("page.tpl"));
                assert_eq!(
                    args.defines,
                    vec![
                        ("title".to_string(), "Home".to_string()),
                        ("q".to_string(), "a=b".to_string()),
                    ]
                );
                assert!(args.debug);
                assert!(!args.show_compiled);
            }
            other => panic!("expected Render command, got {other:?}"),
        }
    }

    #[test]
    fn render_alias() {
        let cli = Cli::parse_from(["kiln", "r", "-"]);
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn define_without_equals_is_rejected() {
        let result = Cli::try_parse_from(["kiln", "render", "page.tpl", "-D", "oops"]);
        assert!(result.is_err());
        assert!(parse_define("=x").is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["kiln", "--quiet", "--verbose", "config", "list"]);
        assert!(result.is_err());
    }
}
