//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the [`RenderOptions`]
//! built from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `KILN_<SECTION>__<KEY>`, e.g. `KILN_RENDER__DEBUG=true`
//! 3. Config file: `--config FILE`, or else the user config file overlaid
//!    with `.kiln.toml` from the current directory
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use kiln_core::application::{DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_TEMPLATE_SUFFIX, RenderOptions};
use kiln_core::domain::{DEFAULT_INDENT_UNIT, Syntax};
use kiln_core::error::KilnResult;

/// Per-directory config file name.
pub const LOCAL_CONFIG_FILE: &str = ".kiln.toml";

const ENV_PREFIX: &str = "KILN";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Compiler and runtime settings.
    pub render: RenderConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Template lookup settings.
    pub templates: TemplateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub indent_unit: usize,
    pub left_delimiter: String,
    pub right_delimiter: String,
    pub escape: String,
    pub debug: bool,
    pub max_include_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Suffix tried when a template path does not exist as given.
    pub suffix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let syntax = Syntax::default();
        Self {
            indent_unit: DEFAULT_INDENT_UNIT,
            left_delimiter: syntax.left().to_string(),
            right_delimiter: syntax.right().to_string(),
            escape: syntax.escape().to_string(),
            debug: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "human".into(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_TEMPLATE_SUFFIX.into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, files and the environment.
    ///
    /// `config_file` is the path the user passed via `--config`. It must
    /// exist; the implicit user and local files are optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to serialise default config")?;
        let mut builder = Config::builder().add_source(defaults);

        builder = match config_file {
            Some(path) => builder.add_source(toml_file(path, true)),
            None => builder
                .add_source(toml_file(&Self::config_path(), false))
                .add_source(toml_file(Path::new(LOCAL_CONFIG_FILE), false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.kiln.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "kiln", "kiln")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Build render options. `debug` comes from the command line and can
    /// only switch debug mode on.
    pub fn render_options(&self, debug: bool) -> KilnResult<RenderOptions> {
        let syntax = Syntax::new(
            self.render.left_delimiter.as_str(),
            self.render.right_delimiter.as_str(),
            self.render.escape.as_str(),
        )?;
        let options = RenderOptions::default()
            .with_syntax(syntax)
            .with_indent_unit(self.render.indent_unit)
            .with_debug(debug || self.render.debug)
            .with_max_include_depth(self.render.max_include_depth)
            .with_template_suffix(self.templates.suffix.as_str());
        options.validate()?;
        Ok(options)
    }
}

fn toml_file(path: &Path, required: bool) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml).required(required)
}
