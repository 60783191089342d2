//! Layered CLI settings.
//!
//! Lowest to highest precedence: built-in defaults, `hearth.config.json` in the
//! project directory, `HEARTH_*` environment variables, command-line flags.
//! Every layer is a [`SettingsLayer`] of optional fields; layers are merged with
//! `Option::or` and the result is turned into [`hearth::ServeOptions`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format as _, Json, Serialized};
use hearth::engine::{DEFAULT_HOST, DEFAULT_PORT};
use hearth::{DEFAULT_OUTPUT_DIR, Loader, ServeOptions};
use serde::{Deserialize, Serialize};

use crate::cli::ServeArgs;
use crate::error::Result;

/// File looked up in the project directory.
pub const SETTINGS_FILE: &str = "hearth.config.json";

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "HEARTH_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    #[serde(alias = "out_dir", skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<BTreeMap<String, Loader>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl SettingsLayer {
    pub fn defaults() -> Self {
        Self {
            config: None,
            out_dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            loader: None,
            external: None,
            minify: Some(false),
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
        }
    }

    /// Fields set on the command line; unset flags stay `None`.
    pub fn from_args(args: &ServeArgs) -> Self {
        Self {
            config: args.config.clone(),
            out_dir: args.out_dir.clone(),
            loader: (!args.loaders.is_empty()).then(|| args.loaders.iter().cloned().collect()),
            external: (!args.external.is_empty()).then(|| args.external.clone()),
            minify: args.minify.then_some(true),
            host: args.host.clone(),
            port: args.port,
        }
    }

    /// `self` wins wherever it has a value.
    pub fn or(self, lower: Self) -> Self {
        Self {
            config: self.config.or(lower.config),
            out_dir: self.out_dir.or(lower.out_dir),
            loader: self.loader.or(lower.loader),
            external: self.external.or(lower.external),
            minify: self.minify.or(lower.minify),
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
        }
    }
}

/// Fully resolved settings for one `serve` run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub working_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub loader: BTreeMap<String, Loader>,
    pub external: Vec<String>,
    pub minify: bool,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Merge defaults, the settings file, the environment and `args`.
    pub fn load(args: &ServeArgs, working_dir: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(SettingsLayer::defaults()));

        let file = working_dir.join(SETTINGS_FILE);
        if file.is_file() {
            tracing::debug!(path = %file.display(), "reading settings file");
            figment = figment.merge(Json::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let layered: SettingsLayer = figment.extract()?;
        let merged = SettingsLayer::from_args(args).or(layered);
        Ok(Self::resolve(merged, working_dir))
    }

    fn resolve(layer: SettingsLayer, working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            config: layer.config,
            out_dir: layer
                .out_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            loader: layer.loader.unwrap_or_default(),
            external: layer.external.unwrap_or_default(),
            minify: layer.minify.unwrap_or(false),
            host: layer.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: layer.port.unwrap_or(DEFAULT_PORT),
        }
    }

    /// Loader overrides are added on top of the default loader map.
    pub fn into_serve_options(self) -> ServeOptions {
        let mut options = ServeOptions::new()
            .working_dir(self.working_dir)
            .output_dir(self.out_dir)
            .minify(self.minify)
            .host(self.host)
            .port(self.port);
        if let Some(config) = self.config {
            options = options.config_path(config);
        }
        for (suffix, loader) in self.loader {
            options = options.loader(suffix, loader);
        }
        for specifier in self.external {
            options = options.external(specifier);
        }
        options
    }
}
