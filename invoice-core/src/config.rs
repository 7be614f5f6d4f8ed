//! Renderer configuration, resolved once at startup.

use std::path::PathBuf;

use ::config::{Config, Environment, Map};
use serde::Deserialize;

use crate::error::RenderError;

/// Where the header logo comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Seller block printed next to the logo.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub address_lines: Vec<String>,
    pub email: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        CompanyProfile {
            name: "Umami Food Services".to_string(),
            address_lines: vec![
                "14841 Moran St".to_string(),
                "Westminster, CA 92683 US".to_string(),
            ],
            email: "sales@umamiservices.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub logo: LogoSource,
    pub company: CompanyProfile,
    /// Suggested filename in `Content-Disposition`.
    pub filename: String,
    /// Due date = invoice date + this many days.
    pub due_in_days: u32,
    /// Flate-compress page content.
    pub compress: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig {
            logo: LogoSource::Path(PathBuf::from("images/Logo.png")),
            company: CompanyProfile::default(),
            filename: "invoice.pdf".to_string(),
            due_in_days: 0,
            compress: true,
        }
    }
}

/// `INVOICE_*` overrides. Each key is the variable name without the
/// prefix, lowercased (`INVOICE_DUE_DAYS` is `due_days`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvOverrides {
    logo_path: Option<PathBuf>,
    filename: Option<String>,
    company_name: Option<String>,
    due_days: Option<u32>,
    compress: Option<bool>,
}

const ENV_PREFIX: &str = "INVOICE";

impl RendererConfig {
    /// Defaults overridden by `INVOICE_*` environment variables,
    /// including any set in a `.env` file.
    pub fn from_env() -> Result<Self, RenderError> {
        dotenvy::dotenv().ok();
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults overridden by the given `INVOICE_*` variables instead
    /// of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self, RenderError> {
        let overrides: EnvOverrides = Config::builder()
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|err| RenderError::Config(err.to_string()))?;
        Ok(RendererConfig::default().with_overrides(overrides))
    }

    fn with_overrides(mut self, overrides: EnvOverrides) -> Self {
        if let Some(path) = overrides.logo_path {
            self.logo = LogoSource::Path(path);
        }
        if let Some(name) = overrides.filename {
            self.filename = name;
        }
        if let Some(name) = overrides.company_name {
            self.company.name = name;
        }
        if let Some(days) = overrides.due_days {
            self.due_in_days = days;
        }
        if let Some(compress) = overrides.compress {
            self.compress = compress;
        }
        self
    }
}
