use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::balance::{BalanceOptions, Construction, Objective, Weights};
use crate::{lblog_debug, Error, Result};

const DEFAULT_CHART_WIDTH: u16 = 100;

/// Balancing defaults read from `~/.linebal/linebal.toml`.
///
/// Every field is optional; command line flags override whatever is set here.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub objective: Option<Objective>,
    pub threshold: Option<f64>,
    pub w_cost_time: Option<f64>,
    pub w_cost_metabolic: Option<f64>,
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub strict_precedence: bool,
    pub construction: Option<Construction>,
    pub overshoot: Option<f64>,
    pub chart_width: Option<u16>,
}

impl Config {
    pub fn linebal_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".linebal"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::linebal_dir()?.join("linebal.toml"))
    }

    /// Load the default config file, falling back to defaults when it is absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            lblog_debug!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load an explicitly named config file; `~/` is expanded.
    pub fn load_from(path: &Path) -> Result<Self> {
        let path = expand_tilde(&path.to_string_lossy());
        lblog_debug!("Config::load_from path={}", path.display());
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        lblog_debug!("Config loaded: {:?}", config);
        Ok(config)
    }

    pub fn effective_chart_width(&self) -> u16 {
        self.chart_width.unwrap_or(DEFAULT_CHART_WIDTH)
    }

    /// Balancing options with config values layered over the defaults.
    pub fn balance_options(&self) -> BalanceOptions {
        let defaults = BalanceOptions::default();
        BalanceOptions {
            objective: self.objective.unwrap_or(defaults.objective),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            weights: Weights {
                cycle_time: self.w_cost_time.unwrap_or(defaults.weights.cycle_time),
                metabolic_cost: self
                    .w_cost_metabolic
                    .unwrap_or(defaults.weights.metabolic_cost),
            },
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            strict_precedence: self.strict_precedence || defaults.strict_precedence,
            construction: self.construction.unwrap_or(defaults.construction),
            overshoot: self.overshoot.unwrap_or(defaults.overshoot),
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
