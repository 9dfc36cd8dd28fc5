//! Engine configuration: `[engine]` thresholds plus the `[[sources]]` table.
//!
//! Lookup order:
//! 1) `$INTEL_CONFIG_PATH` (must exist)
//! 2) `config/intelligence.toml`
//! 3) built-in defaults (no sources; the engine cannot be built from these)
//!
//! `INTEL_ADAPTER_TIMEOUT_MS` overrides `engine.adapter_timeout_ms`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::{warn, Span};

use crate::adapters::{self, FixtureAdapter, HttpJsonAdapter, SharedAdapter};
use crate::convergence::{ConvergenceAnalyzer, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_CONVERGENT};
use crate::engine::{IntelligenceEngine, Pipeline};
use crate::fanout::{FanOutCoordinator, DEFAULT_ADAPTER_TIMEOUT};
use crate::source::{Source, SourceFamily, SourceRegistry};

pub const ENV_CONFIG_PATH: &str = "INTEL_CONFIG_PATH";
pub const ENV_ADAPTER_TIMEOUT_MS: &str = "INTEL_ADAPTER_TIMEOUT_MS";
pub const DEFAULT_CONFIG_PATH: &str = "config/intelligence.toml";

fn default_timeout_ms() -> u64 {
    DEFAULT_ADAPTER_TIMEOUT.as_millis() as u64
}
fn default_threshold() -> usize {
    DEFAULT_CONVERGENCE_THRESHOLD
}
fn default_max_convergent() -> usize {
    DEFAULT_MAX_CONVERGENT
}
fn default_volume_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default = "default_timeout_ms")]
    pub adapter_timeout_ms: u64,
    #[serde(default = "default_threshold")]
    pub convergence_threshold: usize,
    #[serde(default = "default_max_convergent")]
    pub max_convergent: usize,
    /// Confidence reported when every source failed.
    #[serde(default)]
    pub confidence_floor: u8,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: default_timeout_ms(),
            convergence_threshold: default_threshold(),
            max_convergent: default_max_convergent(),
            confidence_floor: 0,
        }
    }
}

impl EngineSection {
    /// Convergence needs at least the default number of distinct sources, and
    /// the retained list cannot outgrow the three lifecycle bands.
    pub fn validate(&self) -> Result<()> {
        if self.convergence_threshold < DEFAULT_CONVERGENCE_THRESHOLD {
            bail!(
                "engine.convergence_threshold must be >= {DEFAULT_CONVERGENCE_THRESHOLD}, got {}",
                self.convergence_threshold
            );
        }
        if !(1..=DEFAULT_MAX_CONVERGENT).contains(&self.max_convergent) {
            bail!(
                "engine.max_convergent must be in 1..={DEFAULT_MAX_CONVERGENT}, got {}",
                self.max_convergent
            );
        }
        if self.confidence_floor > 100 {
            bail!("engine.confidence_floor must be <= 100, got {}", self.confidence_floor);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub id: String,
    pub family: SourceFamily,
    pub fusion_weight: f32,
    #[serde(default = "default_volume_scale")]
    pub volume_scale: f64,
    #[serde(default)]
    pub reach_scale: f64,
    /// HTTP JSON endpoint serving this source.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// JSON fixture file, relative to the config file.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntelligenceConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Directory that relative fixture paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl IntelligenceConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: IntelligenceConfig = toml::from_str(s).context("parsing intelligence config")?;
        cfg.engine.validate().context("invalid [engine] section")?;
        Ok(cfg)
    }

    /// Load from an explicit path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading intelligence config from {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&content)?;
        cfg.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(ENV_ADAPTER_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.engine.adapter_timeout_ms = ms,
                _ => warn!(target: "config", value = %raw, "ignoring invalid INTEL_ADAPTER_TIMEOUT_MS"),
            }
        }
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.adapter_timeout_ms)
    }

    /// Validated registry built from `[[sources]]`.
    pub fn registry(&self) -> Result<SourceRegistry> {
        let sources = self
            .sources
            .iter()
            .map(|s| {
                Source::new(s.id.as_str(), s.family, s.fusion_weight)
                    .with_influence(s.volume_scale, s.reach_scale)
            })
            .collect();
        SourceRegistry::new(sources).context("invalid [[sources]] table")
    }

    /// One adapter per configured source, keyed by source id.
    pub fn adapters(&self) -> Result<Vec<(String, SharedAdapter)>> {
        let timeout = self.adapter_timeout();
        self.sources
            .iter()
            .map(|s| -> Result<(String, SharedAdapter)> {
                let adapter: SharedAdapter = match (&s.endpoint, &s.fixture) {
                    (Some(url), None) => Arc::new(
                        HttpJsonAdapter::new(s.id.as_str(), url.as_str())
                            .with_timeout(timeout)
                            .with_context(|| format!("http adapter for {}", s.id))?,
                    ),
                    (None, Some(file)) => {
                        let path = self.base_dir.join(file);
                        Arc::new(FixtureAdapter::from_file(s.id.as_str(), &path)?)
                    }
                    (Some(_), Some(_)) => {
                        bail!("source {} sets both endpoint and fixture", s.id)
                    }
                    (None, None) => bail!("source {} needs an endpoint or a fixture", s.id),
                };
                Ok((s.id.clone(), adapter))
            })
            .collect()
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        self.engine.validate().context("invalid [engine] section")?;
        Ok(Pipeline::new(
            ConvergenceAnalyzer::new(self.engine.convergence_threshold, self.engine.max_convergent),
            self.engine.confidence_floor,
        ))
    }

    /// Wire registry, adapters and thresholds into a ready engine. Events from
    /// the engine and its coordinator are emitted under `span`.
    pub fn build_engine(&self, span: Span) -> Result<IntelligenceEngine> {
        let registry = self.registry()?;
        let bound = adapters::bind(&registry, self.adapters()?).context("binding adapters")?;
        let coordinator =
            FanOutCoordinator::new(bound, self.adapter_timeout()).with_span(span.clone());
        Ok(IntelligenceEngine::new(coordinator, self.pipeline()?).with_span(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    const SAMPLE: &str = r#"
[engine]
adapter_timeout_ms = 1500
max_convergent = 5

[[sources]]
id = "social.tiktok"
family = "social"
fusion_weight = 0.4
reach_scale = 0.3
fixture = "tiktok.json"

[[sources]]
id = "news"
family = "news"
fusion_weight = 0.3
endpoint = "http://127.0.0.1:9/news"
"#;

    #[test]
    fn parses_sections_with_defaults() {
        let cfg = IntelligenceConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.engine.adapter_timeout_ms, 1500);
        assert_eq!(cfg.engine.convergence_threshold, DEFAULT_CONVERGENCE_THRESHOLD);
        assert_eq!(cfg.engine.max_convergent, 5);
        assert_eq!(cfg.engine.confidence_floor, 0);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].volume_scale, 1.0);
        assert_eq!(cfg.sources[1].family, SourceFamily::News);

        let reg = cfg.registry().unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(cfg.pipeline().unwrap().convergence().limit(), 5);
    }

    #[test]
    fn convergence_bounds_are_enforced() {
        for bad in [
            "[engine]\nconvergence_threshold = 1\n",
            "[engine]\nconvergence_threshold = 2\n",
            "[engine]\nmax_convergent = 0\n",
            "[engine]\nmax_convergent = 20\n",
            "[engine]\nconfidence_floor = 150\n",
        ] {
            assert!(IntelligenceConfig::from_toml_str(bad).is_err(), "accepted {bad:?}");
        }

        let ok = IntelligenceConfig::from_toml_str(
            "[engine]\nconvergence_threshold = 4\nmax_convergent = 8\n",
        )
        .unwrap();
        let p = ok.pipeline().unwrap();
        assert_eq!(p.convergence().threshold(), 4);
        assert_eq!(p.convergence().limit(), 8);

        // values set after parsing are checked again when the pipeline is built
        let mut cfg = IntelligenceConfig::default();
        cfg.engine.convergence_threshold = 1;
        assert!(cfg.pipeline().is_err());
        cfg.engine.convergence_threshold = 3;
        cfg.engine.max_convergent = 9;
        assert!(cfg.pipeline().is_err());
        assert!(cfg.build_engine(Span::none()).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let bad = "[engine]\nadapter_timeout = 5\n";
        assert!(IntelligenceConfig::from_toml_str(bad).is_err());
    }

    #[test]
    fn source_needs_exactly_one_backend() {
        let both = r#"
[[sources]]
id = "news"
family = "news"
fusion_weight = 0.3
endpoint = "http://localhost/x"
fixture = "x.json"
"#;
        let cfg = IntelligenceConfig::from_toml_str(both).unwrap();
        assert!(cfg.adapters().is_err());

        let neither = "[[sources]]\nid = \"news\"\nfamily = \"news\"\nfusion_weight = 0.3\n";
        let cfg = IntelligenceConfig::from_toml_str(neither).unwrap();
        assert!(cfg.adapters().is_err());
    }

    #[test]
    fn overweight_registry_is_rejected() {
        let heavy = r#"
[[sources]]
id = "a"
family = "news"
fusion_weight = 0.7
endpoint = "http://localhost/a"

[[sources]]
id = "b"
family = "news"
fusion_weight = 0.7
endpoint = "http://localhost/b"
"#;
        let cfg = IntelligenceConfig::from_toml_str(heavy).unwrap();
        assert!(cfg.registry().is_err());
        assert!(cfg.build_engine(Span::none()).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_ADAPTER_TIMEOUT_MS);

        // nothing on disk: built-in defaults
        let cfg = IntelligenceConfig::load_default().unwrap();
        assert!(cfg.sources.is_empty());
        assert_eq!(cfg.adapter_timeout(), DEFAULT_ADAPTER_TIMEOUT);

        // env path wins, fixtures resolve next to the file
        let dir = tmp.path().join("cfg");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("intelligence.toml"), SAMPLE).unwrap();
        env::set_var(ENV_CONFIG_PATH, dir.join("intelligence.toml"));
        env::set_var(ENV_ADAPTER_TIMEOUT_MS, "250");
        let cfg = IntelligenceConfig::load_default().unwrap();
        assert_eq!(cfg.base_dir, dir);
        assert_eq!(cfg.adapter_timeout(), Duration::from_millis(250));

        // missing env path is an error
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(IntelligenceConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_ADAPTER_TIMEOUT_MS);
        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn invalid_timeout_override_is_ignored() {
        env::set_var(ENV_ADAPTER_TIMEOUT_MS, "soon");
        let mut cfg = IntelligenceConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.adapter_timeout(), DEFAULT_ADAPTER_TIMEOUT);
        env::remove_var(ENV_ADAPTER_TIMEOUT_MS);
    }

    #[test]
    fn fixture_sources_build_an_engine() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("tiktok.json"),
            r##"{"family":"social","platform":"tiktok","trending_hashtags":[{"tag":"#ramen","mentions":3}]}"##,
        )
        .unwrap();
        let toml = r#"
[[sources]]
id = "social.tiktok"
family = "social"
fusion_weight = 0.4
fixture = "tiktok.json"
"#;
        let mut cfg = IntelligenceConfig::from_toml_str(toml).unwrap();
        cfg.base_dir = tmp.path().to_path_buf();
        let engine = cfg.build_engine(Span::none()).unwrap();
        assert_eq!(engine.coordinator().len(), 1);
    }
}
