use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sitelink_protocol::LinkType;
use sitelink_resolver::MatchThresholds;

use crate::error::{EngineError, Result};

pub const ENV_TOP_K: &str = "SITELINK_TOP_K";
pub const ENV_MIN_BRIDGE: &str = "SITELINK_MIN_BRIDGE";
pub const ENV_MIN_FUNNEL: &str = "SITELINK_MIN_FUNNEL";
pub const ENV_SEM_MIN: &str = "SITELINK_SEM_MIN";
pub const ENV_CTX_MIN: &str = "SITELINK_CTX_MIN";
pub const ENV_CONF_MIN: &str = "SITELINK_CONF_MIN";
pub const ENV_INTENT_REQUIRED: &str = "SITELINK_INTENT_REQUIRED";

const DEFAULT_TOP_K: usize = 6;

/// Site architecture style the selection policy is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteLayout {
    /// Multi-category site: bridges between clusters are welcome.
    #[default]
    Clusters,
    /// Strict single hierarchy: no cross-category bridges.
    Silo,
}

impl SiteLayout {
    pub const fn as_str(self) -> &'static str {
        match self {
            SiteLayout::Clusters => "clusters",
            SiteLayout::Silo => "silo",
        }
    }
}

impl fmt::Display for SiteLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clusters" | "cluster" => Ok(SiteLayout::Clusters),
            "silo" => Ok(SiteLayout::Silo),
            other => Err(format!(
                "unknown layout '{other}' (expected 'clusters' or 'silo')"
            )),
        }
    }
}

/// Minimum number of selected links per scored type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Quotas {
    pub bridge: usize,
    pub funnel: usize,
}

impl Quotas {
    pub const fn total(&self) -> usize {
        self.bridge + self.funnel
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionPolicy {
    /// Global cap on selected bridge and funnel links.
    pub top_k: usize,
    pub min_per_type: Quotas,
    pub enable_bridges: bool,
    pub enable_funnel: bool,
}

impl SelectionPolicy {
    /// The cap actually applied: quotas win over a smaller `top_k`.
    pub const fn effective_k(&self) -> usize {
        let quotas = self.min_per_type.total();
        if quotas > self.top_k {
            quotas
        } else {
            self.top_k
        }
    }

    pub const fn is_enabled(&self, link_type: LinkType) -> bool {
        match link_type {
            LinkType::Hierarchy => true,
            LinkType::Bridge => self.enable_bridges,
            LinkType::Funnel => self.enable_funnel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityThresholds {
    pub semantic_min: f64,
    pub contextual_min: f64,
    pub confidence_min: f64,
    pub intent_required: bool,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            semantic_min: 0.85,
            contextual_min: 0.65,
            confidence_min: 0.80,
            intent_required: true,
        }
    }
}

/// Linear blend used by the confidence scorer. The penalty is a magnitude that is
/// subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub contextual: f64,
    pub intent: f64,
    pub journey_bonus: f64,
    pub outlier_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.6,
            contextual: 0.35,
            intent: 0.05,
            journey_bonus: 0.05,
            outlier_penalty: 0.20,
        }
    }
}

/// Immutable engine configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub layout: SiteLayout,
    pub selection: SelectionPolicy,
    pub quality: QualityThresholds,
    pub scoring: ScoringWeights,
    pub matching: MatchThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_layout(SiteLayout::default())
    }
}

impl EngineConfig {
    #[must_use]
    pub fn for_layout(layout: SiteLayout) -> Self {
        let selection = match layout {
            SiteLayout::Clusters => SelectionPolicy {
                top_k: DEFAULT_TOP_K,
                min_per_type: Quotas {
                    bridge: 2,
                    funnel: 2,
                },
                enable_bridges: true,
                enable_funnel: true,
            },
            SiteLayout::Silo => SelectionPolicy {
                top_k: DEFAULT_TOP_K,
                min_per_type: Quotas {
                    bridge: 0,
                    funnel: 2,
                },
                enable_bridges: false,
                enable_funnel: true,
            },
        };
        Self {
            layout,
            selection,
            quality: QualityThresholds::default(),
            scoring: ScoringWeights::default(),
            matching: MatchThresholds::default(),
        }
    }

    pub fn from_file(path: &Path, default_layout: SiteLayout) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            EngineError::InvalidConfig(format!(
                "failed to read config file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_bytes(&bytes, default_layout)
    }

    /// Layout preset overlaid with a JSON or TOML document. A `layout` key in the
    /// document picks the preset.
    pub fn from_bytes(bytes: &[u8], default_layout: SiteLayout) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        let mut cfg = Self::for_layout(raw.layout.unwrap_or(default_layout));
        cfg.apply_raw(raw);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay `SITELINK_*` variables read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = read(ENV_TOP_K) {
            self.selection.top_k = parse_env(ENV_TOP_K, &value)?;
        }
        if let Some(value) = read(ENV_MIN_BRIDGE) {
            self.selection.min_per_type.bridge = parse_env(ENV_MIN_BRIDGE, &value)?;
        }
        if let Some(value) = read(ENV_MIN_FUNNEL) {
            self.selection.min_per_type.funnel = parse_env(ENV_MIN_FUNNEL, &value)?;
        }
        if let Some(value) = read(ENV_SEM_MIN) {
            self.quality.semantic_min = parse_env(ENV_SEM_MIN, &value)?;
        }
        if let Some(value) = read(ENV_CTX_MIN) {
            self.quality.contextual_min = parse_env(ENV_CTX_MIN, &value)?;
        }
        if let Some(value) = read(ENV_CONF_MIN) {
            self.quality.confidence_min = parse_env(ENV_CONF_MIN, &value)?;
        }
        if let Some(value) = read(ENV_INTENT_REQUIRED) {
            self.quality.intent_required = parse_env_bool(ENV_INTENT_REQUIRED, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_unit("quality.semantic_min", self.quality.semantic_min)?;
        validate_unit("quality.contextual_min", self.quality.contextual_min)?;
        validate_unit("quality.confidence_min", self.quality.confidence_min)?;
        validate_unit("matching.fuzzy_accept", self.matching.fuzzy_accept)?;
        validate_unit("matching.strict_equivalence", self.matching.strict_equivalence)?;

        for (key, weight) in [
            ("scoring.semantic", self.scoring.semantic),
            ("scoring.contextual", self.scoring.contextual),
            ("scoring.intent", self.scoring.intent),
            ("scoring.journey_bonus", self.scoring.journey_bonus),
            ("scoring.outlier_penalty", self.scoring.outlier_penalty),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{key} must be a non-negative number (got {weight})"
                )));
            }
        }

        if self.selection.effective_k() == 0 {
            return Err(EngineError::InvalidConfig(
                "selection.top_k must be at least 1 when no quotas are set".to_string(),
            ));
        }

        Ok(())
    }

    fn apply_raw(&mut self, raw: RawConfig) {
        if let Some(selection) = raw.selection {
            let target = &mut self.selection;
            if let Some(top_k) = selection.top_k {
                target.top_k = top_k;
            }
            if let Some(quotas) = selection.min_per_type {
                if let Some(bridge) = quotas.bridge {
                    target.min_per_type.bridge = bridge;
                }
                if let Some(funnel) = quotas.funnel {
                    target.min_per_type.funnel = funnel;
                }
            }
            if let Some(enabled) = selection.enable_bridges {
                target.enable_bridges = enabled;
            }
            if let Some(enabled) = selection.enable_funnel {
                target.enable_funnel = enabled;
            }
        }

        if let Some(quality) = raw.quality {
            let target = &mut self.quality;
            target.semantic_min = quality.semantic_min.unwrap_or(target.semantic_min);
            target.contextual_min = quality.contextual_min.unwrap_or(target.contextual_min);
            target.confidence_min = quality.confidence_min.unwrap_or(target.confidence_min);
            target.intent_required = quality.intent_required.unwrap_or(target.intent_required);
        }

        if let Some(scoring) = raw.scoring {
            let target = &mut self.scoring;
            target.semantic = scoring.semantic.unwrap_or(target.semantic);
            target.contextual = scoring.contextual.unwrap_or(target.contextual);
            target.intent = scoring.intent.unwrap_or(target.intent);
            target.journey_bonus = scoring.journey_bonus.unwrap_or(target.journey_bonus);
            target.outlier_penalty = scoring.outlier_penalty.unwrap_or(target.outlier_penalty);
        }

        if let Some(matching) = raw.matching {
            let target = &mut self.matching;
            target.fuzzy_accept = matching.fuzzy_accept.unwrap_or(target.fuzzy_accept);
            target.strict_equivalence = matching
                .strict_equivalence
                .unwrap_or(target.strict_equivalence);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    layout: Option<SiteLayout>,
    selection: Option<RawSelection>,
    quality: Option<RawQuality>,
    scoring: Option<RawScoring>,
    matching: Option<RawMatching>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSelection {
    top_k: Option<usize>,
    min_per_type: Option<RawQuotas>,
    enable_bridges: Option<bool>,
    enable_funnel: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQuotas {
    bridge: Option<usize>,
    funnel: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQuality {
    semantic_min: Option<f64>,
    contextual_min: Option<f64>,
    confidence_min: Option<f64>,
    intent_required: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScoring {
    semantic: Option<f64>,
    contextual: Option<f64>,
    intent: Option<f64>,
    journey_bonus: Option<f64>,
    outlier_penalty: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMatching {
    fuzzy_accept: Option<f64>,
    strict_equivalence: Option<f64>,
}

fn parse_raw(bytes: &[u8]) -> Result<RawConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes)
                .map_err(|err| EngineError::InvalidConfig(format!("{json_err}; {err}")))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                EngineError::InvalidConfig(format!(
                    "config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                ))
            })?;
            serde_json::to_value(toml_value).map_err(|err| {
                EngineError::InvalidConfig(format!("failed to convert TOML config: {err}"))
            })?
        }
    };

    serde_json::from_value(value)
        .map_err(|err| EngineError::InvalidConfig(format!("config parse error: {err}")))
}

fn validate_unit(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "{key} must be within [0, 1] (got {value})"
        )))
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| EngineError::InvalidConfig(format!("{name}='{value}': {err}")))
}

fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EngineError::InvalidConfig(format!(
            "{name}='{value}' is not a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn layout_presets() {
        let clusters = EngineConfig::for_layout(SiteLayout::Clusters);
        assert_eq!(clusters.selection.top_k, 6);
        assert_eq!(clusters.selection.min_per_type, Quotas { bridge: 2, funnel: 2 });
        assert!(clusters.selection.enable_bridges);

        let silo = EngineConfig::for_layout(SiteLayout::Silo);
        assert_eq!(silo.selection.min_per_type, Quotas { bridge: 0, funnel: 2 });
        assert!(!silo.selection.enable_bridges);
        assert!(silo.selection.enable_funnel);
    }

    #[test]
    fn effective_k_grows_to_cover_quotas() {
        let mut policy = EngineConfig::default().selection;
        policy.top_k = 3;
        policy.min_per_type = Quotas { bridge: 3, funnel: 2 };
        assert_eq!(policy.effective_k(), 5);
    }

    #[test]
    fn json_overlay_keeps_unset_defaults() {
        let bytes = br#"{"selection": {"top_k": 4, "min_per_type": {"funnel": 1}}}"#;
        let cfg = EngineConfig::from_bytes(bytes, SiteLayout::Clusters).unwrap();
        assert_eq!(cfg.selection.top_k, 4);
        assert_eq!(cfg.selection.min_per_type, Quotas { bridge: 2, funnel: 1 });
        assert_eq!(cfg.quality, QualityThresholds::default());
    }

    #[test]
    fn toml_overlay_is_accepted() {
        let bytes = br#"
layout = "silo"

[quality]
semantic_min = 0.9
intent_required = false
"#;
        let cfg = EngineConfig::from_bytes(bytes, SiteLayout::Clusters).unwrap();
        assert_eq!(cfg.layout, SiteLayout::Silo);
        assert!(!cfg.selection.enable_bridges);
        assert_eq!(cfg.quality.semantic_min, 0.9);
        assert!(!cfg.quality.intent_required);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let bytes = br#"{"selection": {"top_k": 4, "max_links": 9}}"#;
        let err = EngineConfig::from_bytes(bytes, SiteLayout::Clusters).unwrap_err();
        assert!(err.to_string().contains("max_links"), "{err}");
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let bytes = br#"{"quality": {"confidence_min": 1.5}}"#;
        let err = EngineConfig::from_bytes(bytes, SiteLayout::Clusters).unwrap_err();
        assert!(err.to_string().contains("quality.confidence_min"), "{err}");
    }

    #[test]
    fn zero_cap_needs_quotas() {
        let bytes = br#"{"selection": {"top_k": 0, "min_per_type": {"bridge": 0, "funnel": 0}}}"#;
        assert!(EngineConfig::from_bytes(bytes, SiteLayout::Clusters).is_err());

        let bytes = br#"{"selection": {"top_k": 0}}"#;
        let cfg = EngineConfig::from_bytes(bytes, SiteLayout::Clusters).unwrap();
        assert_eq!(cfg.selection.effective_k(), 4);
    }

    #[test]
    fn env_overrides_apply_on_top() {
        let cfg = EngineConfig::default()
            .with_env_overrides(env(&[
                (ENV_TOP_K, "8"),
                (ENV_MIN_BRIDGE, "1"),
                (ENV_SEM_MIN, "0.7"),
                (ENV_INTENT_REQUIRED, "no"),
            ]))
            .unwrap();
        assert_eq!(cfg.selection.top_k, 8);
        assert_eq!(cfg.selection.min_per_type, Quotas { bridge: 1, funnel: 2 });
        assert_eq!(cfg.quality.semantic_min, 0.7);
        assert!(!cfg.quality.intent_required);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let cfg = EngineConfig::default()
            .with_env_overrides(env(&[(ENV_TOP_K, "  ")]))
            .unwrap();
        assert_eq!(cfg.selection.top_k, 6);
    }

    #[test]
    fn malformed_env_value_names_the_variable() {
        let err = EngineConfig::default()
            .with_env_overrides(env(&[(ENV_CONF_MIN, "high")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CONF_MIN), "{err}");
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitelink.toml");
        std::fs::write(&path, "[selection]\ntop_k = 9\n").unwrap();

        let cfg = EngineConfig::from_file(&path, SiteLayout::Silo).unwrap();
        assert_eq!(cfg.layout, SiteLayout::Silo);
        assert_eq!(cfg.selection.top_k, 9);

        let missing = EngineConfig::from_file(&dir.path().join("missing.toml"), SiteLayout::Silo);
        assert!(matches!(missing, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn layout_parses_from_str() {
        assert_eq!("Silo".parse::<SiteLayout>(), Ok(SiteLayout::Silo));
        assert!("mesh".parse::<SiteLayout>().is_err());
    }
}
