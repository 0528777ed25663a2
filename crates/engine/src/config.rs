//! Engine configuration.
//!
//! Every knob has a default matching the reference setup (presence-count
//! matrix, BM25 weighting, ALS + item-item, placeholder `999999`), so most
//! callers only override one or two fields with the `with_*` builders or
//! from a JSON document.

use interactions::{DEFAULT_PLACEHOLDER_ITEM, ItemId, RecError, Result, ValueMode, Weighting};
use models::{FactorizationKind, FactorizationParams, NeighborhoodKind, NeighborhoodParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How records of one (user, item) pair become a matrix value
    pub value_mode: ValueMode,
    /// Column weighting applied before both models are fitted
    pub weighting: Weighting,
    pub factorization: FactorizationKind,
    pub factorization_params: FactorizationParams,
    pub neighborhood: NeighborhoodKind,
    pub neighborhood_params: NeighborhoodParams,
    /// Sentinel item id that must never be recommended
    pub placeholder_item: ItemId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            value_mode: ValueMode::PresenceCount,
            weighting: Weighting::bm25(),
            factorization: FactorizationKind::Als,
            factorization_params: FactorizationParams::default(),
            neighborhood: NeighborhoodKind::ItemItem,
            neighborhood_params: NeighborhoodParams::default(),
            placeholder_item: DEFAULT_PLACEHOLDER_ITEM,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    ///
    /// Unknown tags surface as the same errors their `FromStr` parsers give
    /// (`InvalidValueMode`, `InvalidWeighting`, `UnrecognizedModel`); any
    /// other malformed input is `InvalidConfig`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json).map_err(|e| RecError::InvalidConfig(e.to_string()))?;
        check_tags(&raw)?;
        serde_json::from_value(raw).map_err(|e| RecError::InvalidConfig(e.to_string()))
    }

    pub fn with_value_mode(mut self, value_mode: ValueMode) -> Self {
        self.value_mode = value_mode;
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_factorization(mut self, kind: FactorizationKind, params: FactorizationParams) -> Self {
        self.factorization = kind;
        self.factorization_params = params;
        self
    }

    pub fn with_neighborhood(mut self, kind: NeighborhoodKind, params: NeighborhoodParams) -> Self {
        self.neighborhood = kind;
        self.neighborhood_params = params;
        self
    }

    pub fn with_placeholder_item(mut self, placeholder_item: ItemId) -> Self {
        self.placeholder_item = placeholder_item;
        self
    }
}

/// Run every tag field present in `raw` through its typed parser
fn check_tags(raw: &Value) -> Result<()> {
    let tag = |field: &str| raw.get(field).and_then(Value::as_str);

    if let Some(value_mode) = tag("value_mode") {
        value_mode.parse::<ValueMode>()?;
    }
    if let Some(kind) = raw
        .get("weighting")
        .and_then(|w| w.get("kind"))
        .and_then(Value::as_str)
    {
        kind.parse::<Weighting>()?;
    }
    if let Some(kind) = tag("factorization") {
        kind.parse::<FactorizationKind>()?;
    }
    if let Some(kind) = tag("neighborhood") {
        kind.parse::<NeighborhoodKind>()?;
    }
    Ok(())
}
