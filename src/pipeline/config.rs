use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::operations::edges::EdgeActionMap;
use crate::operations::fields::FieldParams;
use crate::operations::finishing::FinishingParams;
use crate::operations::query::DensityTable;
use crate::operations::seams::SeamParams;
use crate::operations::transform::Pivot;
use crate::topology::MAX_SLOT;

/// Everything a run needs besides the shape builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Uniform scale applied about the origin before anything else moves.
    pub global_scale: f64,
    pub pivot: Pivot,
    /// Infer roles for untagged edges.
    pub auto_classify: bool,
    /// Merge distance for the topology merge, before scaling.
    pub weld_distance: f64,
    pub edge_actions: EdgeActionMap,
    pub finishing: FinishingParams,
    pub fields: FieldParams,
    pub seams: SeamParams,
    /// Slots whose face islands become sockets, in addition to slots the
    /// builder flags.
    pub socket_slots: Vec<u8>,
    pub densities: DensityTable,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            global_scale: 1.0,
            pivot: Pivot::default(),
            auto_classify: true,
            weld_distance: 1e-5,
            edge_actions: EdgeActionMap::default(),
            finishing: FinishingParams::default(),
            fields: FieldParams::default(),
            seams: SeamParams::default(),
            socket_slots: Vec::new(),
            densities: DensityTable::default(),
            seed: 0,
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a JSON configuration. Missing fields take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for invalid values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("global_scale", self.global_scale, f64::MIN_POSITIVE, f64::MAX)?;
        ConfigError::check_range("weld_distance", self.weld_distance, 0.0, f64::MAX)?;
        for &slot in &self.socket_slots {
            ConfigError::check_range("socket_slots", f64::from(slot), 0.0, f64::from(MAX_SLOT))?;
        }
        ConfigError::check_range("densities.fallback", self.densities.fallback, 0.0, f64::MAX)?;
        self.finishing.validate()?;
        self.fields.validate()?;
        self.seams.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::fields::ThicknessOrFlow;

    #[test]
    fn empty_json_is_the_default() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn nested_sections_parse() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "global_scale": 2.0,
                "pivot": "ZMin",
                "socket_slots": [9],
                "finishing": { "triangulate": true, "decay": { "probability": 0.2 } },
                "fields": { "thickness_or_flow": { "mode": "flow", "streak": 0.92 } },
                "seams": { "strategies": [{ "strategy": "material_boundary" }] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.pivot, Pivot::ZMin);
        assert!(config.finishing.triangulate);
        assert!(matches!(
            config.fields.thickness_or_flow,
            Some(ThicknessOrFlow::Flow(_))
        ));
        assert_eq!(config.seams.strategies.len(), 1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{ "global_scale": 0.0 }"#),
            Err(ConfigError::OutOfRange {
                parameter: "global_scale",
                ..
            })
        ));
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{ "socket_slots": [12] }"#),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{ "fields": { "thickness_or_flow": { "mode": "flow", "streak": 0.5 } } }"#),
            Err(ConfigError::OutOfRange {
                parameter: "flow.streak",
                ..
            })
        ));
        assert!(matches!(
            PipelineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
