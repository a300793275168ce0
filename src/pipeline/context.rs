use std::collections::BTreeMap;

use super::PipelineConfig;
use crate::manifest::{SlotManifest, SlotMeta};
use crate::operations::finishing::StepContext;

/// State shared by the stages of one run.
///
/// Created when a run starts and dropped when it ends; stages read it and
/// never mutate it.
#[derive(Debug)]
pub struct PipelineContext<'a> {
    pub config: &'a PipelineConfig,
    pub manifest: SlotManifest,
    /// Configured socket slots plus slots the builder flagged, sorted.
    pub socket_slots: Vec<u8>,
}

impl<'a> PipelineContext<'a> {
    /// Resolves the slot metadata reported by the builder.
    #[must_use]
    pub fn new(config: &'a PipelineConfig, meta: &BTreeMap<u8, SlotMeta>) -> Self {
        let manifest = SlotManifest::resolve(meta);
        let mut socket_slots = config.socket_slots.clone();
        socket_slots.extend(manifest.socket_slots());
        socket_slots.sort_unstable();
        socket_slots.dedup();
        Self {
            config,
            manifest,
            socket_slots,
        }
    }

    /// Inputs for the finishing stack.
    #[must_use]
    pub fn step_context(&self) -> StepContext<'_> {
        StepContext {
            manifest: &self.manifest,
            scale: self.config.global_scale,
            seed: self.config.seed,
        }
    }
}
