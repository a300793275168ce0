mod apply_actions;
mod classify;

pub use apply_actions::{ApplyEdgeActions, EdgeAction, EdgeActionMap};
pub use classify::{ClassifyEdgeRoles, ClassifyReport, SHADING_THRESHOLD};
