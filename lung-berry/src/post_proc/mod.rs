//! 三维连通域后处理.

mod components;
mod lungs;

pub use components::{label_components, Component, ComponentMap, Connectivity};
pub use lungs::{is_lung_pair, ComponentPostprocessor, LungSelection, Postprocessed};
