pub mod cli;
pub mod comps;
pub mod error;
pub mod helpers;
pub mod mapping;
pub mod model;
pub mod output;
pub mod postprocess;
pub mod preprocess;

pub use crate::cli::Args;
pub use crate::comps::{best_comps, personal_affinity, score, Composition, Lobby, ScoredComp};
pub use crate::error::{DetectError, DetectResult};
pub use crate::helpers::draw_detections;
pub use crate::mapping::load_champion_mapping;
pub use crate::model::UnitModel;
pub use crate::output::{format_detections, UnitRecord};
pub use crate::postprocess::{decode, iou, non_maximum_suppression, Detection};
pub use crate::preprocess::{PreprocessConfig, Processor};
