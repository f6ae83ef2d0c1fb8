//! Clipmark Timeline - Clip data model
//!
//! Implements how a clip's parameters vary over time:
//! - Point maps for speed and crop, with stretch/shrink on boundary moves
//! - Output-duration integration of a speed map
//! - Marker pairs with snapshot undo/redo
//! - Sessions, settings layering and the versioned markers file

pub mod crop_map;
pub mod duration;
pub mod history;
pub mod marker_pair;
pub mod point;
pub mod point_map;
pub mod serialization;
pub mod session;
pub mod settings;
pub mod speed_map;

pub use crop_map::{crop_size, interpolate_crop, CropMap, CropSize, CropSizeStats};
pub use duration::compute_output_duration;
pub use history::History;
pub use marker_pair::{ClipState, MarkerPair};
pub use point::{CropPoint, EaseIn, MapPoint, SpeedPoint};
pub use point_map::{PointMap, SectionCursor, SectionMode, Side};
pub use serialization::{MarkerPairRecord, MarkersFile, CURRENT_VERSION};
pub use session::{ClipSession, GlobalSettings};
pub use settings::{EncodeSettings, LoopMode, MinterpMode, SettingsLayer};
pub use speed_map::{interpolate_speed, SpeedMap};
