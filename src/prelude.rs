//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types.
//
// Usage:
//   use limelight_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine facade
pub use crate::engine::{Engine, EngineBuilder};

// Scene system
pub use crate::core::scene::{Scene, TransitionKind};
pub use crate::core::stage::{SceneId, Stage, TickControl};

// Scene tree building blocks
pub use crate::core::frame::Frame;
pub use crate::core::group::{ObjectGroup, ObjectId};
pub use crate::core::object::{DrawableObject, FrameClock};

// Raster & geometry
pub use crate::core::geometry::{Point, Rect, Size};
pub use crate::core::surface::{Rgba, Surface};

// Events
pub use crate::core::event::{KeyCode, MouseButton, SystemEvent};
