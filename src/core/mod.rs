//=========================================================================
// Core Scene System
//
// Everything that lives on the logic thread: the scene stack, scenes,
// frames, drawables, their animation queues, and the software raster
// they paint into. Nothing in here touches the OS — events come in as
// `SystemEvent`s, pixels go out as a `Surface`.
//
// Architecture:
//   Stage                      (scene stack + per-tick drive)
//     └─ Scene                 (paint group, background, transitions)
//          ├─ ObjectGroup      (paint/dispatch owner of all drawables)
//          │    └─ DrawableObject
//          └─ Frame tree       (layout + bookkeeping over ObjectIds)
//
//=========================================================================

//=== Module Declarations =================================================

pub mod event;
pub mod frame;
pub mod geometry;
pub mod group;
pub mod object;
pub mod scene;
pub mod stage;
pub mod surface;

//=== Public API ==========================================================

pub use event::{KeyCode, MouseButton, SystemEvent};
pub use frame::Frame;
pub use geometry::{Point, Rect, Size};
pub use group::{ObjectGroup, ObjectId};
pub use object::{Callback, DrawableObject, FrameClock, FADE_STEP, ROTATE_STEP, ZOOM_STEP};
pub use scene::{Scene, TransitionKind};
pub use stage::{SceneId, Stage, TickControl};
pub use surface::{Rgba, Surface};
