//=========================================================================
// Limelight Engine — Library Root
//
// This crate defines the public API surface of the Limelight Engine, a
// retained-mode 2D scene engine: scenes hold frames and drawables, every
// drawable animates independently through per-tick tween queues, and
// scene hand-offs run through a veiled transition state machine.
//
// Responsibilities:
// - Expose the core scene system (`core`) and the `Engine` facade
// - Keep OS integration (`platform`) hidden from end users
// - Provide clean separation between the high-level facade and the
//   scene/animation subsystems
//
// Typical usage:
// ```no_run
// use limelight_engine::EngineBuilder;
// use limelight_engine::core::TransitionKind;
//
// fn main() {
//     EngineBuilder::new()
//         .build()
//         .init(|stage| {
//             let opening = stage.new_scene();
//             stage.set_active(opening, TransitionKind::Fade, TransitionKind::None);
//         })
//         .run();
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the whole scene system (stage, scenes, frames,
// drawables, surfaces, events). It is fully usable without the engine
// facade — tests and headless tools drive `Stage::step` directly.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` contains OS-specific logic (window, Winit integration,
// presentation) and is kept private; it is not part of the API surface.
//
// `engine` defines the engine entry point and the runtime loop.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the facade so applications can simply
// `use limelight_engine::EngineBuilder;`.
//
pub use engine::{Engine, EngineBuilder};
