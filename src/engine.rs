//=========================================================================
// Limelight Engine
//
// Main entry point and coordinator.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_fps()              ├─ spawns the core thread
//         ├─ with_size()             │    (Stage::step at fixed rate)
//         ├─ with_title()            └─ runs the platform loop,
//         └─ with_channel_capacity()    blocks until exit
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, TryRecvError};
use log::{error, info, trace};

use std::thread;
use std::time::{Duration, Instant};

//=== Internal Dependencies ===============================================

use crate::core::stage::{Stage, TickControl};
use crate::platform::{Platform, PlatformConfig, RenderedFrame};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **FPS**: 60.0 (controller ticks per second)
/// - **Size**: 800x600 logical pixels
/// - **Title**: "Limelight"
/// - **Channel capacity**: 128 events
///
/// # Examples
///
/// ```no_run
/// use limelight_engine::EngineBuilder;
/// use limelight_engine::core::TransitionKind;
///
/// EngineBuilder::new()
///     .with_fps(30.0)
///     .with_title("Demo")
///     .build()
///     .init(|stage| {
///         let menu = stage.new_scene();
///         stage.set_active(menu, TransitionKind::Fade, TransitionKind::None);
///     })
///     .run();
/// ```
pub struct EngineBuilder {
    fps: f64,
    width: u32,
    height: u32,
    title: String,
    channel_capacity: usize,
}

impl EngineBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            fps: 60.0,
            width: 800,
            height: 600,
            title: "Limelight".to_string(),
            channel_capacity: 128,
        }
    }

    /// Sets the controller tick rate. This is both the render cadence
    /// and the rate animation queues drain at.
    ///
    /// # Panics
    ///
    /// Panics if `fps <= 0.0`.
    pub fn with_fps(mut self, fps: f64) -> Self {
        assert!(fps > 0.0, "FPS must be positive, got {fps}");
        self.fps = fps;
        self
    }

    /// Sets the initial logical window size.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "window size must be non-zero");
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the platform → core event channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Builds the engine. The stage starts with an empty scene stack;
    /// register and activate scenes in [`Engine::init`].
    pub fn build(self) -> Engine {
        info!(
            "building engine ({} fps, {}x{}, channel {})",
            self.fps, self.width, self.height, self.channel_capacity
        );
        Engine {
            stage: Stage::new(self.width, self.height, self.fps as f32),
            fps: self.fps,
            width: self.width,
            height: self.height,
            title: self.title,
            channel_capacity: self.channel_capacity,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Engine runtime: one [`Stage`] driven at a fixed rate on the core
/// thread, presented through the platform on the main thread.
pub struct Engine {
    stage: Stage,
    fps: f64,
    width: u32,
    height: u32,
    title: String,
    channel_capacity: usize,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// One-shot setup hook: build scenes, register drawables, bind
    /// actions, and activate the opening scene before the loop starts.
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut Stage),
    {
        info!("initializing stage");
        init_fn(&mut self.stage);
        self
    }

    //--- Execution --------------------------------------------------------

    /// Starts the runtime and blocks until the application exits.
    ///
    /// # Lifecycle
    ///
    /// 1. Creates the two bridges (events in, frames out)
    /// 2. Spawns the core thread ticking the stage at the configured FPS
    /// 3. Runs the platform event loop on this thread (blocks here)
    /// 4. On window close or an empty scene stack, both sides unwind and
    ///    the core thread is joined
    pub fn run(self) {
        info!("starting engine runtime ({} fps)", self.fps);

        let (event_tx, event_rx) = bounded(self.channel_capacity);
        let (frame_tx, frame_rx) = bounded::<RenderedFrame>(1);
        let tick = Duration::from_secs_f64(1.0 / self.fps);
        let mut stage = self.stage;

        //--- Core thread: fixed-rate stage driving ------------------------
        let core_handle = thread::spawn(move || {
            let mut events = Vec::new();
            loop {
                let tick_start = Instant::now();

                events.clear();
                let mut disconnected = false;
                loop {
                    match event_rx.try_recv() {
                        Ok(event) => events.push(event),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }
                if disconnected {
                    info!("platform disconnected, core thread exiting");
                    break;
                }

                if let TickControl::Exit = stage.step(&events) {
                    info!("stage finished, core thread exiting");
                    break;
                }

                if frame_tx.try_send(RenderedFrame::capture(stage.screen())).is_err() {
                    // Presenter still busy with the previous frame.
                    trace!("frame dropped");
                }

                let elapsed = tick_start.elapsed();
                if elapsed < tick {
                    thread::sleep(tick - elapsed);
                }
            }
        });
        info!("core thread spawned");

        //--- Platform loop on the main thread -----------------------------
        let platform = Platform::new(
            event_tx,
            frame_rx,
            PlatformConfig {
                title: self.title,
                width: self.width,
                height: self.height,
            },
        );
        if let Err(e) = platform.run() {
            error!("platform error: {e}");
        }

        //--- Shutdown ------------------------------------------------------
        match core_handle.join() {
            Ok(()) => info!("core thread terminated cleanly"),
            Err(e) => error!("core thread panicked: {e:?}"),
        }
        info!("engine shutdown complete");
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
