//=========================================================================
// Platform Subsystem
//
// Bridges Winit (OS window + events) with the core thread.
//
// Architecture:
// ```text
//  Main Thread:                      Logic Thread:
//  ┌───────────────────────────┐    ┌─────────────────────┐
//  │  Winit Event Loop         │    │  Stage::step()      │
//  │   ├─ events → SystemEvent ┼────→  scene dispatch     │
//  │   └─ cursor tracking      │    │  transitions        │
//  │                           │    │  tick + draw        │
//  │  RedrawRequested          │    │   ↓                 │
//  │   ├─ latest RenderedFrame ←────┼─ frame channel      │
//  │   └─ softbuffer present   │    └─────────────────────┘
//  └───────────────────────────┘
// ```
//
// Key decisions:
// - **Events flow one at a time**: the event channel is the pending
//   queue; the core drains it non-blocking at the top of each tick.
// - **Frames are latest-wins**: the frame channel holds one frame; a
//   busy presenter simply skips to the newest.
// - **Disconnect = shutdown**: when the core thread ends, the frame
//   channel disconnects and the platform exits its event loop, closing
//   the window.
// - **Main thread requirement**: Winit mandates the main thread on
//   macOS/iOS, so this runs on the thread that called `Engine::run()`.
//
//=========================================================================

//=== Submodules ==========================================================

mod event_mapper;

//=== External Crates =====================================================

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

use std::num::NonZeroU32;
use std::sync::Arc;

//=== Internal Imports ====================================================

use crate::core::event::SystemEvent;
use crate::core::surface::Surface;

//=== RenderedFrame =======================================================

/// One finished frame from the core thread, packed for the window
/// framebuffer: 0xAARRGGBB words, row-major.
pub(crate) struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl RenderedFrame {
    /// Packs the logical screen surface for presentation.
    pub fn capture(surface: &Surface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            pixels: surface.to_argb(),
        }
    }
}

//=== PlatformConfig ======================================================

/// Window parameters handed over by the engine builder.
pub(crate) struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

//=== PlatformError =======================================================

/// Platform initialization and runtime errors. These are typically
/// fatal — without an event loop or a presentable surface the engine
/// cannot run.
#[derive(Debug)]
pub(crate) enum PlatformError {
    /// Failed to create the event loop (rare, OS-level issue).
    EventLoopCreation(winit::error::EventLoopError),

    /// Event loop execution error (rare, indicates corruption).
    EventLoopExecution(winit::error::EventLoopError),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventLoopCreation(e) => write!(f, "event loop creation failed: {e}"),
            Self::EventLoopExecution(e) => write!(f, "event loop error: {e}"),
        }
    }
}

impl std::error::Error for PlatformError {}

//=== Presenter ===========================================================

// Window-lifetime presentation state; created together with the window
// in `resumed` and dropped with it.
struct Presenter {
    _context: softbuffer::Context<Arc<Window>>,
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
}

//=== Platform ============================================================

/// Window manager, event pump, and frame presenter.
///
/// Runs on the main thread and communicates with the core thread only
/// through its two channels. NOT Send/Sync, and never needs to be.
pub(crate) struct Platform {
    /// OS window handle (None until `resumed` is called).
    window: Option<Arc<Window>>,

    /// Softbuffer presentation state, created with the window.
    presenter: Option<Presenter>,

    /// Outgoing events toward the core thread.
    event_sender: Sender<SystemEvent>,

    /// Incoming frames from the core thread, latest wins.
    frame_receiver: Receiver<RenderedFrame>,

    /// The most recent frame, kept for re-presentation.
    frame: Option<RenderedFrame>,

    /// Last known cursor position; button events carry it since Winit
    /// reports buttons without coordinates.
    cursor: (i32, i32),

    config: PlatformConfig,
}

impl Platform {
    //--- Construction -----------------------------------------------------

    pub fn new(
        event_sender: Sender<SystemEvent>,
        frame_receiver: Receiver<RenderedFrame>,
        config: PlatformConfig,
    ) -> Self {
        info!(target: "platform", "platform subsystem initialized");
        Self {
            window: None,
            presenter: None,
            event_sender,
            frame_receiver,
            frame: None,
            cursor: (0, 0),
            config,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the Winit event loop until the window closes or the core
    /// thread disconnects. Blocks for the lifetime of the application.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop cannot be created or
    /// fails while running.
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "starting event loop");
        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;
        event_loop
            .run_app(&mut self)
            .map_err(PlatformError::EventLoopExecution)
    }

    //--- Internal Helpers -------------------------------------------------

    fn send(&self, event: SystemEvent) {
        if self.event_sender.try_send(event).is_err() {
            // Core gone or saturated; the event is droppable either way.
            warn!(target: "platform::input", "event channel unavailable, dropping {event:?}");
        }
    }

    /// Pulls the newest frame off the channel. Returns false when the
    /// core thread has disconnected and the platform should shut down.
    fn refresh_frame(&mut self) -> bool {
        loop {
            match self.frame_receiver.try_recv() {
                Ok(frame) => self.frame = Some(frame),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn present(&mut self) {
        let (Some(window), Some(presenter)) = (&self.window, &mut self.presenter) else {
            return;
        };
        let Some(frame) = &self.frame else {
            return;
        };
        let size = window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return; // minimized
        };
        if let Err(e) = presenter.surface.resize(w, h) {
            warn!(target: "platform", "surface resize failed: {e}");
            return;
        }
        match presenter.surface.buffer_mut() {
            Ok(mut buffer) => {
                blit_frame(frame, &mut buffer, size.width as usize, size.height as usize);
                if let Err(e) = buffer.present() {
                    warn!(target: "platform", "present failed: {e}");
                }
            }
            Err(e) => warn!(target: "platform", "framebuffer unavailable: {e}"),
        }
    }
}

//=== Frame Blit ==========================================================

// Copies the rendered frame into the window buffer, nearest-neighbor
// scaled when the two differ (transiently, around resizes).
fn blit_frame(frame: &RenderedFrame, dst: &mut [u32], dst_w: usize, dst_h: usize) {
    let src_w = frame.width as usize;
    let src_h = frame.height as usize;
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return;
    }
    if src_w == dst_w && src_h == dst_h && dst.len() >= src_w * src_h {
        dst[..src_w * src_h].copy_from_slice(&frame.pixels);
        return;
    }
    for dy in 0..dst_h {
        let sy = dy * src_h / dst_h;
        let dst_row = dy * dst_w;
        let src_row = sy * src_w;
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            dst[dst_row + dx] = frame.pixels[src_row + sx];
        }
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Platform {
    /// Creates the window lazily; on mobile this may be re-entered after
    /// a suspend/resume cycle.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                info!(
                    target: "platform",
                    "window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                match softbuffer::Context::new(window.clone()).and_then(|context| {
                    softbuffer::Surface::new(&context, window.clone())
                        .map(|surface| Presenter { _context: context, surface })
                }) {
                    Ok(presenter) => self.presenter = Some(presenter),
                    Err(e) => {
                        error!(target: "platform", "presentation surface failed: {e}");
                        self.send(SystemEvent::WindowClosed);
                        event_loop.exit();
                        return;
                    }
                }
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "window creation failed: {e}");
                self.send(SystemEvent::WindowClosed);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "window close requested");
                self.send(SystemEvent::WindowClosed);
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    trace!(target: "platform", "resized to {}x{}", size.width, size.height);
                    self.send(SystemEvent::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as i32, position.y as i32);
                self.send(SystemEvent::PointerMoved {
                    x: self.cursor.0,
                    y: self.cursor.1,
                });
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let (x, y) = self.cursor;
                let button = button.into();
                let event = match state {
                    ElementState::Pressed => SystemEvent::PointerDown { x, y, button },
                    ElementState::Released => SystemEvent::PointerUp { x, y, button },
                };
                self.send(event);
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let key = event_mapper::map_key(key_event.physical_key);
                let event = match key_event.state {
                    ElementState::Pressed => SystemEvent::KeyDown(key),
                    ElementState::Released => SystemEvent::KeyUp(key),
                };
                self.send(event);
            }

            WindowEvent::RedrawRequested => {
                if !self.refresh_frame() {
                    info!(target: "platform", "core thread disconnected, shutting down");
                    event_loop.exit();
                    return;
                }
                self.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {
                // Focus, IME, etc. — nothing the scene tree consumes.
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
