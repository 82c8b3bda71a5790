//=========================================================================
// Scene
//
// The top-level container bound to the display surface. A scene owns the
// single paint/dispatch group for everything inside it (direct drawables
// and frame subtrees alike), a background used for dirty-rectangle
// restore, and the entry/exit transition machinery.
//
// Transition model: a transition is a transient full-screen drawable
// (the "veil") animated through the ordinary tween queues. The step
// functions are evaluated once per controller tick; they lazily create
// the veil on first call (reporting "not complete" for that tick) and
// destroy it on the call that observes completion.
//
// States: a scene is idle, transitioning in, or transitioning out; the
// controller tracks which, the scene provides the step functions.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::event::SystemEvent;
use crate::core::frame::Frame;
use crate::core::geometry::{Point, Rect, Size};
use crate::core::group::{ObjectGroup, ObjectId};
use crate::core::object::{DrawableObject, FrameClock};
use crate::core::surface::{Rgba, Surface};

//=== TransitionKind ======================================================

/// How a scene enters or leaves the display.
///
/// `Zoom` is an entry effect; used as an exit method it completes
/// instantly (a long-standing asymmetry kept on purpose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionKind {
    /// Instantly complete, no veil.
    #[default]
    None,
    /// Full-screen black veil sweeping the whole opacity range.
    Fade,
    /// Like `Fade` but capped at a partial dim.
    FadeAlpha,
    /// Entry only: a snapshot of the screen scales up from a point while
    /// the scene's own drawables hold at zero opacity.
    Zoom,
}

/// Opacity ceiling for the partial-dim fade.
const FADE_ALPHA_CAP: i32 = 200;
/// Starting scale of the zoom-entry snapshot.
const ZOOM_START_SCALE: f32 = 0.01;

impl TransitionKind {
    /// Resolves a configuration string. Unknown names degrade to
    /// [`TransitionKind::None`] with a warning rather than failing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "none" => Self::None,
            "fade" => Self::Fade,
            "fade_alpha" => Self::FadeAlpha,
            "zoom" => Self::Zoom,
            other => {
                warn!("unknown transition {other:?}, treating as none");
                Self::None
            }
        }
    }
}

//=== Scene ===============================================================

/// A transition-capable, input-receiving container of drawables and
/// frames.
pub struct Scene {
    size: Size,
    group: ObjectGroup,
    frames: Vec<Frame>,
    background: Surface,
    background_set: bool,
    transition_in: TransitionKind,
    transition_out: TransitionKind,
    veil: Option<ObjectId>,
    zoom_held: Vec<ObjectId>,
}

impl Scene {
    //--- Construction -----------------------------------------------------

    /// A scene of the given size with an opaque black default background.
    /// An explicit or captured background replaces it later.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            group: ObjectGroup::new(),
            frames: Vec::new(),
            background: Surface::filled(size.w, size.h, Rgba::BLACK),
            background_set: false,
            transition_in: TransitionKind::None,
            transition_out: TransitionKind::None,
            veil: None,
            zoom_held: Vec::new(),
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn size(&self) -> Size {
        self.size
    }

    /// The scene's rectangle in screen coordinates (scenes sit at the
    /// origin).
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.size.w, self.size.h)
    }

    /// The scene-level paint group.
    pub fn group(&self) -> &ObjectGroup {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut ObjectGroup {
        &mut self.group
    }

    pub fn background(&self) -> &Surface {
        &self.background
    }

    /// True once a background was provided explicitly or captured from
    /// the display after an exit transition.
    pub fn background_set(&self) -> bool {
        self.background_set
    }

    pub fn transition_in(&self) -> TransitionKind {
        self.transition_in
    }

    pub fn transition_out(&self) -> TransitionKind {
        self.transition_out
    }

    /// The transition veil's id while one is alive. Mostly useful to
    /// observe a transition from the outside.
    pub fn veil(&self) -> Option<ObjectId> {
        self.veil
    }

    //--- Content ----------------------------------------------------------

    /// Adds a drawable directly to the scene, on the top layer.
    pub fn add_object(&mut self, object: DrawableObject) -> ObjectId {
        self.group.insert(object)
    }

    /// Removes a drawable.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a member (see [`ObjectGroup::remove`]).
    pub fn remove_object(&mut self, id: ObjectId) -> DrawableObject {
        self.group.remove(id)
    }

    /// Attaches a root-level frame at (x, y), clamped inside the scene.
    pub fn add_frame(&mut self, mut frame: Frame, x: i32, y: i32) {
        let rect = self.rect();
        frame.set_position(&mut self.group, Point::new(x, y), rect);
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Root frames and the paint group, borrowed together so frame
    /// operations that need both (adding objects, repositioning) can run.
    pub fn layout_mut(&mut self) -> (&mut Vec<Frame>, &mut ObjectGroup) {
        (&mut self.frames, &mut self.group)
    }

    /// Repositions the root frame at `index` and cascades through its
    /// subtree.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_frame_position(&mut self, index: usize, rel: Point) {
        assert!(index < self.frames.len(), "no root frame at index {index}");
        let rect = self.rect();
        self.frames[index].set_position(&mut self.group, rel, rect);
    }

    /// Detaches and dismantles the root frame at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_frame(&mut self, index: usize) {
        assert!(index < self.frames.len(), "no root frame at index {index}");
        let mut frame = self.frames.remove(index);
        frame.dismantle(&mut self.group);
    }

    /// Replaces the background.
    pub fn set_background(&mut self, background: Surface) {
        self.background = background;
        self.background_set = true;
    }

    //--- Per-Tick Entry Points --------------------------------------------

    /// Forwards one event into the scene. The scene-level group is the
    /// single dispatch surface, so at most one drawable in the whole tree
    /// reacts.
    pub fn dispatch(&self, event: &SystemEvent) -> Option<ObjectId> {
        self.group.dispatch(event)
    }

    /// Advances every drawable's animation queues.
    pub fn tick(&mut self, clock: &FrameClock) {
        self.group.tick(clock);
    }

    /// Repaints onto `screen` and returns the touched rects.
    pub fn draw(&mut self, screen: &mut Surface) -> Vec<Rect> {
        self.group.redraw(screen, &self.background)
    }

    //--- Transition Configuration -----------------------------------------

    pub(crate) fn set_transition_in(&mut self, kind: TransitionKind) {
        self.transition_in = kind;
    }

    pub(crate) fn set_transition_out(&mut self, kind: TransitionKind) {
        self.transition_out = kind;
    }

    //--- Transition Stepping ----------------------------------------------

    /// One entry-transition step. Returns true when the transition is
    /// complete; the veil (if any) is destroyed on that call.
    pub fn transition_in_step(&mut self, screen: &Surface) -> bool {
        let done = match self.transition_in {
            TransitionKind::None => true,
            TransitionKind::Fade => self.fade_step(true, 255, screen),
            TransitionKind::FadeAlpha => self.fade_step(true, FADE_ALPHA_CAP, screen),
            TransitionKind::Zoom => self.zoom_in_step(screen),
        };
        if done {
            self.discard_veil();
        }
        done
    }

    /// One exit-transition step. Zoom has no exit animation and reports
    /// complete immediately.
    pub fn transition_out_step(&mut self, screen: &Surface) -> bool {
        let done = match self.transition_out {
            TransitionKind::None | TransitionKind::Zoom => true,
            TransitionKind::Fade => self.fade_step(false, 255, screen),
            TransitionKind::FadeAlpha => self.fade_step(false, FADE_ALPHA_CAP, screen),
        };
        if done {
            self.discard_veil();
        }
        done
    }

    // Shared fade machinery. Entering sweeps the veil cap -> 0 (the scene
    // emerges from black); exiting sweeps 0 -> cap (the scene sinks into
    // it). The veil's own fade queue does the stepping during the
    // scene's regular tick.
    fn fade_step(&mut self, entering: bool, cap: i32, screen: &Surface) -> bool {
        match self.veil {
            None => {
                let mut veil = DrawableObject::new(
                    Surface::filled(screen.width(), screen.height(), Rgba::BLACK),
                    Point::ZERO,
                );
                veil.set_alpha(if entering { cap } else { 0 });
                veil.request_fade(if entering { 0 } else { cap });
                self.veil = Some(self.group.insert(veil));
                debug!(
                    "fade veil created ({} toward {})",
                    if entering { "in" } else { "out" },
                    if entering { 0 } else { cap }
                );
                false
            }
            Some(id) => {
                let alpha = self.group.get(id).map(|veil| veil.alpha());
                let target = if entering { 0 } else { cap };
                alpha == Some(target)
            }
        }
    }

    // Zoom entry: snapshot the display, shrink it to a point, and grow it
    // back while the scene's own drawables hold invisible. On completion
    // the held drawables snap to full opacity.
    fn zoom_in_step(&mut self, screen: &Surface) -> bool {
        match self.veil {
            None => {
                self.zoom_held = self.group.ids();
                for &id in &self.zoom_held {
                    if let Some(object) = self.group.get_mut(id) {
                        object.set_alpha(0);
                    }
                }
                let mut veil = DrawableObject::new(screen.clone(), Point::ZERO);
                veil.set_scale(ZOOM_START_SCALE);
                veil.request_zoom(1.0);
                self.veil = Some(self.group.insert(veil));
                debug!("zoom veil created from display snapshot");
                false
            }
            Some(id) => {
                let arrived = self.group.get(id).map(|veil| veil.scale()) == Some(1.0);
                if arrived {
                    for id in std::mem::take(&mut self.zoom_held) {
                        if let Some(object) = self.group.get_mut(id) {
                            object.set_alpha(255);
                        }
                    }
                }
                arrived
            }
        }
    }

    fn discard_veil(&mut self) {
        if let Some(id) = self.veil.take() {
            if self.group.contains(id) {
                self.group.remove(id);
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
