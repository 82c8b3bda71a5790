//=========================================================================
// Drawable Object
//
// The leaf of the scene tree: a positioned, rotatable, scalable,
// alpha-blendable image with per-property animation queues and optional
// click/hover actions.
//
// Derived-image invariant: the painted image is always recomputed from
// (base image, angle, scale), in that order, and is never edited in
// place. Whole-surface opacity is applied later, at blit time, so the
// pixel mask used for hit testing is unaffected by fades.
//
// Animation model: each property owns a FIFO queue of targets. One call
// to `advance` services the head of every queue with a fixed per-tick
// increment, snapping exactly onto the target instead of overshooting.
// Queues never coordinate with each other and never time out.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::sync::Arc;

//=== Internal Dependencies ===============================================

use crate::core::geometry::{Point, Rect};
use crate::core::surface::Surface;

//=== Tween Increments ====================================================

/// Opacity change per tick while a fade request is in flight.
pub const FADE_STEP: i32 = 8;
/// Scale change per tick while a zoom request is in flight.
pub const ZOOM_STEP: f32 = 0.2;
/// Degrees per tick while a rotation request is in flight.
pub const ROTATE_STEP: f32 = 3.0;

//=== FrameClock ==========================================================

/// The controller's tick rate, threaded into every `advance` call.
///
/// Move requests use it to turn a duration in seconds into a per-tick
/// pixel delta. There is deliberately no global clock anywhere in the
/// engine.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    ticks_per_second: f32,
}

impl FrameClock {
    /// # Panics
    ///
    /// Panics if `ticks_per_second` is not positive.
    pub fn new(ticks_per_second: f32) -> Self {
        assert!(
            ticks_per_second > 0.0,
            "tick rate must be positive, got {ticks_per_second}"
        );
        Self { ticks_per_second }
    }

    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }
}

//=== Callbacks ===========================================================

/// A click or hover action. Shared and cloneable so a frame can fan one
/// action out to many objects, and `Send + Sync` so scenes can cross onto
/// the core thread.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

//=== Move Requests =======================================================

// A queued positional tween. The per-tick delta is frozen the first time
// the request is serviced as the queue head, using the clock threaded in
// by the controller, and rounded away from zero so motion never stalls
// short of the target.
#[derive(Debug, Clone)]
struct MoveRequest {
    target: Point,
    duration_secs: f32,
    step: Option<(i32, i32)>,
}

fn per_tick(delta: i32, ticks: f32) -> i32 {
    let v = delta as f32 / ticks;
    if v > 0.0 {
        v.ceil() as i32
    } else {
        v.floor() as i32
    }
}

//=== DrawableObject ======================================================

/// A single visual, hit-testable, independently animatable leaf.
pub struct DrawableObject {
    base: Surface,
    image: Surface,
    rect: Rect,
    prev_rect: Option<Rect>,
    angle: f32,
    scale: f32,
    alpha: i32,
    fade_targets: VecDeque<i32>,
    rotate_targets: VecDeque<f32>,
    zoom_targets: VecDeque<f32>,
    move_targets: VecDeque<MoveRequest>,
    click_action: Option<Callback>,
    hover_action: Option<Callback>,
}

impl DrawableObject {
    //--- Construction -----------------------------------------------------

    /// Creates a drawable from a ready-made surface with its top-left
    /// corner at `pos`. The engine never loads image files itself.
    pub fn new(image: Surface, pos: Point) -> Self {
        let rect = Rect::from_pos_size(pos, image.size());
        Self {
            base: image.clone(),
            image,
            rect,
            prev_rect: None,
            angle: 0.0,
            scale: 1.0,
            alpha: 255,
            fade_targets: VecDeque::new(),
            rotate_targets: VecDeque::new(),
            zoom_targets: VecDeque::new(),
            move_targets: VecDeque::new(),
            click_action: None,
            hover_action: None,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn pos(&self) -> Point {
        self.rect.pos()
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn alpha(&self) -> i32 {
        self.alpha
    }

    /// The current derived image.
    pub fn image(&self) -> &Surface {
        &self.image
    }

    /// True while any animation queue still holds a target.
    pub fn is_animating(&self) -> bool {
        !(self.fade_targets.is_empty()
            && self.rotate_targets.is_empty()
            && self.zoom_targets.is_empty()
            && self.move_targets.is_empty())
    }

    //--- Immediate Mutations ----------------------------------------------

    /// Moves the top-left corner. Size and derived image are untouched.
    pub fn set_position(&mut self, pos: Point) {
        self.rect.set_pos(pos);
    }

    /// Places the object inside `bounds` by fractional coordinates:
    /// (0, 0) flush top-left, (1, 1) flush bottom-right, (0.5, 0.5)
    /// centered.
    pub fn set_position_fraction(&mut self, fx: f32, fy: f32, bounds: Rect) {
        let free_w = bounds.w as i32 - self.rect.w as i32;
        let free_h = bounds.h as i32 - self.rect.h as i32;
        self.set_position(Point::new(
            bounds.x + (free_w as f32 * fx) as i32,
            bounds.y + (free_h as f32 * fy) as i32,
        ));
    }

    /// Sets the rotation in degrees and recomposes the derived image
    /// about the current center.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.recompose();
    }

    /// Sets the uniform scale factor and recomposes the derived image
    /// about the current center.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.recompose();
    }

    /// Sets the whole-surface opacity. Negative values clamp to 0; values
    /// above 255 are stored verbatim and saturate at the blit boundary.
    pub fn set_alpha(&mut self, alpha: i32) {
        self.alpha = alpha.max(0);
    }

    /// Replaces the base image and recomposes with the current angle and
    /// scale, keeping the center in place.
    pub fn set_image(&mut self, image: Surface) {
        self.base = image;
        self.recompose();
    }

    // The one place the painted image is produced. Angle is negated so a
    // growing angle reads as clockwise on screen.
    fn recompose(&mut self) {
        let center = self.rect.center();
        self.image = self.base.rotozoom(-self.angle, self.scale);
        self.rect = Rect::from_center(center, self.image.size());
    }

    //--- Animation Requests -----------------------------------------------

    /// Queues a fade toward `alpha`. Non-blocking; requests are serviced
    /// strictly in FIFO order, one at a time.
    pub fn request_fade(&mut self, alpha: i32) {
        self.fade_targets.push_back(alpha);
    }

    /// Queues a rotation toward `angle` degrees.
    pub fn request_rotate(&mut self, angle: f32) {
        self.rotate_targets.push_back(angle);
    }

    /// Queues a zoom toward `scale`.
    pub fn request_zoom(&mut self, scale: f32) {
        self.zoom_targets.push_back(scale);
    }

    /// Queues a move of the top-left corner toward `target`, paced to
    /// take roughly `duration_secs` at the controller's tick rate.
    ///
    /// # Panics
    ///
    /// Panics if `duration_secs` is not positive.
    pub fn request_move(&mut self, target: Point, duration_secs: f32) {
        assert!(
            duration_secs > 0.0,
            "move duration must be positive, got {duration_secs}"
        );
        self.move_targets.push_back(MoveRequest {
            target,
            duration_secs,
            step: None,
        });
    }

    //--- Per-Tick Advancement ---------------------------------------------

    /// Advances every non-empty animation queue by one tick. Called once
    /// per tick by the owning group, whether or not the object is
    /// currently visible. With all queues empty this is a strict no-op.
    pub fn advance(&mut self, clock: &FrameClock) {
        self.advance_fade();
        self.advance_rotate();
        self.advance_zoom();
        self.advance_move(clock);
    }

    fn advance_fade(&mut self) {
        let Some(&target) = self.fade_targets.front() else {
            return;
        };
        if target == self.alpha {
            self.fade_targets.pop_front();
        } else if self.alpha > target {
            self.set_alpha((self.alpha - FADE_STEP).max(target));
        } else {
            self.set_alpha((self.alpha + FADE_STEP).min(target));
        }
    }

    fn advance_rotate(&mut self) {
        let Some(&target) = self.rotate_targets.front() else {
            return;
        };
        if target == self.angle {
            self.rotate_targets.pop_front();
            // Completed rotations fold the angle back into [0, 360).
            self.angle = self.angle.rem_euclid(360.0);
        } else if self.angle > target {
            self.set_angle((self.angle - ROTATE_STEP).max(target));
        } else {
            self.set_angle((self.angle + ROTATE_STEP).min(target));
        }
    }

    fn advance_zoom(&mut self) {
        let Some(&target) = self.zoom_targets.front() else {
            return;
        };
        if target == self.scale {
            self.zoom_targets.pop_front();
        } else if self.scale > target {
            self.set_scale((self.scale - ZOOM_STEP).max(target));
        } else {
            self.set_scale((self.scale + ZOOM_STEP).min(target));
        }
    }

    fn advance_move(&mut self, clock: &FrameClock) {
        let pos = self.rect.pos();
        let arrived = matches!(self.move_targets.front(), Some(head) if head.target == pos);
        if arrived {
            self.move_targets.pop_front();
            return;
        }
        let mut next = None;
        if let Some(head) = self.move_targets.front_mut() {
            if head.step.is_none() {
                let ticks = clock.ticks_per_second() * head.duration_secs;
                head.step = Some((
                    per_tick(head.target.x - pos.x, ticks),
                    per_tick(head.target.y - pos.y, ticks),
                ));
            }
            let (dx, dy) = head.step.expect("step frozen above");
            let mut p = Point::new(pos.x + dx, pos.y + dy);
            // Direction-sensitive snap: never travel past the target.
            if (dx > 0 && p.x > head.target.x) || (dx < 0 && p.x < head.target.x) {
                p.x = head.target.x;
            }
            if (dy > 0 && p.y > head.target.y) || (dy < 0 && p.y < head.target.y) {
                p.y = head.target.y;
            }
            next = Some(p);
        }
        if let Some(p) = next {
            self.set_position(p);
        }
    }

    //--- Hit Testing ------------------------------------------------------

    /// True when `p` lies inside the bounding rectangle and the derived
    /// image is non-transparent there. Points outside the rectangle are
    /// simply misses, never errors. Whole-surface opacity does not affect
    /// the mask.
    pub fn hit_test(&self, p: Point) -> bool {
        self.rect.contains(p) && self.image.alpha_at(p.x - self.rect.x, p.y - self.rect.y) > 0
    }

    //--- Actions ----------------------------------------------------------

    /// Binds a click action, replacing any previous one.
    pub fn connect_click<F: Fn() + Send + Sync + 'static>(&mut self, action: F) {
        self.click_action = Some(Arc::new(action));
    }

    /// Binds a hover action, replacing any previous one.
    pub fn connect_hover<F: Fn() + Send + Sync + 'static>(&mut self, action: F) {
        self.hover_action = Some(Arc::new(action));
    }

    /// Binds an already-shared click action; used by frame fan-out.
    pub fn connect_click_shared(&mut self, action: Callback) {
        self.click_action = Some(action);
    }

    /// Binds an already-shared hover action; used by frame fan-out.
    pub fn connect_hover_shared(&mut self, action: Callback) {
        self.hover_action = Some(action);
    }

    /// Invokes the click action if one is bound; silently does nothing
    /// otherwise.
    pub fn dispatch_click(&self) {
        if let Some(action) = &self.click_action {
            action();
        }
    }

    /// Invokes the hover action if one is bound; silently does nothing
    /// otherwise.
    pub fn dispatch_hover(&self) {
        if let Some(action) = &self.hover_action {
            action();
        }
    }

    //--- Dirty Bookkeeping ------------------------------------------------

    pub(crate) fn take_prev_rect(&mut self) -> Option<Rect> {
        self.prev_rect.take()
    }

    pub(crate) fn set_prev_rect(&mut self, rect: Rect) {
        self.prev_rect = Some(rect);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
