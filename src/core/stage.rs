//=========================================================================
// Stage
//
// The controller: an ordered stack of scenes, at most one of which is
// active, plus the per-tick drive logic the engine loop calls.
//
// Tick order (fixed):
//   1. Forward events to the active scene; window-close exits, resize
//      reconfigures the screen surface in place.
//   2. While an exit transition is pending, ONLY the outgoing scene is
//      driven — the incoming scene gets no tick and no draw until the
//      exit completes, which is what prevents the two scenes from
//      painting over each other. The completing tick captures the screen
//      as the incoming scene's background (if it has none) and then
//      skips the rest of the tick so the hand-off never flashes.
//   3. A pending entry transition is stepped, but does not gate the
//      tick: the scene updates and draws underneath its own veil.
//   4. Active scene tick + draw.
//
// A scene removed while active stays alive in a departing slot just long
// enough to play out its exit transition, then drops.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info};

//=== Internal Dependencies ===============================================

use crate::core::event::SystemEvent;
use crate::core::geometry::{Rect, Size};
use crate::core::object::FrameClock;
use crate::core::scene::{Scene, TransitionKind};
use crate::core::surface::Surface;

//=== TickControl =========================================================

/// Whether the engine loop should keep running after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Exit,
}

//=== SceneId =============================================================

/// Handle to a scene registered with a stage. Monotonic; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

//=== Stage ===============================================================

/// Scene stack, transition gating, and the logical screen surface.
pub struct Stage {
    scenes: Vec<(SceneId, Scene)>,
    next_id: u64,
    active: Option<SceneId>,
    previous: Option<SceneId>,
    departing: Option<(SceneId, Scene)>,
    transition_in_complete: bool,
    transition_out_complete: bool,
    screen: Surface,
    clock: FrameClock,
    dirty: Vec<Rect>,
}

impl Stage {
    //--- Construction -----------------------------------------------------

    /// A stage with an empty scene stack and a screen surface of the
    /// given size.
    ///
    /// # Panics
    ///
    /// Panics if `ticks_per_second` is not positive (see
    /// [`FrameClock::new`]).
    pub fn new(width: u32, height: u32, ticks_per_second: f32) -> Self {
        Self {
            scenes: Vec::new(),
            next_id: 0,
            active: None,
            previous: None,
            departing: None,
            transition_in_complete: true,
            transition_out_complete: true,
            screen: Surface::new(width, height),
            clock: FrameClock::new(ticks_per_second),
            dirty: Vec::new(),
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// The logical screen surface the active scene paints into.
    pub fn screen(&self) -> &Surface {
        &self.screen
    }

    pub fn screen_size(&self) -> Size {
        self.screen.size()
    }

    /// Rects touched by the most recent tick's draw.
    pub fn dirty(&self) -> &[Rect] {
        &self.dirty
    }

    pub fn active_scene(&self) -> Option<SceneId> {
        self.active
    }

    /// True while an exit transition is still playing out.
    pub fn exiting(&self) -> bool {
        !self.transition_out_complete
    }

    /// True while the active scene's entry transition is still playing.
    pub fn entering(&self) -> bool {
        !self.transition_in_complete
    }

    //--- Scene Registration -----------------------------------------------

    /// Registers a scene on top of the stack without activating it.
    pub fn add_scene(&mut self, scene: Scene) -> SceneId {
        let id = SceneId(self.next_id);
        self.next_id += 1;
        self.scenes.push((id, scene));
        debug!("scene {:?} registered (stack depth {})", id, self.scenes.len());
        id
    }

    /// Registers a fresh scene sized to the current screen.
    pub fn new_scene(&mut self) -> SceneId {
        let size = self.screen.size();
        self.add_scene(Scene::new(size))
    }

    pub fn contains(&self, id: SceneId) -> bool {
        self.scenes.iter().any(|(sid, _)| *sid == id)
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, scene)| scene)
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes
            .iter_mut()
            .find(|(sid, _)| *sid == id)
            .map(|(_, scene)| scene)
    }

    //--- Activation -------------------------------------------------------

    /// Makes `id` the active scene. The previously active scene (if any)
    /// starts its exit transition with `transition_out`; the new scene
    /// will enter with `transition_in` once that exit completes.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never registered — activating an unknown scene
    /// is a defect at the call site.
    pub fn set_active(
        &mut self,
        id: SceneId,
        transition_in: TransitionKind,
        transition_out: TransitionKind,
    ) {
        assert!(self.contains(id), "scene must be registered with the stage");
        if let Some(current) = self.active {
            if let Some(scene) = self.scene_mut(current) {
                scene.set_transition_out(transition_out);
            }
            self.previous = Some(current);
            self.transition_out_complete = false;
        }
        self.active = Some(id);
        self.scene_mut(id)
            .expect("registration checked above")
            .set_transition_in(transition_in);
        self.transition_in_complete = false;
        info!("scene {:?} activated", id);
    }

    /// Removes a scene from the stack. Removing the active scene parks
    /// it in a departing slot so its exit transition can play out, then
    /// activates the topmost remaining scene (if any) with the given
    /// transitions.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never registered.
    pub fn remove_scene(
        &mut self,
        id: SceneId,
        transition_in: TransitionKind,
        transition_out: TransitionKind,
    ) {
        let index = self
            .scenes
            .iter()
            .position(|(sid, _)| *sid == id)
            .expect("scene must be registered with the stage");
        let (sid, mut scene) = self.scenes.remove(index);
        info!("scene {:?} removed (stack depth {})", sid, self.scenes.len());

        if self.active != Some(id) {
            return;
        }

        scene.set_transition_out(transition_out);
        self.departing = Some((sid, scene));
        self.previous = Some(sid);
        self.transition_out_complete = false;

        match self.scenes.last().map(|(top, _)| *top) {
            Some(top) => {
                self.active = Some(top);
                self.scene_mut(top)
                    .expect("topmost scene exists")
                    .set_transition_in(transition_in);
                self.transition_in_complete = false;
                info!("scene {:?} activated after removal", top);
            }
            None => {
                self.active = None;
            }
        }
    }

    //--- Per-Tick Drive ---------------------------------------------------

    /// Runs one controller tick: event forwarding, transition gating,
    /// update, and draw, in that order. Returns [`TickControl::Exit`]
    /// after a window-close event or when no scene is active.
    pub fn step(&mut self, events: &[SystemEvent]) -> TickControl {
        for event in events {
            if let Some(active) = self.active {
                if let Some(scene) = self.scene(active) {
                    scene.dispatch(event);
                }
            }
            match *event {
                SystemEvent::WindowClosed => {
                    info!("window closed, controller stopping");
                    return TickControl::Exit;
                }
                SystemEvent::Resized { width, height } => {
                    self.screen = Surface::new(width, height);
                    debug!("screen surface reconfigured to {width}x{height}");
                }
                _ => {}
            }
        }

        let Some(active_id) = self.active else {
            return TickControl::Exit;
        };

        if !self.transition_out_complete {
            self.drive_exit(active_id);
            return TickControl::Continue;
        }

        if !self.transition_in_complete {
            let Stage {
                scenes,
                screen,
                transition_in_complete,
                ..
            } = self;
            *transition_in_complete = match Self::find_mut(scenes, active_id) {
                Some(scene) => scene.transition_in_step(screen),
                None => true,
            };
        }

        let Stage {
            scenes,
            screen,
            clock,
            dirty,
            ..
        } = self;
        if let Some(scene) = Self::find_mut(scenes, active_id) {
            scene.tick(clock);
            *dirty = scene.draw(screen);
        }
        TickControl::Continue
    }

    // Exit-transition tick: step the outgoing scene, and on completion
    // capture the display for the incoming scene and burn one grace
    // frame. While incomplete, the outgoing scene still ticks and draws
    // so its veil actually animates.
    fn drive_exit(&mut self, active_id: SceneId) {
        let Some(prev_id) = self.previous else {
            self.transition_out_complete = true;
            return;
        };

        let complete = {
            let Stage {
                scenes,
                departing,
                screen,
                ..
            } = self;
            match Self::find_outgoing_mut(scenes, departing, prev_id) {
                Some(scene) => scene.transition_out_step(screen),
                None => true,
            }
        };
        self.transition_out_complete = complete;

        if complete {
            let needs_backdrop = self
                .scene(active_id)
                .map(|scene| !scene.background_set())
                .unwrap_or(false);
            if needs_backdrop {
                let snapshot = self.screen.clone();
                if let Some(scene) = self.scene_mut(active_id) {
                    scene.set_background(snapshot);
                    debug!("incoming scene captured the display as its background");
                }
            }
            if self
                .departing
                .as_ref()
                .map(|(id, _)| *id == prev_id)
                .unwrap_or(false)
            {
                self.departing = None;
            }
            self.previous = None;
            // Grace frame: nothing else runs this tick, so the incoming
            // scene never paints in the same frame the old one vanishes.
            return;
        }

        let Stage {
            scenes,
            departing,
            screen,
            clock,
            dirty,
            ..
        } = self;
        if let Some(scene) = Self::find_outgoing_mut(scenes, departing, prev_id) {
            scene.tick(clock);
            *dirty = scene.draw(screen);
        }
    }

    //--- Lookup Helpers ---------------------------------------------------

    fn find_mut(scenes: &mut [(SceneId, Scene)], id: SceneId) -> Option<&mut Scene> {
        scenes
            .iter_mut()
            .find(|(sid, _)| *sid == id)
            .map(|(_, scene)| scene)
    }

    // The outgoing scene lives either on the stack (plain activation) or
    // in the departing slot (removed while active).
    fn find_outgoing_mut<'a>(
        scenes: &'a mut [(SceneId, Scene)],
        departing: &'a mut Option<(SceneId, Scene)>,
        id: SceneId,
    ) -> Option<&'a mut Scene> {
        if let Some((dep_id, scene)) = departing.as_mut() {
            if *dep_id == id {
                return Some(scene);
            }
        }
        Self::find_mut(scenes, id)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point;
    use crate::core::object::DrawableObject;
    use crate::core::surface::Rgba;

    const W: u32 = 64;
    const H: u32 = 48;

    fn stage() -> Stage {
        Stage::new(W, H, 60.0)
    }

    fn white_box(w: u32, h: u32) -> DrawableObject {
        DrawableObject::new(Surface::filled(w, h, Rgba::WHITE), Point::ZERO)
    }

    fn drain(stage: &mut Stage, ticks: usize) {
        for _ in 0..ticks {
            stage.step(&[]);
        }
    }

    //=====================================================================
    // Registration & Activation Tests
    //=====================================================================

    #[test]
    fn add_scene_registers_without_activating() {
        let mut st = stage();
        let id = st.new_scene();
        assert!(st.contains(id));
        assert_eq!(st.active_scene(), None);
    }

    #[test]
    fn set_active_with_no_predecessor_skips_the_exit_phase() {
        let mut st = stage();
        let id = st.new_scene();
        st.set_active(id, TransitionKind::None, TransitionKind::None);
        assert_eq!(st.active_scene(), Some(id));
        assert!(!st.exiting());
        assert!(st.entering());
        st.step(&[]);
        assert!(!st.entering(), "none-transition completes on the first tick");
    }

    #[test]
    #[should_panic(expected = "registered with the stage")]
    fn activating_an_unregistered_scene_is_a_contract_violation() {
        let mut st = stage();
        let id = st.new_scene();
        st.remove_scene(id, TransitionKind::None, TransitionKind::None);
        st.set_active(id, TransitionKind::None, TransitionKind::None);
    }

    #[test]
    fn step_with_no_active_scene_exits() {
        let mut st = stage();
        st.new_scene();
        assert_eq!(st.step(&[]), TickControl::Exit);
    }

    //=====================================================================
    // Event Forwarding Tests
    //=====================================================================

    #[test]
    fn window_close_exits_after_forwarding() {
        let mut st = stage();
        let id = st.new_scene();
        st.set_active(id, TransitionKind::None, TransitionKind::None);
        assert_eq!(st.step(&[SystemEvent::WindowClosed]), TickControl::Exit);
    }

    #[test]
    fn resize_reconfigures_the_screen_in_place() {
        let mut st = stage();
        let id = st.new_scene();
        st.set_active(id, TransitionKind::None, TransitionKind::None);
        st.step(&[SystemEvent::Resized {
            width: 128,
            height: 96,
        }]);
        assert_eq!(st.screen_size(), Size::new(128, 96));
    }

    #[test]
    fn events_reach_the_active_scene_objects() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CLICKS: AtomicU32 = AtomicU32::new(0);

        let mut st = stage();
        let id = st.new_scene();
        let mut obj = white_box(20, 20);
        obj.connect_click(|| {
            CLICKS.fetch_add(1, Ordering::SeqCst);
        });
        st.scene_mut(id).unwrap().add_object(obj);
        st.set_active(id, TransitionKind::None, TransitionKind::None);

        st.step(&[SystemEvent::PointerDown {
            x: 5,
            y: 5,
            button: crate::core::event::MouseButton::Left,
        }]);
        assert_eq!(CLICKS.load(Ordering::SeqCst), 1);
    }

    //=====================================================================
    // Transition Gating Tests
    //=====================================================================

    #[test]
    fn incoming_scene_is_frozen_until_the_exit_completes() {
        let mut st = stage();
        let s1 = st.new_scene();
        let s2 = st.new_scene();
        st.set_active(s1, TransitionKind::None, TransitionKind::None);
        st.step(&[]);

        // A drawable in S2 with a pending fade is the tick spy: its queue
        // only drains when S2 is actually ticked.
        let mut spy = white_box(4, 4);
        spy.request_fade(0);
        let spy_id = st.scene_mut(s2).unwrap().add_object(spy);

        st.set_active(s2, TransitionKind::Fade, TransitionKind::Fade);

        let mut exit_ticks = 0;
        while st.exiting() {
            st.step(&[]);
            exit_ticks += 1;
            assert_eq!(
                st.scene(s2).unwrap().group().get(spy_id).unwrap().alpha(),
                255,
                "incoming scene must receive zero ticks during the exit"
            );
            assert!(exit_ticks < 100, "exit transition never finished");
        }
        // 32 ticks raise the veil 0 -> 255, the 33rd observes completion.
        assert_eq!(exit_ticks, 33);

        drain(&mut st, 80);
        assert_eq!(
            st.scene(s2).unwrap().group().get(spy_id).unwrap().alpha(),
            0,
            "incoming scene animates normally once the exit completes"
        );
    }

    #[test]
    fn fade_handoff_runs_the_documented_alpha_ramps() {
        let mut st = stage();
        let s1 = st.new_scene();
        let s2 = st.new_scene();
        st.set_active(s1, TransitionKind::None, TransitionKind::None);
        st.step(&[]);

        st.set_active(s2, TransitionKind::Fade, TransitionKind::Fade);

        // Tick 1 creates S1's exit veil at alpha 0.
        st.step(&[]);
        let exit_veil = st.scene(s1).unwrap().veil().expect("exit veil");
        let veil_alpha =
            |st: &Stage, scene, veil| st.scene(scene).unwrap().group().get(veil).unwrap().alpha();
        assert_eq!(veil_alpha(&st, s1, exit_veil), 8, "first step raises 0 -> 8");

        st.step(&[]);
        assert_eq!(veil_alpha(&st, s1, exit_veil), 16, "climbs by 8 per tick");

        while st.exiting() {
            st.step(&[]);
        }
        assert_eq!(st.scene(s1).unwrap().veil(), None, "exit veil destroyed");
        assert!(
            st.scene(s2).unwrap().background_set(),
            "incoming scene captured the display on the completing tick"
        );

        // Next tick creates S2's entry veil at alpha 255 and steps it.
        st.step(&[]);
        let entry_veil = st.scene(s2).unwrap().veil().expect("entry veil");
        assert_eq!(veil_alpha(&st, s2, entry_veil), 247, "first step lowers 255 -> 247");

        let mut ticks = 0;
        while st.entering() {
            st.step(&[]);
            ticks += 1;
            assert!(ticks < 100, "entry transition never finished");
        }
        assert_eq!(st.scene(s2).unwrap().veil(), None);
        assert!(!st.exiting() && !st.entering(), "steady state reached");
    }

    #[test]
    fn entry_transition_does_not_gate_updates() {
        let mut st = stage();
        let s1 = st.new_scene();
        let mut spy = white_box(4, 4);
        spy.request_fade(0);
        let spy_id = st.scene_mut(s1).unwrap().add_object(spy);

        st.set_active(s1, TransitionKind::Fade, TransitionKind::None);
        st.step(&[]);
        assert!(st.entering(), "fade-in still in flight");
        assert!(
            st.scene(s1).unwrap().group().get(spy_id).unwrap().alpha() < 255,
            "scene objects animate during their own entry transition"
        );
    }

    //=====================================================================
    // Removal Tests
    //=====================================================================

    #[test]
    fn removing_the_active_scene_activates_the_topmost_remaining() {
        let mut st = stage();
        let s1 = st.new_scene();
        let s2 = st.new_scene();
        st.set_active(s2, TransitionKind::None, TransitionKind::None);
        st.step(&[]);

        st.remove_scene(s2, TransitionKind::None, TransitionKind::None);
        assert!(!st.contains(s2));
        assert_eq!(st.active_scene(), Some(s1));

        // The departed scene's none-exit completes on the next tick, then
        // normal driving resumes.
        assert_eq!(st.step(&[]), TickControl::Continue);
        assert!(!st.exiting());
        drain(&mut st, 4);
        assert_eq!(st.active_scene(), Some(s1));
    }

    #[test]
    fn removing_an_inactive_scene_leaves_the_active_one_alone() {
        let mut st = stage();
        let s1 = st.new_scene();
        let s2 = st.new_scene();
        st.set_active(s1, TransitionKind::None, TransitionKind::None);
        st.step(&[]);

        st.remove_scene(s2, TransitionKind::None, TransitionKind::None);
        assert_eq!(st.active_scene(), Some(s1));
        assert!(!st.exiting());
    }

    #[test]
    fn removing_the_last_scene_ends_the_run() {
        let mut st = stage();
        let s1 = st.new_scene();
        st.set_active(s1, TransitionKind::None, TransitionKind::None);
        st.step(&[]);

        st.remove_scene(s1, TransitionKind::None, TransitionKind::None);
        assert_eq!(st.active_scene(), None);
        assert_eq!(st.step(&[]), TickControl::Exit);
    }

    //=====================================================================
    // Draw Tests
    //=====================================================================

    #[test]
    fn draw_marks_dirty_rects_for_the_presenter() {
        let mut st = stage();
        let s1 = st.new_scene();
        st.scene_mut(s1).unwrap().add_object(white_box(8, 8));
        st.set_active(s1, TransitionKind::None, TransitionKind::None);

        st.step(&[]);
        assert!(st.dirty().contains(&Rect::new(0, 0, 8, 8)));
        assert_eq!(st.screen().pixel(3, 3), Rgba::WHITE);
    }
}
