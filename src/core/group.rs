//=========================================================================
// Object Group
//
// The paint- and dispatch-owning collection of drawables. Each scene has
// exactly one group; frames inside the scene only bookkeep ids into it,
// so every drawable has a single owner no matter how deeply it is nested.
//
// Storage is a slot arena addressed by generational ids: removing an
// object bumps its slot's generation, so ids held elsewhere (frames,
// transition veils) go stale instead of aliasing a future occupant.
//
// Ordering: insertion order is paint order; the last-inserted object is
// painted last (topmost) and therefore hit-tested first.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::event::SystemEvent;
use crate::core::geometry::{Point, Rect};
use crate::core::object::{DrawableObject, FrameClock};
use crate::core::surface::Surface;

//=== ObjectId ============================================================

/// Handle to a drawable inside one group: a slot index plus a generation
/// counter that detects reuse after removal.
///
/// Ids are only meaningful against the group that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

//=== Slots ===============================================================

struct Slot {
    generation: u32,
    object: Option<DrawableObject>,
}

//=== ObjectGroup =========================================================

/// An ordered, layered collection of drawables.
pub struct ObjectGroup {
    slots: Vec<Slot>,
    order: Vec<ObjectId>,
    free: Vec<u32>,
}

impl ObjectGroup {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            order: Vec::new(),
            free: Vec::new(),
        }
    }

    //--- Membership -------------------------------------------------------

    /// Adds a drawable on the top layer and returns its id.
    pub fn insert(&mut self, object: DrawableObject) -> ObjectId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.object = Some(object);
                ObjectId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                ObjectId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.order.push(id);
        id
    }

    /// Removes a drawable and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a current member; removing a
    /// non-member is a defect at the call site, not a runtime condition.
    pub fn remove(&mut self, id: ObjectId) -> DrawableObject {
        assert!(self.contains(id), "object must be a member of the group");
        let slot = &mut self.slots[id.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|&other| other != id);
        debug!("drawable {:?} removed from group", id);
        slot.object.take().expect("membership checked above")
    }

    /// True when `id` names a live member.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots
            .get(id.index as usize)
            .map(|slot| slot.generation == id.generation && slot.object.is_some())
            .unwrap_or(false)
    }

    /// Looks up a member; stale ids resolve to `None`.
    pub fn get(&self, id: ObjectId) -> Option<&DrawableObject> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_ref()
    }

    /// Mutable lookup; stale ids resolve to `None`.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut DrawableObject> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_mut()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current member ids, bottom layer first. A snapshot, not a live
    /// view.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.order.clone()
    }

    /// Members in paint order, bottom layer first.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &DrawableObject)> {
        self.order
            .iter()
            .filter_map(move |&id| self.get(id).map(|object| (id, object)))
    }

    //--- Event Dispatch ---------------------------------------------------

    /// Routes a pointer event to the topmost member whose hit test
    /// passes: pointer-down invokes the click action, pointer-move the
    /// hover action, and dispatch stops there — at most one member reacts
    /// per event. Non-pointer events reach nobody.
    ///
    /// Returns the id of the member that reacted, if any.
    pub fn dispatch(&self, event: &SystemEvent) -> Option<ObjectId> {
        let (point, is_click) = match *event {
            SystemEvent::PointerDown { x, y, .. } => (Point::new(x, y), true),
            SystemEvent::PointerMoved { x, y } => (Point::new(x, y), false),
            _ => return None,
        };
        for &id in self.order.iter().rev() {
            let Some(object) = self.get(id) else { continue };
            if object.hit_test(point) {
                if is_click {
                    object.dispatch_click();
                } else {
                    object.dispatch_hover();
                }
                return Some(id);
            }
        }
        None
    }

    //--- Per-Tick Advancement ---------------------------------------------

    /// Advances every member's animation queues, visible or not;
    /// off-screen and fully transparent members drain their queues at the
    /// same rate as everything else.
    pub fn tick(&mut self, clock: &FrameClock) {
        for i in 0..self.order.len() {
            let id = self.order[i];
            if let Some(object) = self.get_mut(id) {
                object.advance(clock);
            }
        }
    }

    //--- Redraw -----------------------------------------------------------

    /// Dirty-rectangle repaint: first restores `background` under every
    /// member's previously painted rect, then paints all members in
    /// paint order. Returns the touched rects so the caller can limit
    /// presentation to them.
    pub fn redraw(&mut self, screen: &mut Surface, background: &Surface) -> Vec<Rect> {
        let mut touched = Vec::with_capacity(self.order.len() * 2);

        // Restore pass: clear every stale footprint before any repaint,
        // so overlapping members do not smear each other.
        for i in 0..self.order.len() {
            let id = self.order[i];
            if let Some(object) = self.get_mut(id) {
                if let Some(prev) = object.take_prev_rect() {
                    screen.copy_rect(background, prev);
                    touched.push(prev);
                }
            }
        }

        // Paint pass, bottom layer first.
        for i in 0..self.order.len() {
            let id = self.order[i];
            if let Some(object) = self.get_mut(id) {
                let rect = object.rect();
                screen.blit(object.image(), rect.pos(), object.alpha());
                object.set_prev_rect(rect);
                touched.push(rect);
            }
        }

        touched
    }
}

impl Default for ObjectGroup {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::Rgba;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn clock() -> FrameClock {
        FrameClock::new(60.0)
    }

    fn white_box(x: i32, y: i32, w: u32, h: u32) -> DrawableObject {
        DrawableObject::new(Surface::filled(w, h, Rgba::WHITE), Point::new(x, y))
    }

    fn counter_click(object: &mut DrawableObject) -> Arc<AtomicU32> {
        let count = Arc::new(AtomicU32::new(0));
        let probe = count.clone();
        object.connect_click(move || {
            probe.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    //=====================================================================
    // Membership Tests
    //=====================================================================

    #[test]
    fn insert_then_get_round_trips() {
        let mut group = ObjectGroup::new();
        let id = group.insert(white_box(1, 2, 3, 4));
        assert!(group.contains(id));
        assert_eq!(group.get(id).unwrap().rect(), Rect::new(1, 2, 3, 4));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn removed_ids_go_stale() {
        let mut group = ObjectGroup::new();
        let id = group.insert(white_box(0, 0, 2, 2));
        group.remove(id);
        assert!(!group.contains(id));
        assert!(group.get(id).is_none());
        assert!(group.is_empty());
    }

    #[test]
    fn reused_slot_does_not_resurrect_old_id() {
        let mut group = ObjectGroup::new();
        let old = group.insert(white_box(0, 0, 2, 2));
        group.remove(old);
        let new = group.insert(white_box(9, 9, 2, 2));
        assert!(!group.contains(old), "stale id must not alias the newcomer");
        assert!(group.contains(new));
        assert_ne!(old, new);
    }

    #[test]
    #[should_panic(expected = "member of the group")]
    fn removing_a_non_member_is_a_contract_violation() {
        let mut group = ObjectGroup::new();
        let id = group.insert(white_box(0, 0, 2, 2));
        group.remove(id);
        group.remove(id);
    }

    //=====================================================================
    // Dispatch Tests
    //=====================================================================

    #[test]
    fn click_goes_to_the_topmost_overlapping_member_only() {
        let mut group = ObjectGroup::new();
        let mut a = white_box(0, 0, 50, 50);
        let mut b = white_box(0, 0, 50, 50);
        let mut c = white_box(0, 0, 50, 50);
        let hits_a = counter_click(&mut a);
        let hits_b = counter_click(&mut b);
        let hits_c = counter_click(&mut c);
        group.insert(a);
        group.insert(b);
        let id_c = group.insert(c);

        let reacted = group.dispatch(&SystemEvent::PointerDown {
            x: 25,
            y: 25,
            button: crate::core::event::MouseButton::Left,
        });

        assert_eq!(reacted, Some(id_c), "last added is topmost");
        assert_eq!(hits_c.load(Ordering::SeqCst), 1);
        assert_eq!(hits_a.load(Ordering::SeqCst), 0);
        assert_eq!(hits_b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pointer_move_dispatches_hover_not_click() {
        let mut group = ObjectGroup::new();
        let mut obj = white_box(0, 0, 10, 10);
        let clicks = counter_click(&mut obj);
        let hovers = Arc::new(AtomicU32::new(0));
        let probe = hovers.clone();
        obj.connect_hover(move || {
            probe.fetch_add(1, Ordering::SeqCst);
        });
        group.insert(obj);

        group.dispatch(&SystemEvent::PointerMoved { x: 5, y: 5 });

        assert_eq!(hovers.load(Ordering::SeqCst), 1);
        assert_eq!(clicks.load(Ordering::SeqCst), 0, "hover and click are exclusive");
    }

    #[test]
    fn transparent_pixels_fall_through_to_lower_layers() {
        let mut group = ObjectGroup::new();
        let mut below = white_box(0, 0, 10, 10);
        let hits_below = counter_click(&mut below);
        group.insert(below);
        // Top object covers the same rect but is fully transparent there.
        let top = DrawableObject::new(Surface::new(10, 10), Point::ZERO);
        group.insert(top);

        group.dispatch(&SystemEvent::PointerDown {
            x: 5,
            y: 5,
            button: crate::core::event::MouseButton::Left,
        });

        assert_eq!(hits_below.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_pointer_events_reach_nobody() {
        let mut group = ObjectGroup::new();
        let mut obj = white_box(0, 0, 10, 10);
        let clicks = counter_click(&mut obj);
        group.insert(obj);

        assert_eq!(group.dispatch(&SystemEvent::WindowClosed), None);
        assert_eq!(
            group.dispatch(&SystemEvent::KeyDown(crate::core::event::KeyCode::Space)),
            None
        );
        assert_eq!(clicks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn miss_everywhere_returns_none() {
        let mut group = ObjectGroup::new();
        group.insert(white_box(0, 0, 10, 10));
        let reacted = group.dispatch(&SystemEvent::PointerDown {
            x: 500,
            y: 500,
            button: crate::core::event::MouseButton::Left,
        });
        assert_eq!(reacted, None);
    }

    //=====================================================================
    // Tick Tests
    //=====================================================================

    #[test]
    fn tick_advances_every_member_even_off_screen() {
        let mut group = ObjectGroup::new();
        let mut off_screen = white_box(-500, -500, 4, 4);
        off_screen.request_fade(0);
        let mut invisible = white_box(0, 0, 4, 4);
        invisible.set_alpha(0);
        invisible.request_zoom(2.0);
        let a = group.insert(off_screen);
        let b = group.insert(invisible);

        for _ in 0..64 {
            group.tick(&clock());
        }

        assert_eq!(group.get(a).unwrap().alpha(), 0);
        assert_eq!(group.get(b).unwrap().scale(), 2.0);
    }

    //=====================================================================
    // Redraw Tests
    //=====================================================================

    #[test]
    fn redraw_paints_members_over_background() {
        let mut group = ObjectGroup::new();
        group.insert(white_box(2, 2, 2, 2));
        let background = Surface::filled(8, 8, Rgba::BLACK);
        let mut screen = Surface::filled(8, 8, Rgba::BLACK);

        let touched = group.redraw(&mut screen, &background);

        assert_eq!(screen.pixel(3, 3), Rgba::WHITE);
        assert_eq!(screen.pixel(0, 0), Rgba::BLACK);
        assert!(touched.contains(&Rect::new(2, 2, 2, 2)));
    }

    #[test]
    fn moved_member_has_its_old_footprint_restored() {
        let mut group = ObjectGroup::new();
        let id = group.insert(white_box(0, 0, 2, 2));
        let background = Surface::filled(8, 8, Rgba::BLACK);
        let mut screen = Surface::filled(8, 8, Rgba::BLACK);

        group.redraw(&mut screen, &background);
        assert_eq!(screen.pixel(0, 0), Rgba::WHITE);

        group.get_mut(id).unwrap().set_position(Point::new(5, 5));
        let touched = group.redraw(&mut screen, &background);

        assert_eq!(screen.pixel(0, 0), Rgba::BLACK, "old footprint cleared");
        assert_eq!(screen.pixel(5, 5), Rgba::WHITE, "new position painted");
        assert!(touched.contains(&Rect::new(0, 0, 2, 2)));
        assert!(touched.contains(&Rect::new(5, 5, 2, 2)));
    }

    #[test]
    fn later_members_paint_over_earlier_ones() {
        let mut group = ObjectGroup::new();
        group.insert(white_box(0, 0, 4, 4));
        let red = DrawableObject::new(
            Surface::filled(4, 4, Rgba::new(255, 0, 0, 255)),
            Point::ZERO,
        );
        group.insert(red);
        let background = Surface::filled(4, 4, Rgba::BLACK);
        let mut screen = Surface::filled(4, 4, Rgba::BLACK);

        group.redraw(&mut screen, &background);

        assert_eq!(screen.pixel(1, 1), Rgba::new(255, 0, 0, 255));
    }
}
