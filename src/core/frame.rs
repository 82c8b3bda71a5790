//=========================================================================
// Frame
//
// A nested layout container. A frame has a declared size, a position
// relative to its parent, and an absolute position kept consistent
// top-down: absolute = parent absolute + relative, re-clamped so the
// frame never leaves the parent's rectangle.
//
// Ownership split (one paint owner per drawable): the drawables a frame
// lays out live in the enclosing scene's object group; the frame only
// records their ids for positioning, fan-out binding, and teardown.
// Child frames are owned by value.
//
// Leaf vs. container is decided by which method you call — `add_object`
// for drawables, `add_frame` for subtrees — so nothing is ever
// type-checked at runtime.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::event::SystemEvent;
use crate::core::geometry::{Point, Rect, Size};
use crate::core::group::{ObjectGroup, ObjectId};
use crate::core::object::{Callback, DrawableObject, FrameClock};

use std::sync::Arc;

//=== Frame ===============================================================

/// A bounded, auto-growing layout container for drawables and child
/// frames.
pub struct Frame {
    size: Size,
    rel: Point,
    abs: Point,
    members: Vec<ObjectId>,
    children: Vec<Frame>,
}

impl Frame {
    //--- Construction -----------------------------------------------------

    /// A detached frame of the given size. It gets a real position when
    /// attached to a scene or parent frame.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            rel: Point::ZERO,
            abs: Point::ZERO,
            members: Vec::new(),
            children: Vec::new(),
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn size(&self) -> Size {
        self.size
    }

    /// Position relative to the parent, after clamping.
    pub fn relative_pos(&self) -> Point {
        self.rel
    }

    /// Absolute rectangle in screen coordinates.
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.abs, self.size)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Ids of the drawables laid out directly by this frame (not by its
    /// children), in insertion order.
    pub fn members(&self) -> &[ObjectId] {
        &self.members
    }

    pub fn children(&self) -> &[Frame] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.children.get_mut(index)
    }

    //--- Layout -----------------------------------------------------------

    /// Adds a drawable at (x, y) relative to this frame. The drawable is
    /// registered in `group` (the scene-level paint owner) and its id
    /// recorded here. A drawable larger than the frame grows the frame to
    /// match, per axis.
    pub fn add_object(
        &mut self,
        group: &mut ObjectGroup,
        mut object: DrawableObject,
        x: i32,
        y: i32,
    ) -> ObjectId {
        let obj_size = object.rect().size();
        if obj_size.w > self.size.w {
            self.size.w = obj_size.w;
        }
        if obj_size.h > self.size.h {
            self.size.h = obj_size.h;
        }
        object.set_position(self.abs.offset(x, y));
        let id = group.insert(object);
        self.members.push(id);
        id
    }

    /// Adds a child frame at (x, y) relative to this frame, growing this
    /// frame per axis when the child is larger, then positioning the
    /// child's whole subtree.
    pub fn add_frame(&mut self, group: &mut ObjectGroup, mut child: Frame, x: i32, y: i32) {
        if child.size.w > self.size.w {
            self.size.w = child.size.w;
        }
        if child.size.h > self.size.h {
            self.size.h = child.size.h;
        }
        let parent_rect = self.rect();
        child.set_position(group, Point::new(x, y), parent_rect);
        self.children.push(child);
    }

    /// Moves the frame to `rel` within `parent_rect`, clamping each axis
    /// so the frame stays fully inside the parent, then cascades: member
    /// drawables shift by the resulting delta and child frames recompute
    /// their absolute positions top-down.
    pub fn set_position(&mut self, group: &mut ObjectGroup, rel: Point, parent_rect: Rect) {
        let wanted = Rect::new(
            parent_rect.x + rel.x,
            parent_rect.y + rel.y,
            self.size.w,
            self.size.h,
        );
        let clamped = wanted.clamped_within(&parent_rect);
        let old_abs = self.abs;
        self.abs = clamped.pos();
        self.rel = Point::new(self.abs.x - parent_rect.x, self.abs.y - parent_rect.y);

        let dx = self.abs.x - old_abs.x;
        let dy = self.abs.y - old_abs.y;
        if dx != 0 || dy != 0 {
            for &id in &self.members {
                if let Some(object) = group.get_mut(id) {
                    let pos = object.pos();
                    object.set_position(pos.offset(dx, dy));
                }
            }
        }

        let my_rect = self.rect();
        for child in &mut self.children {
            let child_rel = child.rel;
            child.set_position(group, child_rel, my_rect);
        }
    }

    /// Moves the frame so its center lands on `center` (clamped like any
    /// other reposition).
    pub fn set_center(&mut self, group: &mut ObjectGroup, center: Point, parent_rect: Rect) {
        let rel = Point::new(
            center.x - (self.size.w as i32) / 2 - parent_rect.x,
            center.y - (self.size.h as i32) / 2 - parent_rect.y,
        );
        self.set_position(group, rel, parent_rect);
    }

    //--- Event & Tick Forwarding ------------------------------------------

    /// Forwards a pointer event to this frame's members (topmost first),
    /// then to child frames in insertion order, stopping at the first
    /// member that reacts.
    ///
    /// Inside a scene the scene-level group dispatches globally instead;
    /// this entry point drives detached frame trees.
    pub fn dispatch(&self, group: &ObjectGroup, event: &SystemEvent) -> Option<ObjectId> {
        let (point, is_click) = match *event {
            SystemEvent::PointerDown { x, y, .. } => (Point::new(x, y), true),
            SystemEvent::PointerMoved { x, y } => (Point::new(x, y), false),
            _ => return None,
        };
        for &id in self.members.iter().rev() {
            let Some(object) = group.get(id) else { continue };
            if object.hit_test(point) {
                if is_click {
                    object.dispatch_click();
                } else {
                    object.dispatch_hover();
                }
                return Some(id);
            }
        }
        for child in &self.children {
            if let Some(hit) = child.dispatch(group, event) {
                return Some(hit);
            }
        }
        None
    }

    /// Advances the animation queues of this frame's members and,
    /// recursively, of every descendant frame's members.
    pub fn tick(&self, group: &mut ObjectGroup, clock: &FrameClock) {
        for &id in &self.members {
            if let Some(object) = group.get_mut(id) {
                object.advance(clock);
            }
        }
        for child in &self.children {
            child.tick(group, clock);
        }
    }

    //--- Action Fan-Out ---------------------------------------------------

    /// Binds `action` as the click action of every current member and of
    /// every descendant frame's current members. This is a snapshot at
    /// call time, not a live subscription: drawables added afterward are
    /// unaffected.
    pub fn connect_click<F: Fn() + Send + Sync + 'static>(
        &self,
        group: &mut ObjectGroup,
        action: F,
    ) {
        self.connect_click_shared(group, Arc::new(action));
    }

    /// Snapshot fan-out of a hover action; same semantics as
    /// [`Frame::connect_click`].
    pub fn connect_hover<F: Fn() + Send + Sync + 'static>(
        &self,
        group: &mut ObjectGroup,
        action: F,
    ) {
        self.connect_hover_shared(group, Arc::new(action));
    }

    fn connect_click_shared(&self, group: &mut ObjectGroup, action: Callback) {
        for &id in &self.members {
            if let Some(object) = group.get_mut(id) {
                object.connect_click_shared(action.clone());
            }
        }
        for child in &self.children {
            child.connect_click_shared(group, action.clone());
        }
    }

    fn connect_hover_shared(&self, group: &mut ObjectGroup, action: Callback) {
        for &id in &self.members {
            if let Some(object) = group.get_mut(id) {
                object.connect_hover_shared(action.clone());
            }
        }
        for child in &self.children {
            child.connect_hover_shared(group, action.clone());
        }
    }

    //--- Teardown ---------------------------------------------------------

    /// Removes one member drawable from this frame and from the paint
    /// group.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a member of this frame.
    pub fn remove_object(&mut self, group: &mut ObjectGroup, id: ObjectId) -> DrawableObject {
        let pos = self
            .members
            .iter()
            .position(|&member| member == id)
            .expect("object must be a member of this frame");
        self.members.remove(pos);
        group.remove(id)
    }

    /// Detaches and dismantles the child frame at `index`, cascading to
    /// its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_frame(&mut self, group: &mut ObjectGroup, index: usize) {
        assert!(index < self.children.len(), "no child frame at index {index}");
        let mut child = self.children.remove(index);
        child.dismantle(group);
    }

    /// Removes every member of this frame and of every descendant frame
    /// from the paint group, leaving the frame empty. Ids that already
    /// went stale (removed through the scene directly) are skipped.
    pub fn dismantle(&mut self, group: &mut ObjectGroup) {
        for id in self.members.drain(..) {
            if group.contains(id) {
                group.remove(id);
            }
        }
        for child in &mut self.children {
            child.dismantle(group);
        }
        self.children.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::{Rgba, Surface};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn white_box(w: u32, h: u32) -> DrawableObject {
        DrawableObject::new(Surface::filled(w, h, Rgba::WHITE), Point::ZERO)
    }

    fn parent_rect() -> Rect {
        Rect::new(0, 0, 200, 150)
    }

    //=====================================================================
    // Layout Tests
    //=====================================================================

    #[test]
    fn objects_are_positioned_relative_to_the_frame() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(50, 50));
        frame.set_position(&mut group, Point::new(20, 30), parent_rect());
        let id = frame.add_object(&mut group, white_box(10, 10), 5, 5);
        assert_eq!(group.get(id).unwrap().pos(), Point::new(25, 35));
    }

    #[test]
    fn oversized_child_grows_the_frame_per_axis() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(10, 40));
        frame.add_object(&mut group, white_box(30, 20), 0, 0);
        assert_eq!(frame.size(), Size::new(30, 40), "width grew, height kept");
    }

    #[test]
    fn oversized_child_frame_grows_the_parent() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(10, 10));
        frame.add_frame(&mut group, Frame::new(Size::new(25, 5)), 0, 0);
        assert_eq!(frame.size(), Size::new(25, 10));
    }

    #[test]
    fn set_position_clamps_fully_inside_the_parent() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(40, 30));
        for &(x, y) in &[(-100, -100), (500, 500), (180, 10), (0, 149)] {
            frame.set_position(&mut group, Point::new(x, y), parent_rect());
            let r = frame.rect();
            let p = parent_rect();
            assert!(r.x >= p.x && r.right() <= p.right(), "x clamped for ({x}, {y})");
            assert!(r.y >= p.y && r.bottom() <= p.bottom(), "y clamped for ({x}, {y})");
        }
    }

    #[test]
    fn repositioning_shifts_members_by_the_same_delta() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(50, 50));
        frame.set_position(&mut group, Point::new(10, 10), parent_rect());
        let id = frame.add_object(&mut group, white_box(8, 8), 4, 4);
        assert_eq!(group.get(id).unwrap().pos(), Point::new(14, 14));

        frame.set_position(&mut group, Point::new(100, 60), parent_rect());
        assert_eq!(group.get(id).unwrap().pos(), Point::new(104, 64));
    }

    #[test]
    fn repositioning_cascades_into_child_frames() {
        let mut group = ObjectGroup::new();
        let mut root = Frame::new(Size::new(100, 100));
        root.set_position(&mut group, Point::new(0, 0), parent_rect());

        let mut inner = Frame::new(Size::new(20, 20));
        inner.set_position(&mut group, Point::ZERO, root.rect());
        let id = inner.add_object(&mut group, white_box(5, 5), 2, 2);
        root.add_frame(&mut group, inner, 10, 10);
        assert_eq!(group.get(id).unwrap().pos(), Point::new(12, 12));

        root.set_position(&mut group, Point::new(50, 40), parent_rect());
        let child_rect = root.children()[0].rect();
        assert_eq!(child_rect.pos(), Point::new(60, 50));
        assert_eq!(group.get(id).unwrap().pos(), Point::new(62, 52));
    }

    #[test]
    fn set_center_lands_the_frame_center() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(40, 20));
        frame.set_center(&mut group, Point::new(100, 75), parent_rect());
        assert_eq!(frame.center(), Point::new(100, 75));
    }

    //=====================================================================
    // Dispatch & Tick Tests
    //=====================================================================

    #[test]
    fn dispatch_prefers_members_over_children_and_stops_at_first_hit() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(100, 100));
        frame.set_position(&mut group, Point::ZERO, parent_rect());

        static MEMBER: AtomicU32 = AtomicU32::new(0);
        static NESTED: AtomicU32 = AtomicU32::new(0);

        let mut inner = Frame::new(Size::new(50, 50));
        inner.set_position(&mut group, Point::ZERO, frame.rect());
        let mut nested_obj = white_box(50, 50);
        nested_obj.connect_click(|| {
            NESTED.fetch_add(1, Ordering::SeqCst);
        });
        inner.add_object(&mut group, nested_obj, 0, 0);
        frame.add_frame(&mut group, inner, 0, 0);

        let mut member_obj = white_box(50, 50);
        member_obj.connect_click(|| {
            MEMBER.fetch_add(1, Ordering::SeqCst);
        });
        frame.add_object(&mut group, member_obj, 0, 0);

        frame.dispatch(
            &group,
            &SystemEvent::PointerDown {
                x: 10,
                y: 10,
                button: crate::core::event::MouseButton::Left,
            },
        );

        assert_eq!(MEMBER.load(Ordering::SeqCst), 1);
        assert_eq!(NESTED.load(Ordering::SeqCst), 0, "only one reactor per event");
    }

    #[test]
    fn tick_reaches_nested_members() {
        let mut group = ObjectGroup::new();
        let mut root = Frame::new(Size::new(100, 100));
        root.set_position(&mut group, Point::ZERO, parent_rect());
        let mut inner = Frame::new(Size::new(50, 50));
        inner.set_position(&mut group, Point::ZERO, root.rect());
        let mut obj = white_box(10, 10);
        obj.request_fade(0);
        let id = inner.add_object(&mut group, obj, 0, 0);
        root.add_frame(&mut group, inner, 0, 0);

        let clock = FrameClock::new(60.0);
        for _ in 0..64 {
            root.tick(&mut group, &clock);
        }
        assert_eq!(group.get(id).unwrap().alpha(), 0);
    }

    //=====================================================================
    // Fan-Out Tests
    //=====================================================================

    #[test]
    fn connect_click_binds_current_members_and_descendants() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut group = ObjectGroup::new();
        let mut root = Frame::new(Size::new(100, 100));
        root.set_position(&mut group, Point::ZERO, parent_rect());
        let direct = root.add_object(&mut group, white_box(10, 10), 0, 0);
        let mut inner = Frame::new(Size::new(50, 50));
        inner.set_position(&mut group, Point::ZERO, root.rect());
        let nested = inner.add_object(&mut group, white_box(10, 10), 0, 0);
        root.add_frame(&mut group, inner, 0, 0);

        root.connect_click(&mut group, || {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });

        group.get(direct).unwrap().dispatch_click();
        group.get(nested).unwrap().dispatch_click();
        assert_eq!(FIRED.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fan_out_is_a_snapshot_not_a_live_subscription() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(100, 100));
        frame.set_position(&mut group, Point::ZERO, parent_rect());
        frame.connect_click(&mut group, || {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });

        let late = frame.add_object(&mut group, white_box(10, 10), 0, 0);
        group.get(late).unwrap().dispatch_click();
        assert_eq!(FIRED.load(Ordering::SeqCst), 0, "late members get nothing");
    }

    //=====================================================================
    // Teardown Tests
    //=====================================================================

    #[test]
    fn dismantle_removes_the_whole_subtree_from_the_group() {
        let mut group = ObjectGroup::new();
        let mut root = Frame::new(Size::new(100, 100));
        root.set_position(&mut group, Point::ZERO, parent_rect());
        root.add_object(&mut group, white_box(10, 10), 0, 0);
        let mut inner = Frame::new(Size::new(50, 50));
        inner.set_position(&mut group, Point::ZERO, root.rect());
        inner.add_object(&mut group, white_box(10, 10), 0, 0);
        root.add_frame(&mut group, inner, 0, 0);
        assert_eq!(group.len(), 2);

        root.dismantle(&mut group);
        assert!(group.is_empty());
        assert!(root.members().is_empty());
        assert!(root.children().is_empty());
    }

    #[test]
    fn remove_frame_tears_down_only_that_child() {
        let mut group = ObjectGroup::new();
        let mut root = Frame::new(Size::new(100, 100));
        root.set_position(&mut group, Point::ZERO, parent_rect());
        let kept = root.add_object(&mut group, white_box(10, 10), 0, 0);
        let mut inner = Frame::new(Size::new(50, 50));
        inner.set_position(&mut group, Point::ZERO, root.rect());
        inner.add_object(&mut group, white_box(10, 10), 0, 0);
        root.add_frame(&mut group, inner, 0, 0);

        root.remove_frame(&mut group, 0);
        assert_eq!(group.len(), 1);
        assert!(group.contains(kept));
    }

    #[test]
    #[should_panic(expected = "member of this frame")]
    fn removing_a_foreign_object_is_a_contract_violation() {
        let mut group = ObjectGroup::new();
        let mut frame = Frame::new(Size::new(100, 100));
        frame.set_position(&mut group, Point::ZERO, parent_rect());
        let foreign = group.insert(white_box(5, 5));
        frame.remove_object(&mut group, foreign);
    }
}
