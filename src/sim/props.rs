/// Decorative rigid-body props (floors and crates).
///
/// The simulation never reasons about these bodies. It creates them,
/// steps whatever engine sits behind `PropPhysics`, copies positions back
/// for drawing, and removes crates that have fallen out of the level.
///
/// ```text
///   char | kind  | body    | cell left as
///   -----|-------|---------|-------------
///   F    | Floor | Static  | Impassable
///   f    | Crate | Dynamic | Passable
/// ```

use std::collections::HashMap;

use glam::Vec2;

/// Side length of every prop body in pixels.
pub const PROP_SIZE: f32 = 50.0;
pub const PROP_MASS: f32 = 0.1;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BodyId(u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BodyKind {
    Static,
    Dynamic,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BodyShape {
    pub width: f32,
    pub height: f32,
}

impl BodyShape {
    pub const PROP: BodyShape = BodyShape { width: PROP_SIZE, height: PROP_SIZE };
}

/// Narrow body-lifecycle interface onto an external physics engine.
pub trait PropPhysics {
    fn create_body(&mut self, shape: BodyShape, mass: f32, kind: BodyKind) -> BodyId;
    fn set_position(&mut self, body: BodyId, position: Vec2);
    fn position(&self, body: BodyId) -> Option<Vec2>;
    fn step(&mut self, dt: f32);
    fn remove_body(&mut self, body: BodyId);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PropKind {
    Floor,
    Crate,
}

impl PropKind {
    pub fn body_kind(self) -> BodyKind {
        match self {
            PropKind::Floor => BodyKind::Static,
            PropKind::Crate => BodyKind::Dynamic,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prop {
    pub kind: PropKind,
    pub body: BodyId,
    /// Last position read back from the engine (center, pixels).
    pub position: Vec2,
}

pub fn spawn(physics: &mut dyn PropPhysics, kind: PropKind, position: Vec2) -> Prop {
    let body = physics.create_body(BodyShape::PROP, PROP_MASS, kind.body_kind());
    physics.set_position(body, position);
    Prop { kind, body, position }
}

/// Step the engine, copy positions back, and drop crates below `bottom`.
/// Returns the indices (pre-removal) of the props that were removed.
pub fn advance(physics: &mut dyn PropPhysics, props: &mut Vec<Prop>, dt: f32, bottom: f32) -> Vec<usize> {
    physics.step(dt);
    for prop in props.iter_mut() {
        if let Some(position) = physics.position(prop.body) {
            prop.position = position;
        }
    }

    let mut removed = Vec::new();
    for i in (0..props.len()).rev() {
        if props[i].kind == PropKind::Crate && props[i].position.y > bottom {
            physics.remove_body(props[i].body);
            props.remove(i);
            removed.push(i);
        }
    }
    removed.reverse();
    removed
}

/// Stores positions and nothing else. Bodies never move on their own.
#[derive(Default, Debug)]
pub struct StillProps {
    next: u32,
    bodies: HashMap<BodyId, Vec2>,
}

impl StillProps {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl StillProps {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }
}

impl PropPhysics for StillProps {
    fn create_body(&mut self, _shape: BodyShape, _mass: f32, _kind: BodyKind) -> BodyId {
        let id = BodyId(self.next);
        self.next += 1;
        self.bodies.insert(id, Vec2::ZERO);
        id
    }

    fn set_position(&mut self, body: BodyId, position: Vec2) {
        if let Some(p) = self.bodies.get_mut(&body) {
            *p = position;
        }
    }

    fn position(&self, body: BodyId) -> Option<Vec2> {
        self.bodies.get(&body).copied()
    }

    fn step(&mut self, _dt: f32) {}

    fn remove_body(&mut self, body: BodyId) {
        self.bodies.remove(&body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dynamic bodies fall at a constant speed.
    #[derive(Default)]
    struct SinkingProps {
        inner: StillProps,
        dynamic: Vec<BodyId>,
    }

    impl PropPhysics for SinkingProps {
        fn create_body(&mut self, shape: BodyShape, mass: f32, kind: BodyKind) -> BodyId {
            let id = self.inner.create_body(shape, mass, kind);
            if kind == BodyKind::Dynamic {
                self.dynamic.push(id);
            }
            id
        }

        fn set_position(&mut self, body: BodyId, position: Vec2) {
            self.inner.set_position(body, position);
        }

        fn position(&self, body: BodyId) -> Option<Vec2> {
            self.inner.position(body)
        }

        fn step(&mut self, dt: f32) {
            for id in &self.dynamic {
                if let Some(p) = self.inner.position(*id) {
                    self.inner.set_position(*id, p + Vec2::new(0.0, 100.0 * dt));
                }
            }
        }

        fn remove_body(&mut self, body: BodyId) {
            self.inner.remove_body(body);
            self.dynamic.retain(|id| *id != body);
        }
    }

    #[test]
    fn still_props_keep_their_place() {
        let mut physics = StillProps::new();
        let mut props = vec![spawn(&mut physics, PropKind::Crate, Vec2::new(20.0, 16.0))];
        let removed = advance(&mut physics, &mut props, 1.0, 64.0);
        assert!(removed.is_empty());
        assert_eq!(props[0].position, Vec2::new(20.0, 16.0));
    }

    #[test]
    fn fallen_crates_are_removed_but_floors_stay() {
        let mut physics = SinkingProps::default();
        let mut props = vec![
            spawn(&mut physics, PropKind::Floor, Vec2::new(20.0, 200.0)),
            spawn(&mut physics, PropKind::Crate, Vec2::new(60.0, 50.0)),
            spawn(&mut physics, PropKind::Crate, Vec2::new(100.0, 0.0)),
        ];
        let removed = advance(&mut physics, &mut props, 0.2, 64.0);
        assert_eq!(removed, vec![1]);
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].kind, PropKind::Floor);
        assert_eq!(props[1].position, Vec2::new(100.0, 20.0));
        assert_eq!(physics.inner.len(), 2);
    }
}
