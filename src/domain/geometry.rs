/// Integer rectangles and overlap math in pixel space.
///
/// Rectangles are half-open: `right()` and `bottom()` are the first
/// pixel *outside* the rectangle, so two rects that merely touch do
/// not intersect.
///
/// Intersection depth (signed, per axis):
///
/// ```text
///   distance = center(a) - center(b)
///   min      = half(a) + half(b)
///   |distance| >= min on either axis  →  (0, 0)
///   depth    = distance > 0 ?  min - distance  : -min - distance
/// ```
///
/// Adding the depth to `a`'s position separates the two on that axis.

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Rect { left, top, width, height }
    }

    /// Rect of the given size whose bottom edge is centered on `anchor`.
    pub fn from_bottom_center(anchor: Vec2, width: i32, height: i32) -> Self {
        let x = anchor.x.round() as i32;
        let y = anchor.y.round() as i32;
        Rect::new(x - width / 2, y - height, width, height)
    }

    /// Rect of the given size centered on `center`.
    pub fn from_center(center: Vec2, width: i32, height: i32) -> Self {
        let x = center.x.round() as i32;
        let y = center.y.round() as i32;
        Rect::new(x - width / 2, y - height / 2, width, height)
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.left as f32 + self.width as f32 / 2.0,
            self.top as f32 + self.height as f32 / 2.0,
        )
    }

    pub fn bottom_center(&self) -> Vec2 {
        Vec2::new(self.left as f32 + self.width as f32 / 2.0, self.bottom() as f32)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left as f32
            && point.x < self.right() as f32
            && point.y >= self.top as f32
            && point.y < self.bottom() as f32
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// Signed penetration of `self` into `other`; zero when they do not overlap.
    pub fn intersection_depth(&self, other: &Rect) -> Vec2 {
        let half_a = Vec2::new(self.width as f32, self.height as f32) / 2.0;
        let half_b = Vec2::new(other.width as f32, other.height as f32) / 2.0;

        let distance = self.center() - other.center();
        let min = half_a + half_b;

        if distance.x.abs() >= min.x || distance.y.abs() >= min.y {
            return Vec2::ZERO;
        }

        let depth_x = if distance.x > 0.0 { min.x - distance.x } else { -min.x - distance.x };
        let depth_y = if distance.y > 0.0 { min.y - distance.y } else { -min.y - distance.y };
        Vec2::new(depth_x, depth_y)
    }
}

/// Pickup volume for gems.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Circle { center, radius }
    }

    pub fn intersects(&self, rect: &Rect) -> bool {
        let nearest = Vec2::new(
            self.center.x.clamp(rect.left as f32, rect.right() as f32),
            self.center.y.clamp(rect.top as f32, rect.bottom() as f32),
        );
        self.center.distance_squared(nearest) < self.radius * self.radius
    }
}
