//! Axis-aligned rectangles and circle contacts
//!
//! Screen space: origin top-left, y grows downward. Rectangles are stored by
//! their top-left corner so occupancy checks stay cheap comparisons.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle around a center point
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow the rectangle by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Strict overlap test: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// True if `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Closest point of the rectangle to `point`
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        )
    }
}

/// A circle/rectangle overlap
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Surface normal pointing from the rectangle toward the circle center
    pub normal: Vec2,
    /// Overlap depth along the normal
    pub penetration: f32,
}

/// Check a circle against a rectangle
///
/// When the circle center is already inside the rectangle the exit side is
/// the one with the least overlap.
pub fn circle_rect_contact(center: Vec2, radius: f32, rect: &Rect) -> Option<Contact> {
    let closest = rect.clamp_point(center);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 0.0 {
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        return Some(Contact {
            normal: delta / dist,
            penetration: radius - dist,
        });
    }

    // Center inside the rectangle - push out through the nearest side
    let exits = [
        (center.x - rect.x, Vec2::NEG_X),
        (rect.right() - center.x, Vec2::X),
        (center.y - rect.y, Vec2::NEG_Y),
        (rect.bottom() - center.y, Vec2::Y),
    ];
    let (depth, normal) = exits
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::NEG_Y));
    Some(Contact {
        normal,
        penetration: depth + radius,
    })
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Resolve a contact for a moving circle: push it out and reflect if approaching
pub fn bounce(pos: &mut Vec2, vel: &mut Vec2, contact: &Contact) {
    *pos += contact.normal * contact.penetration;
    if vel.dot(contact.normal) < 0.0 {
        *vel = reflect_velocity(*vel, contact.normal);
    }
}
