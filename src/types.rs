/// Represents a single 3D point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Square of side `max(width, height) * scale` around the shifted center.
    /// `shift_y` is a fraction of the height (negative moves up).
    pub fn to_square(&self, scale: f32, shift_y: f32) -> Rect {
        let (cx, cy) = self.center();
        let cy = cy + shift_y * self.height;
        let side = self.width.max(self.height) * scale;
        Rect::new(cx - side / 2.0, cy - side / 2.0, side, side)
    }

    /// Intersect with a `width` x `height` frame. Returns None if nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<Rect> {
        let x0 = self.x.max(0.0);
        let y0 = self.y.max(0.0);
        let x1 = (self.x + self.width).min(width as f32);
        let y1 = (self.y + self.height).min(height as f32);
        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Bounding box of a set of points.
    pub fn bounding(points: &[Point3D]) -> Option<Rect> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Anatomical finger order used everywhere a finger vector is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

/// Extended (true) / curled (false) state for thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerVector([bool; 5]);

impl FingerVector {
    pub fn new(extended: [bool; 5]) -> Self {
        Self(extended)
    }

    /// Build from the 1/0 convention. Any non-zero entry counts as extended.
    pub fn from_bits(bits: [u8; 5]) -> Self {
        Self(bits.map(|b| b != 0))
    }

    pub fn bits(&self) -> [u8; 5] {
        self.0.map(u8::from)
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    pub fn is_curled(&self, finger: Finger) -> bool {
        !self.is_extended(finger)
    }

    pub fn extended_count(&self) -> u8 {
        self.0.iter().filter(|&&up| up).count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn flipped(self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

/// One detected hand for the current frame.
#[derive(Debug, Clone)]
pub struct HandObservation {
    /// 21 landmarks in frame pixels, empty for simulated hands.
    pub landmarks: Vec<Point3D>,
    pub handedness: Handedness,
    pub score: f32,
    pub fingers: FingerVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finger_vector_counts_extended() {
        let v = FingerVector::from_bits([0, 1, 1, 0, 0]);
        assert_eq!(v.extended_count(), 2);
        assert!(v.is_extended(Finger::Index));
        assert!(v.is_curled(Finger::Thumb));
        assert_eq!(v.bits(), [0, 1, 1, 0, 0]);
    }

    #[test]
    fn clip_discards_rects_outside_frame() {
        assert!(Rect::new(700.0, 10.0, 50.0, 50.0).clip(640, 480).is_none());
        let clipped = Rect::new(-10.0, -10.0, 100.0, 100.0).clip(640, 480).unwrap();
        assert_eq!(clipped, Rect::new(0.0, 0.0, 90.0, 90.0));
    }

    #[test]
    fn square_uses_longest_side() {
        let sq = Rect::new(100.0, 100.0, 40.0, 20.0).to_square(2.0, 0.0);
        assert_eq!(sq.width, 80.0);
        assert_eq!(sq.height, 80.0);
        assert_eq!(sq.center(), (120.0, 110.0));
    }
}
