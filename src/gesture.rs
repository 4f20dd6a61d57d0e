//! Single-gesture classifier: peace sign or not.

use image::Rgb;

use crate::types::{Finger, FingerVector};

pub const NO_HANDS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const PEACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const READY_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    NoHands,
    Peace,
    Ready { extended: u8 },
}

/// What the classifier asks of the jump controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpRequest {
    Trigger,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureResult {
    pub gesture: Gesture,
    pub label: String,
    pub color: Rgb<u8>,
}

/// Index and middle up; thumb, ring and pinky down. No partial matches.
pub fn is_peace_sign(fingers: &FingerVector) -> bool {
    fingers.is_extended(Finger::Index)
        && fingers.is_extended(Finger::Middle)
        && fingers.is_curled(Finger::Thumb)
        && fingers.is_curled(Finger::Ring)
        && fingers.is_curled(Finger::Pinky)
}

impl Gesture {
    pub fn classify(hand: Option<&FingerVector>) -> Self {
        match hand {
            None => Gesture::NoHands,
            Some(fingers) if is_peace_sign(fingers) => Gesture::Peace,
            Some(fingers) => Gesture::Ready {
                extended: fingers.extended_count(),
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            Gesture::NoHands => "NO HANDS".to_string(),
            Gesture::Peace => "PEACE - JUMP!".to_string(),
            Gesture::Ready { extended } => format!("READY ({} FINGERS)", extended),
        }
    }

    pub fn color(&self) -> Rgb<u8> {
        match self {
            Gesture::NoHands => NO_HANDS_COLOR,
            Gesture::Peace => PEACE_COLOR,
            Gesture::Ready { .. } => READY_COLOR,
        }
    }

    pub fn jump_request(&self) -> JumpRequest {
        match self {
            Gesture::Peace => JumpRequest::Trigger,
            Gesture::NoHands | Gesture::Ready { .. } => JumpRequest::Release,
        }
    }

    pub fn result(&self) -> GestureResult {
        GestureResult {
            gesture: *self,
            label: self.label(),
            color: self.color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case([0, 1, 1, 0, 0], "PEACE - JUMP!")]
    #[case([1, 1, 1, 1, 1], "READY (5 FINGERS)")]
    #[case([0, 0, 0, 0, 0], "READY (0 FINGERS)")]
    #[case([1, 1, 1, 0, 0], "READY (3 FINGERS)")]
    #[case([0, 1, 1, 1, 0], "READY (3 FINGERS)")]
    #[case([0, 1, 1, 0, 1], "READY (3 FINGERS)")]
    #[case([0, 1, 0, 0, 0], "READY (1 FINGERS)")]
    #[case([0, 0, 1, 0, 0], "READY (1 FINGERS)")]
    fn labels_follow_finger_bits(#[case] bits: [u8; 5], #[case] expected: &str) {
        let gesture = Gesture::classify(Some(&FingerVector::from_bits(bits)));
        assert_eq!(gesture.label(), expected);
    }

    #[test]
    fn no_hand_is_red_and_releases() {
        let result = Gesture::classify(None).result();
        assert_eq!(result.label, "NO HANDS");
        assert_eq!(result.color, NO_HANDS_COLOR);
        assert_eq!(result.gesture.jump_request(), JumpRequest::Release);
    }

    #[test]
    fn peace_is_green_and_triggers() {
        let result = Gesture::classify(Some(&FingerVector::from_bits([0, 1, 1, 0, 0]))).result();
        assert_eq!(result.color, PEACE_COLOR);
        assert_eq!(result.gesture.jump_request(), JumpRequest::Trigger);
    }

    fn any_bits() -> impl Strategy<Value = [u8; 5]> {
        prop::array::uniform5(0u8..=1)
    }

    proptest! {
        #[test]
        fn only_exact_pattern_is_peace(bits in any_bits()) {
            let gesture = Gesture::classify(Some(&FingerVector::from_bits(bits)));
            if bits == [0, 1, 1, 0, 0] {
                prop_assert_eq!(gesture, Gesture::Peace);
            } else {
                let n: u8 = bits.iter().sum();
                prop_assert_eq!(gesture, Gesture::Ready { extended: n });
                prop_assert_eq!(gesture.label(), format!("READY ({} FINGERS)", n));
                prop_assert_eq!(gesture.color(), READY_COLOR);
                prop_assert_eq!(gesture.jump_request(), JumpRequest::Release);
            }
        }
    }
}
