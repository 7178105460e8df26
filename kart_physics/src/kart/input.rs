/// Decoded per-tick driving intent. Device polling happens upstream.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KartInput {
    pub accelerate: bool,
    pub brake: bool,
    pub slide: bool,
    /// Steering in [-1, 1]; positive increases heading.
    pub turn: f32,
}

impl KartInput {
    pub const NONE: Self = Self {
        accelerate: false,
        brake: false,
        slide: false,
        turn: 0.0,
    };

    pub fn new(accelerate: bool, brake: bool, slide: bool, turn: f32) -> Self {
        Self {
            accelerate,
            brake,
            slide,
            turn,
        }
        .sanitized()
    }

    pub fn throttle() -> Self {
        Self::new(true, false, false, 0.0)
    }

    /// Clamp turn to [-1, 1]; non-finite steering is dropped.
    pub fn sanitized(mut self) -> Self {
        if !self.turn.is_finite() {
            log::warn!("non-finite turn input {} ignored", self.turn);
            self.turn = 0.0;
        }
        self.turn = self.turn.clamp(-1.0, 1.0);
        self
    }

    pub fn without_turn(mut self) -> Self {
        self.turn = 0.0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_is_clamped_and_nan_dropped() {
        assert_eq!(KartInput::new(false, false, false, 3.0).turn, 1.0);
        assert_eq!(KartInput::new(false, false, false, -7.5).turn, -1.0);
        assert_eq!(KartInput::new(true, false, false, f32::NAN).turn, 0.0);
    }
}
