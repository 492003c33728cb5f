#![forbid(unsafe_code)]

//! Easing curves and the frame-stepped scroll tween used for corrective
//! scrolling.
//!
//! The list engine has no wall clock: it only sees scheduler frames. A
//! [`ScrollTween`] therefore advances by whole frames and reports an integer
//! pixel offset per step, ending exactly on its target.

/// Maps animation progress in `[0, 1]` to eased progress in `[0, 1]`.
pub type EasingFn = fn(f32) -> f32;

/// Constant speed.
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Decelerates towards the end (quadratic).
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let rest = 1.0 - t.clamp(0.0, 1.0);
    1.0 - rest * rest
}

/// Accelerates through the first half, decelerates through the second.
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        return 2.0 * t * t;
    }
    let rest = 2.0 - 2.0 * t;
    1.0 - rest * rest / 2.0
}

/// Decelerates harder than [`ease_out`]. The default for scroll tweens.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let rest = 1.0 - t.clamp(0.0, 1.0);
    1.0 - rest * rest * rest
}

/// Interpolates a scroll offset from `from` to `to` over a fixed number of frames.
#[derive(Debug, Clone, Copy)]
pub struct ScrollTween {
    from: u32,
    to: u32,
    frame: u32,
    frames: u32,
    easing: EasingFn,
}

impl ScrollTween {
    /// Create a tween over `frames` frames (minimum one) with ease-out-cubic.
    #[must_use]
    pub fn new(from: u32, to: u32, frames: u32) -> Self {
        Self {
            from,
            to,
            frame: 0,
            frames: frames.max(1),
            easing: ease_out_cubic,
        }
    }

    /// Use `curve` instead of [`ease_out_cubic`].
    #[must_use]
    pub fn easing(self, curve: EasingFn) -> Self {
        Self {
            easing: curve,
            ..self
        }
    }

    #[must_use]
    pub fn target(&self) -> u32 {
        self.to
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frame >= self.frames
    }

    /// Current interpolated offset.
    #[must_use]
    pub fn position(&self) -> u32 {
        if self.is_complete() {
            return self.to;
        }
        let t = (self.easing)(self.frame as f32 / self.frames as f32);
        let range = f64::from(self.to) - f64::from(self.from);
        let pos = f64::from(self.from) + range * f64::from(t);
        pos.round().clamp(0.0, f64::from(u32::MAX)) as u32
    }

    /// Advance one frame and return the new offset.
    pub fn step(&mut self) -> u32 {
        self.frame = (self.frame + 1).min(self.frames);
        self.position()
    }
}
