//! Optional decorative effect after a successful classification.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Origin {
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CelebrationOptions {
    pub spread: u32,
    pub origin: Origin,
}

impl Default for CelebrationOptions {
    fn default() -> Self {
        Self {
            spread: 60,
            origin: Origin { y: 0.6 },
        }
    }
}

pub trait Celebration: Send + Sync {
    fn celebrate(&self, options: &CelebrationOptions);
}

/// Used when no animation capability is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCelebration;

impl Celebration for NoCelebration {
    fn celebrate(&self, _options: &CelebrationOptions) {}
}
