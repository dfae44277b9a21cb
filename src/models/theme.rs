use rand::Rng;
use serde::Serialize;

/// Background gradient for one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Theme {
    pub start: &'static str,
    pub end: &'static str,
}

pub const PALETTE: [Theme; 8] = [
    Theme { start: "#89f7fe", end: "#66a6ff" }, // blue sky
    Theme { start: "#ff9a9e", end: "#fad0c4" }, // pink-peach
    Theme { start: "#a1c4fd", end: "#c2e9fb" }, // soft blue
    Theme { start: "#fbc2eb", end: "#a6c1ee" }, // purple-pink
    Theme { start: "#fddb92", end: "#d1fdff" }, // sunny yellow
    Theme { start: "#84fab0", end: "#8fd3f4" }, // aqua-green
    Theme { start: "#fccb90", end: "#d57eeb" }, // sunset
    Theme { start: "#f6d365", end: "#fda085" }, // orange-peach
];

pub fn pick_theme() -> Theme {
    pick_theme_with(&mut rand::rng())
}

pub fn pick_theme_with<R: Rng>(rng: &mut R) -> Theme {
    PALETTE[rng.random_range(0..PALETTE.len())]
}

impl Theme {
    pub fn gradient(&self) -> String {
        format!("linear-gradient(135deg, {}, {})", self.start, self.end)
    }
}
