use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Measure;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Series colours: measure → Color32
// ---------------------------------------------------------------------------

/// Fixed colour per measure so a series keeps its colour across charts and
/// selections.
#[derive(Debug, Clone)]
pub struct SeriesColors {
    /// Indexed by [`Measure::index`].
    colors: [Color32; Measure::COUNT],
}

impl Default for SeriesColors {
    fn default() -> Self {
        let mut colors = [Color32::LIGHT_BLUE; Measure::COUNT];
        for (slot, color) in colors.iter_mut().zip(generate_palette(Measure::COUNT)) {
            *slot = color;
        }
        SeriesColors { colors }
    }
}

impl SeriesColors {
    pub fn color_for(&self, measure: Measure) -> Color32 {
        self.colors[measure.index()]
    }
}
