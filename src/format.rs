//! Presentation helpers. Aggregates stay unrounded; round only when rendering.

use crate::config::Config;

/// Rounds half away from zero to `decimals` places.
pub fn round_display(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn format_kg(value: f64, decimals: u32) -> String {
    format!(
        "{:.*} kg",
        decimals as usize,
        round_display(value, decimals)
    )
}

/// Kilogram formatting at the precision configured for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KgFormatter {
    pub decimals: u32,
}

impl KgFormatter {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    pub fn round(&self, value: f64) -> f64 {
        round_display(value, self.decimals)
    }

    pub fn format(&self, value: f64) -> String {
        format_kg(value, self.decimals)
    }
}

impl Default for KgFormatter {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for KgFormatter {
    fn from(config: &Config) -> Self {
        Self::new(config.display_decimals)
    }
}
