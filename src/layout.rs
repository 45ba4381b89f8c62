//! Secondary values derived from the target resolution.
//!
//! Every value ends up as a 4-byte little-endian immediate in the executable.

use crate::resolution::Resolution;

/// Cruise Ship Tycoon places its HUD relative to `height - 600`.
pub const CRUISE_HUD_BASE: i64 = 600;

/// Encode an offset as a 4-byte little-endian immediate: negative values as
/// `i32`, everything else as `u32`.
pub fn encode_offset(value: i64) -> [u8; 4] {
    if value < 0 {
        (value as i32).to_le_bytes()
    } else {
        (value as u32).to_le_bytes()
    }
}

pub fn cruise_hud_fix(resolution: Resolution) -> i64 {
    resolution.height as i64 - CRUISE_HUD_BASE
}

/// Positions of the School Tycoon widgets that are anchored to a 4:3 layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolLayout {
    pub objective_x: i64,
    pub objective_y: i64,
    pub objective_y_instant: i64,
    pub history_x: i64,
    pub history_y: i64,
    pub save_x: i64,
    pub save_y: i64,
    /// 1280x720 moves the save dialog to the screen center and needs the
    /// width comparisons rewired.
    pub centered_save: bool,
}

impl SchoolLayout {
    pub fn new(resolution: Resolution) -> Self {
        let width = resolution.width as f64;
        let height = resolution.height as f64;
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        // at the stock width the buttons sit centered
        let (objective_base, history_base) = if resolution.width == 1280 {
            (712.0, 770.0)
        } else {
            (472.0, 530.0)
        };

        let objective_x = objective_base - (half_w - 148.0);
        let history_x = history_base - (half_w - 175.0);
        let history_y = (height - 33.0) - (half_h - 212.0);
        let objective_y = (height - 33.0) - (half_h - 113.0);
        let objective_y_instant = objective_y - 25.0;

        let centered_save = resolution == Resolution::new(1280, 720);
        let (save_x, save_y) = if centered_save {
            (half_w, half_h)
        } else {
            (half_w - 240.0, half_h - 180.0)
        };

        // `as` truncates toward zero
        Self {
            objective_x: objective_x as i64,
            objective_y: objective_y as i64,
            objective_y_instant: objective_y_instant as i64,
            history_x: history_x as i64,
            history_y: history_y as i64,
            save_x: save_x as i64,
            save_y: save_y as i64,
            centered_save,
        }
    }
}
