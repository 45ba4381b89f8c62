//! Resolution recipes: for each build, the ordered byte edits that move the
//! game off its stock 1280x960 mode.

use crate::identity::Build;
use crate::layout::{cruise_hud_fix, encode_offset, SchoolLayout};
use crate::resolution::Resolution;
use crate::substitute::Edit;

/// Stock in-game width as an immediate (1280).
const STOCK_WIDTH: [u8; 4] = [0x00, 0x05, 0x00, 0x00];
/// Stock in-game height as an immediate (960).
const STOCK_HEIGHT: [u8; 4] = [0xC0, 0x03, 0x00, 0x00];

/// Resolutions a recipe writes into the executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub game: Resolution,
    pub menu: Resolution,
}

impl Targets {
    /// `menu` is only used by Cruise Ship Tycoon, whose menu crops outside 4:3.
    pub fn resolve(requested: Resolution, letterbox: bool, wide_menu: bool) -> Self {
        let game = if letterbox {
            requested.letterbox()
        } else {
            requested
        };
        let menu = if wide_menu {
            game
        } else {
            requested.letterbox()
        };
        Self { game, menu }
    }
}

fn cat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Ordered edits for `build`. Patterns absent from the file are skipped at
/// apply time.
pub fn plan(build: Build, targets: &Targets) -> Vec<Edit> {
    match build {
        Build::Ski => Vec::new(),
        Build::CruiseV1001 => cruise(targets, 0x38, &[0xE8, 0xDC, 0xF8, 0x01, 0x00]),
        Build::CruiseUpdate3 => cruise(targets, 0x34, &[0xE8, 0x0A, 0xE5, 0x01, 0x00]),
        Build::Challenge => challenge(targets.game),
        Build::SchoolOriginal | Build::School => school(targets.game),
        Build::Extreme | Build::Wildfire => extreme(targets.game),
        Build::Mall3 => mall3(targets.game),
    }
}

/// `stack_slot` is the esp displacement the menu height is stored at and
/// `call` the call instruction sitting between the width and height stores;
/// both differ between the two builds.
fn cruise(targets: &Targets, stack_slot: u8, call: &[u8]) -> Vec<Edit> {
    let width = le(targets.game.width);
    let height = le(targets.game.height);
    let menu_width = le(targets.menu.width);
    let menu_height = le(targets.menu.height);
    let hud_fix = encode_offset(cruise_hud_fix(targets.game));

    let store_menu_height = [0xC7, 0x44, 0x24, stack_slot];
    let store_height = [0xC7, 0x40, 0x30];
    // stock hud offset, 360
    let stock_fix = [0x68, 0x01, 0x00, 0x00];

    vec![
        Edit::replace(
            "cruise: menu resolution",
            &cat(&[&[0x20, 0x03, 0x00, 0x00], &store_menu_height, &[0x58, 0x02, 0x00, 0x00]]),
            &cat(&[&menu_width, &store_menu_height, &menu_height]),
        ),
        Edit::replace(
            "cruise: in-game resolution",
            &cat(&[&STOCK_WIDTH, call, &store_height, &STOCK_HEIGHT]),
            &cat(&[&width, call, &store_height, &height]),
        ),
        Edit::replace(
            "cruise: hud width compare",
            &cat(&[&[0x3D], &STOCK_WIDTH, &[0x75, 0x05]]),
            &cat(&[&[0x3D], &width, &[0x75, 0x05]]),
        ),
        Edit::replace(
            "cruise: hud vertical offset",
            &cat(&[&[0xBD], &stock_fix, &[0xC7]]),
            &cat(&[&[0xBD], &hud_fix, &[0xC7]]),
        ),
        Edit::replace(
            "cruise: hud width and offset",
            &cat(&[&STOCK_WIDTH, &[0x75, 0x09, 0xBD], &stock_fix]),
            &cat(&[&width, &[0x75, 0x09, 0xBD], &hud_fix]),
        ),
    ]
}

fn challenge(resolution: Resolution) -> Vec<Edit> {
    let width = le(resolution.width);
    let height = le(resolution.height);

    vec![
        Edit::replace(
            "challenge: width",
            &cat(&[&[0xC7, 0x40, 0x2C], &STOCK_WIDTH]),
            &cat(&[&[0xC7, 0x40, 0x2C], &width]),
        ),
        Edit::replace(
            "challenge: height",
            &cat(&[&[0xC7, 0x40, 0x30], &STOCK_HEIGHT]),
            &cat(&[&[0xC7, 0x40, 0x30], &height]),
        ),
        Edit::replace(
            "challenge: hud width compare",
            &cat(&[&[0x74, 0x0B, 0x3D], &STOCK_WIDTH]),
            &cat(&[&[0x74, 0x0B, 0x3D], &width]),
        ),
        Edit::replace(
            "challenge: hud width compare",
            &cat(&[&[0x74, 0x1A, 0x3D], &STOCK_WIDTH]),
            &cat(&[&[0x74, 0x1A, 0x3D], &width]),
        ),
        // Pin the in-game options window to the top-left corner; centered, it
        // mutes the game.
        Edit::replace(
            "challenge: options window x",
            &[0x2B, 0xC2, 0xD1, 0xF8, 0x89, 0x44, 0x24, 0x10, 0xE8],
            &[0x2B, 0xC2, 0x31, 0xC0, 0x89, 0x44, 0x24, 0x10, 0xE8],
        ),
        Edit::replace(
            "challenge: options window y",
            &[0x8B, 0xC5, 0x99, 0x2B, 0xC2, 0x8B, 0xE8, 0xD1, 0xFD],
            &[0x8B, 0xC5, 0x99, 0x2B, 0xC2, 0x8B, 0xE8, 0x31, 0xED],
        ),
    ]
}

#[rustfmt::skip]
const SCHOOL_WIDTH_COMPARES: &[&[u8]] = &[
    &[0x74, 0x1A, 0x3D],
    &[0xEB, 0x09, 0x3D],
    &[0x74, 0x0B, 0x3D],
    &[0xE8, 0x89, 0x65, 0x02, 0x00, 0x3D],
    &[0x74, 0x24, 0x3D],
    &[0xE8, 0xDE, 0xCE, 0x00, 0x00, 0x3D],
    &[0xE8, 0x93, 0xCB, 0x00, 0x00, 0x3D],
    &[0xE8, 0x51, 0xC9, 0x00, 0x00, 0x3D],
];

fn school(resolution: Resolution) -> Vec<Edit> {
    let width = le(resolution.width);
    let height = le(resolution.height);
    let layout = SchoolLayout::new(resolution);

    let mut edits = vec![
        Edit::replace(
            "school: width",
            &cat(&[&[0x40, 0x2C], &STOCK_WIDTH]),
            &cat(&[&[0x40, 0x2C], &width]),
        ),
        Edit::replace(
            "school: height",
            &cat(&[&[0x40, 0x30], &STOCK_HEIGHT]),
            &cat(&[&[0x40, 0x30], &height]),
        ),
    ];

    if resolution.width != 1280 {
        // bottom bar buttons are laid out from -800
        edits.push(Edit::replace(
            "school: bottom bar anchor",
            &[0x8D, 0x81, 0xE0, 0xFC, 0xFF, 0xFF],
            &cat(&[&[0x8D, 0x81], &encode_offset(-(resolution.width as i64))]),
        ));
        for &prefix in SCHOOL_WIDTH_COMPARES {
            edits.push(Edit::replace(
                "school: width compare",
                &cat(&[prefix, &STOCK_WIDTH]),
                &cat(&[prefix, &width]),
            ));
        }
    }

    edits.extend([
        Edit::replace(
            "school: objectives button y",
            &[0x74, 0x0B, 0x81, 0xC7, 0x30, 0x02, 0x00, 0x00],
            &cat(&[&[0x74, 0x0B, 0x81, 0xC7], &encode_offset(layout.objective_y)]),
        ),
        Edit::replace(
            "school: objectives button y (instant)",
            &[0x81, 0xC7, 0x17, 0x02, 0x00, 0x00],
            &cat(&[&[0x81, 0xC7], &encode_offset(layout.objective_y_instant)]),
        ),
        Edit::replace(
            "school: objectives button x",
            &[0x52, 0x6A, 0x4F, 0x81, 0xC6, 0xDC, 0x00, 0x00, 0x00],
            &cat(&[&[0x52, 0x6A, 0x4F, 0x81, 0xC6], &encode_offset(layout.objective_x)]),
        ),
        Edit::replace(
            "school: history button",
            &[0x68, 0x93, 0x02, 0x00, 0x00, 0x68, 0x31, 0x01, 0x00, 0x00],
            &cat(&[
                &[0x68],
                &encode_offset(layout.history_y),
                &[0x68],
                &encode_offset(layout.history_x),
            ]),
        ),
    ]);

    if layout.centered_save {
        edits.push(Edit::replace(
            "school: save dialog width compare",
            &[0x81, 0xFB, 0x00, 0x04, 0x00, 0x00],
            &cat(&[&[0x81, 0xFB], &width]),
        ));
        edits.push(Edit::replace(
            "school: save dialog stock compare",
            &cat(&[&[0x81, 0xFB], &STOCK_WIDTH]),
            &[0x81, 0xFB, 0x00, 0x00, 0x00, 0x00],
        ));
    } else {
        edits.push(Edit::replace(
            "school: save dialog width compare",
            &cat(&[&[0x81, 0xFB], &STOCK_WIDTH]),
            &cat(&[&[0x81, 0xFB], &width]),
        ));
    }

    edits.extend([
        Edit::replace(
            "school: save dialog x",
            &[0x2D, 0x90, 0x01, 0x00, 0x00],
            &cat(&[&[0x2D], &encode_offset(layout.save_x)]),
        ),
        Edit::replace(
            "school: save dialog y",
            &[0x2D, 0x2C, 0x01, 0x00, 0x00],
            &cat(&[&[0x2D], &encode_offset(layout.save_y)]),
        ),
        // the classroom view draws a stray frame while this mode string exists
        Edit::replace("school: classroom frame", b"1280x960\0", &[0u8; 9]),
    ]);

    edits
}

fn extreme(resolution: Resolution) -> Vec<Edit> {
    let width = le(resolution.width);
    let height = le(resolution.height);

    vec![
        Edit::replace(
            "extreme: width",
            &cat(&[&[0xC7, 0x40, 0x2C], &STOCK_WIDTH]),
            &cat(&[&[0xC7, 0x40, 0x2C], &width]),
        ),
        Edit::replace(
            "extreme: height",
            &cat(&[&[0xC7, 0x40, 0x30], &STOCK_HEIGHT]),
            &cat(&[&[0xC7, 0x40, 0x30], &height]),
        ),
        Edit::replace(
            "extreme: hud width compare",
            &cat(&[&[0x74, 0x0B, 0x3D], &STOCK_WIDTH]),
            &cat(&[&[0x74, 0x0B, 0x3D], &width]),
        ),
    ]
}

fn mall3(resolution: Resolution) -> Vec<Edit> {
    let width = le(resolution.width);
    let height = le(resolution.height);

    vec![
        Edit::replace(
            "mall3: width",
            &cat(&[&[0xC7, 0x40, 0x28], &STOCK_WIDTH]),
            &cat(&[&[0xC7, 0x40, 0x28], &width]),
        ),
        Edit::replace(
            "mall3: height",
            &cat(&[&[0xC7, 0x40, 0x2C], &STOCK_HEIGHT]),
            &cat(&[&[0xC7, 0x40, 0x2C], &height]),
        ),
        Edit::replace(
            "mall3: hud width compare",
            &cat(&[&[0x74, 0x0E, 0x3D], &STOCK_WIDTH]),
            &cat(&[&[0x74, 0x0E, 0x3D], &width]),
        ),
        Edit::replace(
            "mall3: hud width compare",
            &cat(&[&[0x0F, 0x84, 0xE7, 0x00, 0x00, 0x00, 0x3D], &STOCK_WIDTH]),
            &cat(&[&[0x0F, 0x84, 0xE7, 0x00, 0x00, 0x00, 0x3D], &width]),
        ),
    ]
}
