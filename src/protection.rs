//! Disk-check removal for copy-protected builds.
//!
//! Each recipe rewrites the conditional branch that bails out when the CD is
//! missing. The rewritten instructions are decoded so the log shows exactly
//! which branches changed.

use iced_x86::{Decoder, DecoderOptions, FlowControl, Formatter, Instruction, IntelFormatter, Mnemonic};
use memchr::memmem;

use crate::identity::{Game, ProtectedBuild};
use crate::substitute::Edit;

#[rustfmt::skip]
const EXTREME_SEARCH: &[u8] = &[
    0x75, 0x2D, 0x84, 0xC0, 0x8B, 0xCF, 0x74, 0x27, 0xA0, 0x14, 0xE0, 0x69, 0x00, 0x90,
    0x8D, 0x64, 0x24, 0x00, 0x84, 0xC0, 0x74, 0x19, 0x8A, 0x19, 0x80, 0xCB, 0x20, 0x0C,
    0x20, 0x3A, 0xD8, 0x75, 0x0E, 0x8A, 0x44, 0x0E, 0x01, 0x41, 0x84, 0xC0, 0x74, 0x6E,
];

#[rustfmt::skip]
const EXTREME_PATCH: &[u8] = &[
    0x90, 0x90, 0x84, 0xC0, 0x8B, 0xCF, 0x90, 0x90, 0xA0, 0x14, 0xE0, 0x69, 0x00, 0x90,
    0x8D, 0x64, 0x24, 0x00, 0x84, 0xC0, 0x90, 0x90, 0x8A, 0x19, 0x80, 0xCB, 0x20, 0x0C,
    0x20, 0x3A, 0xD8, 0x90, 0x90, 0x8A, 0x44, 0x0E, 0x01, 0x41, 0x84, 0xC0, 0xEB, 0x6E,
];

const NOP: u8 = 0x90;

pub fn plan(build: ProtectedBuild) -> Vec<Edit> {
    match build.0 {
        Game::Ski => vec![Edit::replace(
            "ski: disk check",
            &[0x74, 0x20, 0x6A, 0x15],
            &[0xEB, 0x20, 0x6A, 0x15],
        )],
        Game::Challenge => vec![Edit::replace(
            "challenge: disk check",
            &[0xE8, 0xD8, 0xFD, 0xFF, 0xFF, 0x85, 0xC0, 0x75, 0x47],
            &[0xE8, 0xD8, 0xFD, 0xFF, 0xFF, 0x85, 0xC0, 0xEB, 0x47],
        )],
        Game::School => vec![
            Edit::replace(
                "school: disk check",
                &[0xE8, 0x45, 0xBA, 0x00, 0x00, 0x84, 0xC0, 0x75, 0x49],
                &[0xE8, 0x45, 0xBA, 0x00, 0x00, 0x84, 0xC0, 0xEB, 0x49],
            ),
            Edit::fill("school: disk check call 1", 0x89097, 0x8909C, &[NOP]),
            Edit::fill("school: disk check call 2", 0x890A9, 0x890AE, &[NOP]),
            Edit::fill("school: disk check call 3", 0x890B1, 0x890B6, &[NOP]),
        ],
        Game::Extreme => vec![Edit::replace("extreme: disk check", EXTREME_SEARCH, EXTREME_PATCH)],
        Game::Wildfire => vec![Edit::replace(
            "wildfire: disk check",
            &[0x0F, 0x85, 0x18, 0xFF, 0xFF, 0xFF, 0xE8],
            &[0xE9, 0x19, 0xFF, 0xFF, 0xFF, 0xFF, 0xE8],
        )],
        Game::Mall3 => vec![Edit::replace(
            "mall3: disk check",
            &[0x8B, 0x35, 0xB0, 0xF2, 0x6B, 0x00, 0xEB, 0x09],
            &[0x8B, 0x35, 0xB0, 0xF2, 0x6B, 0x00, 0xEB, 0x2B],
        )],
        Game::Cruise => Vec::new(),
    }
}

/// A branch in the original code and what now occupies its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchChange {
    pub offset: u64,
    pub before: Mnemonic,
    pub after: Vec<Mnemonic>,
    pub description: String,
}

fn decode(bytes: &[u8], ip: u64) -> Vec<Instruction> {
    let mut decoder = Decoder::with_ip(32, bytes, ip, DecoderOptions::NONE);
    let mut instruction = Instruction::default();
    let mut instructions = Vec::new();
    while decoder.can_decode() {
        decoder.decode_out(&mut instruction);
        instructions.push(instruction);
    }
    instructions
}

fn is_branch(instruction: &Instruction) -> bool {
    matches!(
        instruction.flow_control(),
        FlowControl::ConditionalBranch | FlowControl::UnconditionalBranch
    )
}

/// Compare `original` and `patched` decoded as 32-bit code at `offset` and
/// list the branches of `original` whose bytes now decode differently.
pub fn branch_changes(original: &[u8], patched: &[u8], offset: u64) -> Vec<BranchChange> {
    let before = decode(original, offset);
    let after = decode(patched, offset);
    let mut formatter = IntelFormatter::new();
    let mut changes = Vec::new();

    for branch in before.iter().filter(|i| !i.is_invalid() && is_branch(i)) {
        let start = branch.ip();
        let end = branch.next_ip();
        let replacements: Vec<&Instruction> = after
            .iter()
            .filter(|i| !i.is_invalid() && i.ip() < end && i.next_ip() > start)
            .collect();

        let unchanged = replacements.len() == 1
            && replacements[0].code() == branch.code()
            && replacements[0].near_branch_target() == branch.near_branch_target();
        if unchanged {
            continue;
        }

        let mut old_text = String::new();
        formatter.format(branch, &mut old_text);
        let new_text = replacements
            .iter()
            .map(|i| {
                let mut text = String::new();
                formatter.format(i, &mut text);
                text
            })
            .collect::<Vec<_>>()
            .join("; ");

        changes.push(BranchChange {
            offset: start,
            before: branch.mnemonic(),
            after: replacements.iter().map(|i| i.mnemonic()).collect(),
            description: format!("{old_text} -> {new_text}"),
        });
    }

    changes
}

/// Branch changes every replace step of `plan` would make in `image`.
pub fn describe(image: &[u8], plan: &[Edit]) -> Vec<BranchChange> {
    plan.iter()
        .filter_map(|edit| match edit {
            Edit::Replace { search, replace, .. } => memmem::find(image, search)
                .map(|offset| branch_changes(search, replace, offset as u64)),
            Edit::Fill { .. } => None,
        })
        .flatten()
        .collect()
}
