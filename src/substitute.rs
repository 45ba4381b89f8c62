//! Exact byte-sequence substitution over a whole executable image.

use memchr::memmem;
use tracing::debug;

use crate::error::{Error, Result};

/// Replace every non-overlapping occurrence of `search` with `replace`,
/// scanning left to right. Returns the number of occurrences replaced.
///
/// A pattern that does not occur leaves the buffer untouched. An empty
/// `search` never matches.
pub fn substitute(buffer: &mut Vec<u8>, search: &[u8], replace: &[u8]) -> usize {
    if search.is_empty() {
        return 0;
    }

    let offsets: Vec<usize> = memmem::find_iter(buffer.as_slice(), search).collect();
    if offsets.is_empty() {
        return 0;
    }

    if search.len() == replace.len() {
        for &offset in &offsets {
            buffer[offset..offset + replace.len()].copy_from_slice(replace);
        }
    } else {
        let grown = buffer.len() + offsets.len() * replace.len() - offsets.len() * search.len();
        let mut output = Vec::with_capacity(grown);
        let mut cursor = 0;
        for &offset in &offsets {
            output.extend_from_slice(&buffer[cursor..offset]);
            output.extend_from_slice(replace);
            cursor = offset + search.len();
        }
        output.extend_from_slice(&buffer[cursor..]);
        *buffer = output;
    }

    offsets.len()
}

/// Overwrite `buffer[start..end]` with `fill` repeated, truncating the last
/// repetition so the range keeps its length.
pub fn substitute_range(buffer: &mut [u8], start: usize, end: usize, fill: &[u8]) -> Result<()> {
    if start >= end || end > buffer.len() || fill.is_empty() {
        return Err(Error::InvalidRange {
            start,
            end,
            len: buffer.len(),
        });
    }

    for (dst, src) in buffer[start..end].iter_mut().zip(fill.iter().cycle()) {
        *dst = *src;
    }
    Ok(())
}

/// One step of a patch plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Replace {
        label: &'static str,
        search: Vec<u8>,
        replace: Vec<u8>,
    },
    Fill {
        label: &'static str,
        start: usize,
        end: usize,
        fill: Vec<u8>,
    },
}

impl Edit {
    pub fn replace(label: &'static str, search: &[u8], replace: &[u8]) -> Self {
        Edit::Replace {
            label,
            search: search.to_vec(),
            replace: replace.to_vec(),
        }
    }

    pub fn fill(label: &'static str, start: usize, end: usize, fill: &[u8]) -> Self {
        Edit::Fill {
            label,
            start,
            end,
            fill: fill.to_vec(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Edit::Replace { label, .. } | Edit::Fill { label, .. } => label,
        }
    }
}

/// How many times each step of a plan took effect.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub steps: Vec<(&'static str, usize)>,
}

impl ApplyReport {
    pub fn missed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .filter(|(_, hits)| *hits == 0)
            .map(|(label, _)| *label)
    }

    pub fn total(&self) -> usize {
        self.steps.iter().map(|(_, hits)| hits).sum()
    }
}

/// Apply `plan` in order.
///
/// With `strict` set, the first step whose pattern is absent aborts the plan;
/// steps already applied stay applied, so callers must not write the buffer
/// back on error.
pub fn apply(buffer: &mut Vec<u8>, plan: &[Edit], strict: bool) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for edit in plan {
        let hits = match edit {
            Edit::Replace { search, replace, .. } => substitute(buffer, search, replace),
            Edit::Fill {
                start, end, fill, ..
            } => {
                substitute_range(buffer, *start, *end, fill)?;
                1
            }
        };

        debug!("{}: {} occurrence(s)", edit.label(), hits);
        if hits == 0 && strict {
            return Err(Error::PatternNotFound {
                label: edit.label(),
            });
        }
        report.steps.push((edit.label(), hits));
    }

    Ok(report)
}
