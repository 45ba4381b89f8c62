//! Interactive confirmation before destructive operations.

use std::io::{self, BufRead, Write};

pub trait Confirm {
    /// Show `message` and return whether the user agreed.
    fn confirm(&self, message: &str) -> bool;
}

/// Reads the answer from stdin; only a literal `yes` counts.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        print!("{} (yes/no): ", message);
        io::stdout().flush().ok();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        is_yes(&line)
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
