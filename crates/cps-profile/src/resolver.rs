//! Map an output name to the monitor index `dispwin -d` expects.
//!
//! `dispwin -h` prints its usage, including the display list, to stderr and
//! exits non-zero:
//!
//! ```text
//!  -d n                 Choose the display from the following list (default 1)
//!     1 = 'Monitor 1, Output eDP-1 at 0, 0, width 1920, height 1080'
//!     2 = 'Monitor 2, Output DP-1 at 1920, 0, width 2560, height 1440'
//! ```

use cps_core::{Error, Result};
use cps_exec::{CommandRunner, Tools};
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+) =").expect("static regex"))
}

/// Ask `dispwin` which monitor index drives `output_name`.
///
/// The help invocation's exit status is ignored. Returns
/// [`Error::NotFound`] when no listed display mentions the output.
pub fn resolve_monitor_index(
    runner: &dyn CommandRunner,
    tools: &Tools,
    output_name: &str,
) -> Result<u32> {
    let not_found = || Error::NotFound {
        output: output_name.to_string(),
    };
    if output_name.is_empty() {
        return Err(not_found());
    }

    let output = runner.run(&tools.dispwin, &["-h"])?;
    let index = parse_monitor_index(&output.stderr, output_name)
        .or_else(|| parse_monitor_index(&output.stdout, output_name))
        .ok_or_else(not_found)?;

    debug!("output {} is dispwin display {}", output_name, index);
    Ok(index)
}

/// Find the index listed for `output_name` in `dispwin -h` text.
///
/// A line naming the output as a whole word beats one that merely contains
/// it (`DP-1` inside `eDP-1`); otherwise the first containing line wins.
pub fn parse_monitor_index(text: &str, output_name: &str) -> Option<u32> {
    if output_name.is_empty() {
        return None;
    }

    let mut fallback = None;
    for line in text.lines().filter(|l| l.contains(output_name)) {
        let Some(index) = listed_index(line) else {
            continue;
        };
        if contains_word(line, output_name) {
            return Some(index);
        }
        fallback.get_or_insert(index);
    }
    fallback
}

fn listed_index(line: &str) -> Option<u32> {
    index_pattern()
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn contains_word(line: &str, word: &str) -> bool {
    let is_name_char = |c: char| c.is_alphanumeric() || c == '-' || c == '_';
    line.match_indices(word).any(|(start, _)| {
        let before = line[..start].chars().next_back();
        let after = line[start + word.len()..].chars().next();
        !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
    })
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
