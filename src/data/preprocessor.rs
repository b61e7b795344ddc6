// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans a single line of a word list before it becomes a
// DatasetItem, and a raw word before it is tokenised.
//
// Word lists are often exported from spreadsheets or editors,
// so a line may carry:
//   - a byte order mark on the very first line (U+FEFF)
//   - non-breaking or zero-width spaces (U+00A0, U+200B)
//   - tabs and stray control characters
//   - a trailing \r from Windows line endings
//
// Cleaning steps (applied in order):
//   1. Replace Unicode whitespace variants with plain space
//   2. Replace remaining control characters with space
//   3. Collapse runs of spaces into one
//   4. Trim both ends

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one line. Returns an empty string for blank lines.
    pub fn clean(&self, line: &str) -> String {
        let normalised = line.chars().map(|c| match c {
            '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            c if c.is_control() => ' ',
            c => c,
        });

        let mut out        = String::with_capacity(line.len());
        let mut last_space = false;
        for c in normalised {
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  deploy  "), "deploy");
    }

    #[test]
    fn test_strips_bom_and_carriage_return() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("\u{FEFF}run\r"), "run");
    }

    #[test]
    fn test_collapses_inner_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("ice\u{00A0}\u{00A0}cream"), "ice cream");
    }

    #[test]
    fn test_blank_line_becomes_empty() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(" \t \u{200B} "), "");
    }
}
