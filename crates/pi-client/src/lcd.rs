//! Payload for the 16x2 character LCD.

use serde::{Deserialize, Serialize};

/// Characters per LCD line. The device rejects longer lines.
pub const LCD_LINE_WIDTH: usize = 16;

/// Body of `POST /lcd`.
///
/// Both lines are truncated to [`LCD_LINE_WIDTH`] characters on construction,
/// so a payload can never carry an over-length line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcdPayload {
    line1: String,
    line2: String,
}

impl LcdPayload {
    /// Build a payload from raw user input.
    #[must_use]
    pub fn new(line1: &str, line2: &str) -> Self {
        Self {
            line1: truncate_line(line1),
            line2: truncate_line(line2),
        }
    }

    /// Sixteen spaces on both lines; the device treats this as a clear.
    #[must_use]
    pub fn blank() -> Self {
        let spaces = " ".repeat(LCD_LINE_WIDTH);
        Self {
            line1: spaces.clone(),
            line2: spaces,
        }
    }

    /// First line as sent.
    #[must_use]
    pub fn line1(&self) -> &str {
        &self.line1
    }

    /// Second line as sent.
    #[must_use]
    pub fn line2(&self) -> &str {
        &self.line2
    }
}

/// Keep at most [`LCD_LINE_WIDTH`] characters (not bytes) of `line`.
#[must_use]
pub fn truncate_line(line: &str) -> String {
    line.chars().take(LCD_LINE_WIDTH).collect()
}

/// Render what the panel will show: each line left-aligned and padded to the
/// panel width. Over-length input is shown in full.
#[must_use]
pub fn preview_lines(line1: &str, line2: &str) -> [String; 2] {
    [
        format!("{line1:<width$}", width = LCD_LINE_WIDTH),
        format!("{line2:<width$}", width = LCD_LINE_WIDTH),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_long_lines() {
        let line2 = format!("World{}", "!".repeat(12));
        assert_eq!(line2.chars().count(), 17);

        let payload = LcdPayload::new("Hello", &line2);
        assert_eq!(payload.line1(), "Hello");
        assert_eq!(payload.line2(), format!("World{}", "!".repeat(11)));

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"line1":"Hello","line2":"World!!!!!!!!!!!"}"#);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let payload = LcdPayload::new("äöüäöüäöüäöüäöüäöü", "");
        assert_eq!(payload.line1().chars().count(), LCD_LINE_WIDTH);
        assert_eq!(payload.line1(), "äöüäöüäöüäöüäöüä");
    }

    #[test]
    fn test_lines_never_exceed_width() {
        for len in 0..40 {
            let input = "x".repeat(len);
            let payload = LcdPayload::new(&input, &input);
            assert_eq!(payload.line1().chars().count(), len.min(LCD_LINE_WIDTH));
            assert!(payload.line2().chars().count() <= LCD_LINE_WIDTH);
        }
    }

    #[test]
    fn test_blank_payload() {
        let blank = LcdPayload::blank();
        assert_eq!(blank.line1(), "                ");
        assert_eq!(blank.line2().len(), LCD_LINE_WIDTH);
        let spaces = " ".repeat(LCD_LINE_WIDTH);
        assert_eq!(blank, LcdPayload::new(&spaces, &spaces));
    }

    #[test]
    fn test_preview_pads_to_width() {
        let [l1, l2] = preview_lines("Hi", "");
        assert_eq!(l1, "Hi              ");
        assert_eq!(l2, " ".repeat(LCD_LINE_WIDTH));

        let [long, _] = preview_lines("this line is far too long", "");
        assert_eq!(long, "this line is far too long");
    }
}
