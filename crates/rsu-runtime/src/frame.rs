//! Fixed-width text frames for the roadside character display.

use rsu_hal::CharDisplay;
use rsu_types::{Direction, RsuError, Turn};

/// Top row while an emergency vehicle holds the right of way.
pub const EMERGENCY_BANNER: &str = "!!EMERGENCY!!";

/// Top row after the vehicle has passed.
pub const CLEAR_BANNER: &str = "CLEAR";

/// Route row when the dispatch gave no route at all.
pub const UNKNOWN_ROUTE: &str = "UNKNOWN";

/// Centre `text` in exactly `width` characters.
///
/// Text longer than `width` is cut to its first `width` characters.  When the
/// padding is odd the extra space goes on the right.  Widths are counted in
/// `char`s, which matches a character-cell display.
pub fn center(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    let len = clipped.chars().count();
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), clipped, " ".repeat(right))
}

/// Second-row route description for an approach.
///
/// `"{in} to {out}"` when both ends are known, otherwise whichever side is
/// present, followed by `" {turn}"` when a turn was given.
pub fn route_text(
    in_direction: Option<&Direction>,
    out_direction: Option<&Direction>,
    turn: Option<&Turn>,
) -> String {
    let mut route = match (in_direction, out_direction) {
        (Some(i), Some(o)) => format!("{i} to {o}"),
        (Some(i), None) => i.to_string(),
        (None, Some(o)) => format!("to {o}"),
        (None, None) => String::new(),
    };
    if let Some(t) = turn {
        if !route.is_empty() {
            route.push(' ');
        }
        route.push_str(&t.to_string());
    }
    if route.is_empty() {
        route.push_str(UNKNOWN_ROUTE);
    }
    route
}

/// Two centred rows, each exactly `width` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    lines: [String; 2],
}

impl DisplayFrame {
    pub fn new(width: usize, top: &str, bottom: &str) -> Self {
        Self {
            lines: [center(top, width), center(bottom, width)],
        }
    }

    /// Banner plus route for an approaching vehicle.
    pub fn emergency(
        width: usize,
        in_direction: Option<&Direction>,
        out_direction: Option<&Direction>,
        turn: Option<&Turn>,
    ) -> Self {
        Self::new(
            width,
            EMERGENCY_BANNER,
            &route_text(in_direction, out_direction, turn),
        )
    }

    /// `CLEAR` over a blank row.
    pub fn clear(width: usize) -> Self {
        Self::new(width, CLEAR_BANNER, "")
    }

    pub fn lines(&self) -> &[String; 2] {
        &self.lines
    }

    /// Blank `display`, then write every row from column 0.
    ///
    /// # Errors
    ///
    /// Returns the first [`RsuError::HardwareFault`] raised by the display.
    pub fn render(&self, display: &mut dyn CharDisplay) -> Result<(), RsuError> {
        display.clear()?;
        for (row, line) in self.lines.iter().enumerate().take(display.rows()) {
            display.write_at(row, 0, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsu_hal::SimDisplay;

    #[test]
    fn center_pads_evenly() {
        let line = center("EMERGENCY", 16);
        assert_eq!(line.chars().count(), 16);
        let left = line.len() - line.trim_start().len();
        let right = line.len() - line.trim_end().len();
        assert_eq!(line.trim(), "EMERGENCY");
        assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn center_truncates_long_text() {
        assert_eq!(center("ABCDEFGHIJKLMNOPQRST", 16), "ABCDEFGHIJKLMNOP");
        assert_eq!(center("exactly sixteen!", 16), "exactly sixteen!");
    }

    #[test]
    fn center_counts_characters_not_bytes() {
        let line = center("북쪽", 6);
        assert_eq!(line, "  북쪽  ");
        assert_eq!(line.chars().count(), 6);
    }

    #[test]
    fn route_text_variants() {
        let n = Direction::N;
        let s = Direction::S;
        let left = Turn::Left;
        assert_eq!(route_text(Some(&n), Some(&s), Some(&left)), "N to S Left");
        assert_eq!(route_text(Some(&n), Some(&s), None), "N to S");
        assert_eq!(route_text(Some(&n), None, None), "N");
        assert_eq!(route_text(None, Some(&s), Some(&Turn::UTurn)), "to S U-turn");
        assert_eq!(route_text(None, None, Some(&left)), "Left");
        assert_eq!(route_text(None, None, None), UNKNOWN_ROUTE);
    }

    #[test]
    fn frames_are_display_width() {
        let frame = DisplayFrame::emergency(16, Some(&Direction::N), Some(&Direction::S), None);
        for line in frame.lines() {
            assert_eq!(line.chars().count(), 16);
        }
        assert_eq!(frame.lines()[0].trim(), EMERGENCY_BANNER);
        assert_eq!(frame.lines()[1].trim(), "N to S");

        let clear = DisplayFrame::clear(16);
        assert_eq!(clear.lines()[0].trim(), CLEAR_BANNER);
        assert_eq!(clear.lines()[1], " ".repeat(16));
    }

    #[test]
    fn render_writes_every_row() {
        let shared = SimDisplay::new(16, 2);
        let mut display = shared.clone();
        display.write_at(1, 0, "stale text").unwrap();

        DisplayFrame::clear(16).render(&mut display).unwrap();
        assert_eq!(shared.lines(), vec![center(CLEAR_BANNER, 16), " ".repeat(16)]);
    }
}
