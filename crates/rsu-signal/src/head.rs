//! Output-line layout of the two signal heads.

use std::collections::HashSet;

use rsu_types::{Color, HeadId, LineId, RsuError};
use serde::{Deserialize, Serialize};

/// The three output lines of one head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadLines {
    pub red: LineId,
    pub yellow: LineId,
    pub green: LineId,
}

impl HeadLines {
    pub fn new(red: LineId, yellow: LineId, green: LineId) -> Self {
        Self { red, yellow, green }
    }

    /// Line that lights `color`.
    pub fn line(&self, color: Color) -> LineId {
        match color {
            Color::Red => self.red,
            Color::Yellow => self.yellow,
            Color::Green => self.green,
        }
    }

    /// All three lines, red first.
    pub fn all(&self) -> [LineId; 3] {
        [self.red, self.yellow, self.green]
    }
}

/// Which output lines drive which head.
///
/// The default is the reference roadside board: head 1 on BCM 17/27/22 and
/// head 2 on BCM 14/15/18.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionLayout {
    pub head1: HeadLines,
    pub head2: HeadLines,
}

impl Default for IntersectionLayout {
    fn default() -> Self {
        Self {
            head1: HeadLines::new(17, 27, 22),
            head2: HeadLines::new(14, 15, 18),
        }
    }
}

impl IntersectionLayout {
    pub fn lines(&self, head: HeadId) -> &HeadLines {
        match head {
            HeadId::Head1 => &self.head1,
            HeadId::Head2 => &self.head2,
        }
    }

    /// All six lines, head 1 first.
    pub fn line_ids(&self) -> Vec<LineId> {
        self.head1
            .all()
            .into_iter()
            .chain(self.head2.all())
            .collect()
    }

    /// Reject layouts that wire one line to two colours.
    pub fn validate(&self) -> Result<(), RsuError> {
        let mut seen = HashSet::new();
        for id in self.line_ids() {
            if !seen.insert(id) {
                return Err(RsuError::Config(format!(
                    "output line {id} is assigned more than once"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_reference_board() {
        let layout = IntersectionLayout::default();
        assert_eq!(layout.lines(HeadId::Head1).line(Color::Green), 22);
        assert_eq!(layout.lines(HeadId::Head2).line(Color::Yellow), 15);
        assert_eq!(layout.line_ids(), vec![17, 27, 22, 14, 15, 18]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn duplicate_line_is_rejected() {
        let layout = IntersectionLayout {
            head1: HeadLines::new(17, 27, 22),
            head2: HeadLines::new(14, 22, 18),
        };
        let err = layout.validate().unwrap_err();
        assert!(matches!(err, RsuError::Config(ref msg) if msg.contains("22")));
    }
}
