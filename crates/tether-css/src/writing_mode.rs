//! Writing modes and flow-relative direction mapping.
//!
//! [§ 2 Block Flow Direction](https://www.w3.org/TR/css-writing-modes-4/#block-flow)
//! [§ 6 Abstract Box Terminology](https://www.w3.org/TR/css-writing-modes-4/#abstract-box)

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// [§ 2 Block Flow Direction](https://www.w3.org/TR/css-writing-modes-4/#block-flow)
///
/// "The writing-mode property specifies whether lines of text are laid out
/// horizontally or vertically and the direction in which blocks progress."
///
/// `sideways-rl` and `sideways-lr` share block flow with their `vertical-*`
/// counterparts and parse to them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, EnumString, Display, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum WritingMode {
    /// "Top-to-bottom block flow direction."
    ///
    /// block-start → top, inline-start → left (ltr)
    #[default]
    #[strum(to_string = "horizontal-tb")]
    HorizontalTb,

    /// "Right-to-left block flow direction."
    ///
    /// block-start → right, inline-start → top (ltr)
    #[strum(to_string = "vertical-rl", serialize = "sideways-rl")]
    VerticalRl,

    /// "Left-to-right block flow direction."
    ///
    /// block-start → left, inline-start → top (ltr)
    #[strum(to_string = "vertical-lr", serialize = "sideways-lr")]
    VerticalLr,
}

/// [§ 2.1 Specifying Directionality](https://www.w3.org/TR/css-writing-modes-4/#direction)
///
/// "This property specifies the inline base direction or directionality of any
/// bidi paragraph, embedding, isolate, or override established by the box."
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
}

/// A physical axis of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis (`left`/`right`, `width`).
    Horizontal,
    /// The y axis (`top`/`bottom`, `height`).
    Vertical,
}

/// Physical side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PhysicalSide {
    /// Top edge of the box
    Top,
    /// Right edge of the box
    Right,
    /// Bottom edge of the box
    Bottom,
    /// Left edge of the box
    Left,
}

impl PhysicalSide {
    /// The axis this side lies on (`top` is on the vertical axis).
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Vertical,
            Self::Left | Self::Right => Axis::Horizontal,
        }
    }

    /// Whether this is the far side of its axis, i.e. `right` or `bottom`.
    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(self, Self::Right | Self::Bottom)
    }
}

impl WritingMode {
    /// Whether lines run vertically.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        !matches!(self, Self::HorizontalTb)
    }

    /// The physical axis blocks progress along.
    #[must_use]
    pub const fn block_axis(self) -> Axis {
        if self.is_vertical() {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    /// The physical axis lines run along.
    #[must_use]
    pub const fn inline_axis(self) -> Axis {
        if self.is_vertical() {
            Axis::Vertical
        } else {
            Axis::Horizontal
        }
    }

    /// [§ 6.2 Flow-relative Directions](https://www.w3.org/TR/css-writing-modes-4/#logical-directions)
    ///
    /// | Writing Mode   | block-start |
    /// |----------------|-------------|
    /// | horizontal-tb  | top         |
    /// | vertical-rl    | right       |
    /// | vertical-lr    | left        |
    #[must_use]
    pub const fn block_start_physical(self) -> PhysicalSide {
        match self {
            Self::HorizontalTb => PhysicalSide::Top,
            Self::VerticalRl => PhysicalSide::Right,
            Self::VerticalLr => PhysicalSide::Left,
        }
    }

    /// The side opposite [`Self::block_start_physical`].
    #[must_use]
    pub const fn block_end_physical(self) -> PhysicalSide {
        match self {
            Self::HorizontalTb => PhysicalSide::Bottom,
            Self::VerticalRl => PhysicalSide::Left,
            Self::VerticalLr => PhysicalSide::Right,
        }
    }

    /// "inline-start: ... the line-left edge in ltr, line-right in rtl"
    ///
    /// | Writing Mode   | ltr  | rtl    |
    /// |----------------|------|--------|
    /// | horizontal-tb  | left | right  |
    /// | vertical-*     | top  | bottom |
    #[must_use]
    pub const fn inline_start_physical(self, direction: Direction) -> PhysicalSide {
        match (self.is_vertical(), direction) {
            (false, Direction::Ltr) => PhysicalSide::Left,
            (false, Direction::Rtl) => PhysicalSide::Right,
            (true, Direction::Ltr) => PhysicalSide::Top,
            (true, Direction::Rtl) => PhysicalSide::Bottom,
        }
    }

    /// The side opposite [`Self::inline_start_physical`].
    #[must_use]
    pub const fn inline_end_physical(self, direction: Direction) -> PhysicalSide {
        match self.inline_start_physical(direction) {
            PhysicalSide::Left => PhysicalSide::Right,
            PhysicalSide::Right => PhysicalSide::Left,
            PhysicalSide::Top => PhysicalSide::Bottom,
            PhysicalSide::Bottom => PhysicalSide::Top,
        }
    }

    /// Whether the start edge of `axis` is its far (`right`/`bottom`) side.
    ///
    /// Only the inline axis under `rtl` and the block axis of `vertical-rl`
    /// run from the far side.
    #[must_use]
    pub fn axis_starts_at_end(self, axis: Axis, direction: Direction) -> bool {
        if axis == self.inline_axis() {
            direction == Direction::Rtl
        } else {
            self == Self::VerticalRl
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_writing_modes() {
        assert_eq!("horizontal-tb".parse(), Ok(WritingMode::HorizontalTb));
        assert_eq!("Vertical-RL".parse(), Ok(WritingMode::VerticalRl));
        assert_eq!("sideways-lr".parse(), Ok(WritingMode::VerticalLr));
        assert!("diagonal".parse::<WritingMode>().is_err());
        assert_eq!(WritingMode::VerticalRl.to_string(), "vertical-rl");
    }

    #[test]
    fn test_inline_mapping_follows_direction() {
        let wm = WritingMode::HorizontalTb;
        assert_eq!(wm.inline_start_physical(Direction::Ltr), PhysicalSide::Left);
        assert_eq!(wm.inline_start_physical(Direction::Rtl), PhysicalSide::Right);
        assert_eq!(
            WritingMode::VerticalLr.inline_end_physical(Direction::Ltr),
            PhysicalSide::Bottom
        );
    }

    #[test]
    fn test_axis_starts_at_end() {
        let wm = WritingMode::VerticalRl;
        assert!(wm.axis_starts_at_end(Axis::Horizontal, Direction::Ltr));
        assert!(!wm.axis_starts_at_end(Axis::Vertical, Direction::Ltr));
        assert!(wm.axis_starts_at_end(Axis::Vertical, Direction::Rtl));
        assert!(!WritingMode::HorizontalTb.axis_starts_at_end(Axis::Vertical, Direction::Rtl));
    }
}
