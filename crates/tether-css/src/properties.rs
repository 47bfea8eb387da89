//! Properties whose values may contain anchor functions.
//!
//! [CSS Anchor Positioning § 2.1](https://drafts.csswg.org/css-anchor-position-1/#anchor-pos)
//! "An anchor() function is a valid value for the inset properties."
//! [§ 2.2](https://drafts.csswg.org/css-anchor-position-1/#anchor-size-fn)
//! "An anchor-size() function is a valid value for the sizing properties."

use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::writing_mode::{Axis, Direction, PhysicalSide, WritingMode};

/// [CSS Logical Properties § 4.2](https://drafts.csswg.org/css-logical-1/#inset-properties)
///
/// Physical and flow-relative inset properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum InsetProperty {
    /// `top`
    Top,
    /// `right`
    Right,
    /// `bottom`
    Bottom,
    /// `left`
    Left,
    /// `inset-block-start`
    InsetBlockStart,
    /// `inset-block-end`
    InsetBlockEnd,
    /// `inset-inline-start`
    InsetInlineStart,
    /// `inset-inline-end`
    InsetInlineEnd,
}

impl InsetProperty {
    /// The physical side this inset sets, given the element's writing mode
    /// and direction.
    #[must_use]
    pub const fn physical_side(self, writing_mode: WritingMode, direction: Direction) -> PhysicalSide {
        match self {
            Self::Top => PhysicalSide::Top,
            Self::Right => PhysicalSide::Right,
            Self::Bottom => PhysicalSide::Bottom,
            Self::Left => PhysicalSide::Left,
            Self::InsetBlockStart => writing_mode.block_start_physical(),
            Self::InsetBlockEnd => writing_mode.block_end_physical(),
            Self::InsetInlineStart => writing_mode.inline_start_physical(direction),
            Self::InsetInlineEnd => writing_mode.inline_end_physical(direction),
        }
    }
}

/// [CSS Box Sizing § 3](https://drafts.csswg.org/css-sizing-3/#sizing-properties)
/// and their flow-relative counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SizingProperty {
    /// `width`
    Width,
    /// `height`
    Height,
    /// `min-width`
    MinWidth,
    /// `min-height`
    MinHeight,
    /// `max-width`
    MaxWidth,
    /// `max-height`
    MaxHeight,
    /// `block-size`
    BlockSize,
    /// `inline-size`
    InlineSize,
    /// `min-block-size`
    MinBlockSize,
    /// `min-inline-size`
    MinInlineSize,
    /// `max-block-size`
    MaxBlockSize,
    /// `max-inline-size`
    MaxInlineSize,
}

impl SizingProperty {
    /// The physical axis this property sizes along.
    #[must_use]
    pub const fn axis(self, writing_mode: WritingMode) -> Axis {
        match self {
            Self::Width | Self::MinWidth | Self::MaxWidth => Axis::Horizontal,
            Self::Height | Self::MinHeight | Self::MaxHeight => Axis::Vertical,
            Self::BlockSize | Self::MinBlockSize | Self::MaxBlockSize => writing_mode.block_axis(),
            Self::InlineSize | Self::MinInlineSize | Self::MaxInlineSize => {
                writing_mode.inline_axis()
            }
        }
    }
}

/// A property that may carry `anchor()` or `anchor-size()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchoredProperty {
    /// An inset property; `anchor()` is valid here.
    Inset(InsetProperty),
    /// A sizing property; `anchor-size()` is valid here.
    Sizing(SizingProperty),
}

impl AnchoredProperty {
    /// Recognize a property name. Returns `None` for everything else,
    /// including custom properties.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.parse()
            .map(Self::Inset)
            .or_else(|_| name.parse().map(Self::Sizing))
            .ok()
    }

    /// The canonical lowercase property name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Inset(p) => p.into(),
            Self::Sizing(p) => p.into(),
        }
    }
}
