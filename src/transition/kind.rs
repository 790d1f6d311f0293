//! Transition kinds and their geometric parameters
//!
//! A kind names the geometric family of a transition (wipe, rotational wipe,
//! shaped circle, split, blinds, swap) together with the parameters that pick
//! the variant. Kinds round-trip through stable kebab-case names so they can be
//! stored in settings files, e.g. `wipe-left`, `wedge-up`, `blinds-vertical-8`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of bands used when a blinds name carries no explicit count
pub const DEFAULT_BLIND_COUNT: u32 = 8;

/// Upper bound on blind strips; larger counts are clamped
pub const MAX_BLIND_COUNT: u32 = 64;

/// Direction a wipe's leading edge travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl WipeDirection {
    fn name(&self) -> &'static str {
        match self {
            WipeDirection::Up => "up",
            WipeDirection::Down => "down",
            WipeDirection::Left => "left",
            WipeDirection::Right => "right",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(WipeDirection::Up),
            "down" => Some(WipeDirection::Down),
            "left" => Some(WipeDirection::Left),
            "right" => Some(WipeDirection::Right),
            _ => None,
        }
    }
}

/// Sweep variant of a rotational wipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationDirection {
    /// Sweeps clockwise from twelve o'clock
    Clockwise,
    /// Sweeps counterclockwise from twelve o'clock
    Counterclockwise,
    /// Opens symmetrically around twelve o'clock
    WedgeUp,
    /// Opens symmetrically around six o'clock
    WedgeDown,
}

/// Whether a shaped or split transition grows out of the center or closes in on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeOperation {
    Expand,
    Collapse,
}

impl ShapeOperation {
    fn name(&self) -> &'static str {
        match self {
            ShapeOperation::Expand => "expand",
            ShapeOperation::Collapse => "collapse",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "expand" => Some(ShapeOperation::Expand),
            "collapse" => Some(ShapeOperation::Collapse),
            _ => None,
        }
    }
}

/// Orientation of split centerlines and blind slats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Horizontal centerline / horizontal slats stacked top to bottom
    Horizontal,
    /// Vertical centerline / vertical slats laid out left to right
    Vertical,
}

impl Orientation {
    fn name(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "horizontal" => Some(Orientation::Horizontal),
            "vertical" => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

/// Geometric family of a transition and its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitionKind {
    /// Instant cut: incoming fully visible, outgoing hidden
    Swap,
    /// Opacity crossfade, never clipped
    #[default]
    Fade,
    /// Leading-edge rectangle wipe
    Wipe(WipeDirection),
    /// Circular sector sweep around the element center
    Rotate(RotationDirection),
    /// Circle growing out of or shrinking into the element center
    Circle(ShapeOperation),
    /// Two bands growing from or closing on the centerline
    Split {
        orientation: Orientation,
        operation: ShapeOperation,
    },
    /// Equal strips that each wipe independently
    Blinds { orientation: Orientation, count: u32 },
    /// A name this build does not recognise; never clips
    Unknown(String),
}

impl TransitionKind {
    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            TransitionKind::Swap => "Swap",
            TransitionKind::Fade => "Fade",
            TransitionKind::Wipe(_) => "Wipe",
            TransitionKind::Rotate(RotationDirection::WedgeUp | RotationDirection::WedgeDown) => {
                "Wedge"
            }
            TransitionKind::Rotate(_) => "Clock Wipe",
            TransitionKind::Circle(_) => "Circle",
            TransitionKind::Split { .. } => "Split",
            TransitionKind::Blinds { .. } => "Blinds",
            TransitionKind::Unknown(_) => "Unknown",
        }
    }

    /// Whether this kind is drawn by clipping rather than by opacity
    pub fn is_geometric(&self) -> bool {
        !matches!(
            self,
            TransitionKind::Swap | TransitionKind::Fade | TransitionKind::Unknown(_)
        )
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Swap => write!(f, "swap"),
            TransitionKind::Fade => write!(f, "fade"),
            TransitionKind::Wipe(direction) => write!(f, "wipe-{}", direction.name()),
            TransitionKind::Rotate(RotationDirection::Clockwise) => write!(f, "rotate-clockwise"),
            TransitionKind::Rotate(RotationDirection::Counterclockwise) => {
                write!(f, "rotate-counterclockwise")
            }
            TransitionKind::Rotate(RotationDirection::WedgeUp) => write!(f, "wedge-up"),
            TransitionKind::Rotate(RotationDirection::WedgeDown) => write!(f, "wedge-down"),
            TransitionKind::Circle(operation) => write!(f, "circle-{}", operation.name()),
            TransitionKind::Split {
                orientation,
                operation,
            } => write!(f, "split-{}-{}", orientation.name(), operation.name()),
            TransitionKind::Blinds { orientation, count } => {
                write!(f, "blinds-{}-{}", orientation.name(), count)
            }
            TransitionKind::Unknown(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for TransitionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let parts: Vec<&str> = name.split('-').collect();

        let kind = match parts.as_slice() {
            ["swap"] => Some(TransitionKind::Swap),
            ["fade"] => Some(TransitionKind::Fade),
            ["wipe", dir] => WipeDirection::parse(dir).map(TransitionKind::Wipe),
            ["rotate", "clockwise"] => Some(TransitionKind::Rotate(RotationDirection::Clockwise)),
            ["rotate", "counterclockwise"] => {
                Some(TransitionKind::Rotate(RotationDirection::Counterclockwise))
            }
            ["wedge", "up"] => Some(TransitionKind::Rotate(RotationDirection::WedgeUp)),
            ["wedge", "down"] => Some(TransitionKind::Rotate(RotationDirection::WedgeDown)),
            ["circle", op] => ShapeOperation::parse(op).map(TransitionKind::Circle),
            ["split", orientation, op] => Orientation::parse(orientation)
                .zip(ShapeOperation::parse(op))
                .map(|(orientation, operation)| TransitionKind::Split {
                    orientation,
                    operation,
                }),
            ["blinds", orientation] => {
                Orientation::parse(orientation).map(|orientation| TransitionKind::Blinds {
                    orientation,
                    count: DEFAULT_BLIND_COUNT,
                })
            }
            ["blinds", orientation, count] => Orientation::parse(orientation)
                .zip(count.parse::<u32>().ok().filter(|c| *c > 0))
                .map(|(orientation, count)| TransitionKind::Blinds {
                    orientation,
                    count: count.min(MAX_BLIND_COUNT),
                }),
            _ => None,
        };

        Ok(kind.unwrap_or_else(|| TransitionKind::Unknown(s.trim().to_string())))
    }
}

impl From<String> for TransitionKind {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<TransitionKind> for String {
    fn from(value: TransitionKind) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        let kinds = [
            TransitionKind::Swap,
            TransitionKind::Fade,
            TransitionKind::Wipe(WipeDirection::Left),
            TransitionKind::Rotate(RotationDirection::Counterclockwise),
            TransitionKind::Rotate(RotationDirection::WedgeDown),
            TransitionKind::Circle(ShapeOperation::Collapse),
            TransitionKind::Split {
                orientation: Orientation::Vertical,
                operation: ShapeOperation::Expand,
            },
            TransitionKind::Blinds {
                orientation: Orientation::Horizontal,
                count: 5,
            },
        ];
        for kind in kinds {
            let parsed: TransitionKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_blinds_default_count() {
        let kind: TransitionKind = "blinds-vertical".parse().unwrap();
        assert_eq!(
            kind,
            TransitionKind::Blinds {
                orientation: Orientation::Vertical,
                count: DEFAULT_BLIND_COUNT
            }
        );
    }

    #[test]
    fn test_blinds_count_is_clamped() {
        let kind: TransitionKind = "blinds-vertical-4000000000".parse().unwrap();
        assert_eq!(
            kind,
            TransitionKind::Blinds {
                orientation: Orientation::Vertical,
                count: MAX_BLIND_COUNT
            }
        );
        assert_eq!(kind.to_string(), "blinds-vertical-64");
    }

    #[test]
    fn test_unknown_name_is_preserved() {
        let kind: TransitionKind = "page-curl".parse().unwrap();
        assert_eq!(kind, TransitionKind::Unknown("page-curl".to_string()));
        assert_eq!(kind.to_string(), "page-curl");
        assert!(!kind.is_geometric());

        let zero_blinds: TransitionKind = "blinds-horizontal-0".parse().unwrap();
        assert!(matches!(zero_blinds, TransitionKind::Unknown(_)));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let kind: TransitionKind = " Wipe-Right ".parse().unwrap();
        assert_eq!(kind, TransitionKind::Wipe(WipeDirection::Right));
    }
}
