//! Logical roles and output assignments
//!
//! An [`Assignment`] records which role an output plays and the bounds it had
//! when the role was given. The full set is persisted as
//! [`StoredAssignments`], together with the output count seen at that time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::display::{Output, OutputBounds, OutputId};

/// Output count persisted before any reconciliation has happened
pub const NO_PRIOR_COUNT: i32 = -1;

/// What an output is used for during a presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalRole {
    /// Audience-facing projection
    Main,
    /// Confidence monitor for the speaker
    Teleprompt,
    /// Auxiliary output, numbered from 1
    Other(u32),
    /// Output is not used
    #[default]
    None,
}

impl LogicalRole {
    /// Human-readable label for UI
    pub fn label(&self) -> String {
        match self {
            LogicalRole::Main => "Main".to_string(),
            LogicalRole::Teleprompt => "Teleprompt".to_string(),
            LogicalRole::Other(n) => format!("Other {}", n),
            LogicalRole::None => "Unassigned".to_string(),
        }
    }

    /// Whether this role gets a presentation surface
    pub fn is_active(&self) -> bool {
        !matches!(self, LogicalRole::None)
    }
}

impl fmt::Display for LogicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalRole::Main => write!(f, "main"),
            LogicalRole::Teleprompt => write!(f, "teleprompt"),
            LogicalRole::Other(n) => write!(f, "other-{}", n),
            LogicalRole::None => write!(f, "none"),
        }
    }
}

/// Error for role names that cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for LogicalRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "main" => Ok(LogicalRole::Main),
            "teleprompt" => Ok(LogicalRole::Teleprompt),
            "none" | "" => Ok(LogicalRole::None),
            other => other
                .strip_prefix("other-")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .map(LogicalRole::Other)
                .ok_or_else(|| ParseRoleError(s.to_string())),
        }
    }
}

impl Serialize for LogicalRole {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogicalRole {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Role given to one output, with the bounds it had at assignment time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "outputId")]
    pub output_id: OutputId,
    #[serde(rename = "role")]
    pub role: LogicalRole,
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "bounds")]
    pub bounds: OutputBounds,
}

impl Assignment {
    /// Assign `role` to `output`, capturing its current bounds
    pub fn new(output: &Output, role: LogicalRole) -> Self {
        Self {
            output_id: output.id,
            role,
            name: display_name(role, &output.bounds),
            bounds: output.bounds,
        }
    }

    /// Change the role, keeping the name in sync
    pub fn set_role(&mut self, role: LogicalRole) {
        self.role = role;
        self.name = display_name(role, &self.bounds);
    }

    /// Record new bounds for the same output, keeping the name in sync
    pub fn set_bounds(&mut self, bounds: OutputBounds) {
        self.bounds = bounds;
        self.name = display_name(self.role, &bounds);
    }
}

fn display_name(role: LogicalRole, bounds: &OutputBounds) -> String {
    format!("{} ({}\u{d7}{})", role.label(), bounds.width, bounds.height)
}

/// Persisted assignment set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "StageDisplays")]
pub struct StoredAssignments {
    /// Output count at the last reconciliation, or [`NO_PRIOR_COUNT`]
    #[serde(rename = "count")]
    pub count: i32,
    #[serde(rename = "assignment", default)]
    pub assignments: Vec<Assignment>,
}

impl Default for StoredAssignments {
    fn default() -> Self {
        Self {
            count: NO_PRIOR_COUNT,
            assignments: Vec::new(),
        }
    }
}

impl StoredAssignments {
    pub fn new(count: usize, assignments: Vec<Assignment>) -> Self {
        Self {
            count: i32::try_from(count).unwrap_or(i32::MAX),
            assignments,
        }
    }

    /// Nothing usable was ever persisted
    pub fn is_first_run(&self) -> bool {
        self.count < 0 || self.assignments.is_empty()
    }

    pub fn find(&self, id: OutputId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.output_id == id)
    }
}

/// Role for the output at `index` when `count` outputs are assigned from scratch.
///
/// - one output: it is MAIN
/// - two outputs: the second is MAIN, the first (usually the operator's screen) is unused
/// - three or more: NONE, MAIN, TELEPROMPT, then OTHER(1), OTHER(2), ...
pub fn default_role(index: usize, count: usize) -> LogicalRole {
    match (count, index) {
        (1, 0) => LogicalRole::Main,
        (2, 1) => LogicalRole::Main,
        (2, _) => LogicalRole::None,
        (_, 0) => LogicalRole::None,
        (_, 1) => LogicalRole::Main,
        (_, 2) => LogicalRole::Teleprompt,
        (_, n) => LogicalRole::Other(u32::try_from(n - 2).unwrap_or(u32::MAX)),
    }
}

/// First-run assignment of every output, in platform order
pub fn auto_assign(outputs: &[Output]) -> Vec<Assignment> {
    outputs
        .iter()
        .enumerate()
        .map(|(index, output)| Assignment::new(output, default_role(index, outputs.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(n: u32) -> Vec<Output> {
        (0..n)
            .map(|i| {
                Output::new(
                    OutputId(i + 1),
                    OutputBounds::new(i as i32 * 1920, 0, 1920, 1080),
                )
            })
            .collect()
    }

    #[test]
    fn test_auto_assign_table() {
        let roles = |n: u32| -> Vec<LogicalRole> {
            auto_assign(&outputs(n)).into_iter().map(|a| a.role).collect()
        };

        assert_eq!(roles(1), vec![LogicalRole::Main]);
        assert_eq!(roles(2), vec![LogicalRole::None, LogicalRole::Main]);
        assert_eq!(
            roles(3),
            vec![LogicalRole::None, LogicalRole::Main, LogicalRole::Teleprompt]
        );
        assert_eq!(
            roles(5),
            vec![
                LogicalRole::None,
                LogicalRole::Main,
                LogicalRole::Teleprompt,
                LogicalRole::Other(1),
                LogicalRole::Other(2),
            ]
        );
    }

    #[test]
    fn test_auto_assign_has_one_main() {
        for n in 1..=8 {
            let assigned = auto_assign(&outputs(n));
            assert_eq!(assigned.len(), n as usize);
            let mains = assigned.iter().filter(|a| a.role == LogicalRole::Main).count();
            assert_eq!(mains, 1, "{n} outputs");
        }
        assert!(auto_assign(&[]).is_empty());
    }

    #[test]
    fn test_role_string_round_trip() {
        for role in [
            LogicalRole::Main,
            LogicalRole::Teleprompt,
            LogicalRole::Other(3),
            LogicalRole::None,
        ] {
            assert_eq!(role.to_string().parse::<LogicalRole>(), Ok(role));
        }
        assert_eq!("MAIN".parse::<LogicalRole>(), Ok(LogicalRole::Main));
        assert!("other-0".parse::<LogicalRole>().is_err());
        assert!("projector".parse::<LogicalRole>().is_err());
    }

    #[test]
    fn test_assignment_name_tracks_role_and_bounds() {
        let output = Output::new(OutputId(4), OutputBounds::new(0, 0, 1280, 720));
        let mut assignment = Assignment::new(&output, LogicalRole::Teleprompt);
        assert_eq!(assignment.name, "Teleprompt (1280\u{d7}720)");

        assignment.set_role(LogicalRole::Other(2));
        assignment.set_bounds(OutputBounds::new(0, 0, 1920, 1200));
        assert_eq!(assignment.name, "Other 2 (1920\u{d7}1200)");
    }

    #[test]
    fn test_default_set_is_first_run() {
        let stored = StoredAssignments::default();
        assert_eq!(stored.count, NO_PRIOR_COUNT);
        assert!(stored.is_first_run());
        assert!(!StoredAssignments::new(1, auto_assign(&outputs(1))).is_first_run());
    }
}
