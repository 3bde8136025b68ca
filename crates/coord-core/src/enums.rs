//! Closed, fixed-set enums for the coordination data model.
//!
//! Unlike a tagging system with user-extensible types, every enum in this
//! crate is a small closed set validated on parse: an unrecognized string is
//! a hard error, not a fallback `Custom` variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a string does not match any variant of a closed enum.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {type_name} value: {value:?}")]
pub struct EnumParseError {
    pub type_name: &'static str,
    pub value: String,
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $str:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// The canonical snake-case string for this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $str),+
                }
            }

            /// All variants, in declaration order.
            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    other => Err(EnumParseError {
                        type_name: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_enum! {
    /// Lifecycle status of a [`crate::project::Project`].
    pub enum ProjectStatus {
        Active => "active",
        Completed => "completed",
        Archived => "archived",
        Paused => "paused",
    }
}

closed_enum! {
    /// Lifecycle status of an [`crate::issue::Issue`].
    pub enum IssueStatus {
        Open => "open",
        InProgress => "in_progress",
        Blocked => "blocked",
        Done => "done",
        Cancelled => "cancelled",
    }
}

impl IssueStatus {
    /// `true` for statuses an issue can never leave without an explicit update.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

closed_enum! {
    /// Relationship type of a [`crate::dependency::Dependency`] edge.
    ///
    /// Only [`DependencyType::Blocks`] affects issue status transitions; the
    /// others are informational annotations on the graph.
    pub enum DependencyType {
        Blocks => "blocks",
        Informs => "informs",
        DiscoveredFrom => "discovered_from",
        AnyOf => "any_of",
    }
}

closed_enum! {
    /// Result of a recorded [`crate::outcome::Outcome`].
    pub enum OutcomeResult {
        Success => "success",
        Failure => "failure",
        Partial => "partial",
        Cancelled => "cancelled",
    }
}

closed_enum! {
    /// Liveness status of an [`crate::agent::Agent`].
    pub enum AgentStatus {
        Active => "active",
        Idle => "idle",
        Dead => "dead",
    }
}

closed_enum! {
    /// Event type recorded in the [`crate::broadcast::Broadcast`] log.
    pub enum BroadcastEventType {
        Completed => "completed",
        Blocked => "blocked",
        Discovered => "discovered",
        Claimed => "claimed",
        Released => "released",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_status_roundtrip() {
        for status in IssueStatus::all() {
            let s = status.as_str();
            let parsed: IssueStatus = s.parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn issue_status_terminal() {
        assert!(IssueStatus::Done.is_terminal());
        assert!(IssueStatus::Cancelled.is_terminal());
        assert!(!IssueStatus::Open.is_terminal());
        assert!(!IssueStatus::Blocked.is_terminal());
        assert!(!IssueStatus::InProgress.is_terminal());
    }

    #[test]
    fn unknown_value_is_error() {
        let err = "bogus".parse::<IssueStatus>().unwrap_err();
        assert_eq!(err.value, "bogus");
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&DependencyType::Blocks).unwrap();
        assert_eq!(json, "\"blocks\"");
        let back: DependencyType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DependencyType::Blocks);
    }

    #[test]
    fn serde_rejects_unknown() {
        let err = serde_json::from_str::<AgentStatus>("\"zombie\"").unwrap_err();
        assert!(err.to_string().contains("zombie"));
    }
}
