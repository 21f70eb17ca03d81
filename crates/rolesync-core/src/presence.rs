//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Presence evaluation against the configured vanity pattern."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use anyhow::{anyhow, Result};

use crate::types::{ActivityRecord, MemberSnapshot};

/// Case-insensitive substring pattern, validated non-empty, fixed for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanityPattern {
    lowered: String,
}

impl VanityPattern {
    pub fn new(pattern: impl AsRef<str>) -> Result<Self> {
        let pattern = pattern.as_ref();
        if pattern.is_empty() {
            return Err(anyhow!("vanity pattern must not be empty"));
        }
        Ok(Self {
            lowered: pattern.to_lowercase(),
        })
    }

    /// Substring test with unicode-aware case folding. No trimming beyond
    /// plain substring semantics.
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.lowered)
    }
}

/// Pure decision function mapping a member's activity records to a
/// "qualifies for the marker role" boolean.
#[derive(Debug, Clone)]
pub struct PresenceEvaluator {
    pattern: VanityPattern,
}

impl PresenceEvaluator {
    pub fn new(pattern: VanityPattern) -> Self {
        Self { pattern }
    }

    /// True iff any custom-status record with non-empty text contains the
    /// vanity pattern. Total: an empty record set, emoji-only statuses, and
    /// non-custom activity kinds all evaluate to false.
    pub fn qualifies(&self, snapshot: &MemberSnapshot) -> bool {
        snapshot.activities.iter().any(|record| match record {
            ActivityRecord::Custom { text: Some(text) } if !text.is_empty() => {
                self.pattern.matches(text)
            }
            _ => false,
        })
    }
}
