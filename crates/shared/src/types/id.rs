//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `AccountId` where a
//! `JournalEntryId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant (ledger isolation boundary).");
typed_id!(AccountId, "Unique identifier for a chart of accounts entry.");
typed_id!(JournalEntryId, "Unique identifier for a journal entry.");
typed_id!(PeriodId, "Unique identifier for an accounting period.");
typed_id!(RecurringTemplateId, "Unique identifier for a recurring journal template.");
typed_id!(AllocationRuleId, "Unique identifier for an allocation rule.");
typed_id!(IntercompanyTxId, "Unique identifier for an intercompany transaction.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ids_are_unique() {
        assert_ne!(AccountId::new(), AccountId::new());
        assert_ne!(JournalEntryId::new(), JournalEntryId::new());
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = TenantId::new();
        let parsed = TenantId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        // UUID v7 embeds a millisecond timestamp, so IDs created in
        // sequence sort in creation order (ties possible within 1ms).
        let a = JournalEntryId::new();
        let b = JournalEntryId::new();
        assert!(a <= b);
    }

    #[test]
    fn from_uuid_preserves_value() {
        let raw = uuid::Uuid::now_v7();
        let id = PeriodId::from_uuid(raw);
        assert_eq!(id.into_inner(), raw);
    }

    #[test]
    fn invalid_string_is_rejected() {
        assert!(AccountId::from_str("not-a-uuid").is_err());
    }
}
