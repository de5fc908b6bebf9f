use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The full persisted mapping from user id to record.
///
/// A `BTreeMap` keeps keys sorted, so serializing the same mapping twice
/// always produces the same bytes.
pub type UserMap = BTreeMap<String, UserRecord>;

/// A single registered user.
///
/// The user's own id is the key of the [`UserMap`] entry and is not repeated
/// inside the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Numeric identity assigned by the messaging platform.
    pub telegram_id: u64,
    /// Id of the user whose invitation brought this user in.
    ///
    /// Persisted as an explicit `null` when absent.
    pub referred_by: Option<String>,
}

impl UserRecord {
    /// Create a record with no referrer.
    pub fn new(telegram_id: u64) -> Self {
        Self {
            telegram_id,
            referred_by: None,
        }
    }

    /// Create a record attributed to `referrer`.
    pub fn referred(telegram_id: u64, referrer: impl Into<String>) -> Self {
        Self {
            telegram_id,
            referred_by: Some(referrer.into()),
        }
    }

    /// Returns `true` if this record names `id` as its referrer.
    pub fn is_referred_by(&self, id: &str) -> bool {
        self.referred_by.as_deref() == Some(id)
    }
}

/// Count records in `users` whose referrer is `id`.
pub fn count_referred_by(users: &UserMap, id: &str) -> usize {
    users.values().filter(|r| r.is_referred_by(id)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_referrer_serializes_as_null() {
        let json = serde_json::to_string(&UserRecord::new(42)).unwrap();
        assert_eq!(json, r#"{"telegram_id":42,"referred_by":null}"#);
    }

    #[test]
    fn parses_persisted_layout() {
        let raw = r#"{
            "100": { "telegram_id": 100, "referred_by": null },
            "200": { "telegram_id": 200, "referred_by": "100" }
        }"#;
        let users: UserMap = serde_json::from_str(raw).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users["200"], UserRecord::referred(200, "100"));
        assert!(users["100"].referred_by.is_none());
    }

    #[test]
    fn counts_only_direct_referrals() {
        let mut users = UserMap::new();
        users.insert("a".into(), UserRecord::new(1));
        users.insert("b".into(), UserRecord::referred(2, "a"));
        users.insert("c".into(), UserRecord::referred(3, "a"));
        users.insert("d".into(), UserRecord::referred(4, "b"));

        assert_eq!(count_referred_by(&users, "a"), 2);
        assert_eq!(count_referred_by(&users, "b"), 1);
        assert_eq!(count_referred_by(&users, "d"), 0);
    }
}
