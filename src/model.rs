//! The user document and its identifier.

use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Opaque user identifier.
///
/// Valid identifiers are non-empty and made only of ASCII lowercase letters
/// and digits. Freshly minted ones are 32 hex characters.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Mints a new identifier for a record that is about to be stored.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// `^[a-z0-9]+$`
    pub fn is_valid(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    }

    /// Wraps `s` if it is a valid identifier.
    pub fn parse(s: &str) -> Option<Self> {
        Self::is_valid(s).then(|| Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The client-supplied part of a user: what create and update bodies carry.
///
/// Only a JSON object decodes into a draft. Every field is optional and a
/// missing or `null` field becomes empty/zero. Unknown fields, including any
/// `id`, are ignored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct UserDraft {
    pub name: String,
    pub age: i64,
    pub email: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DraftFields {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    age: i64,
    #[serde(deserialize_with = "null_as_default")]
    email: String,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

struct DraftVisitor;

impl<'de> Visitor<'de> for DraftVisitor {
    type Value = UserDraft;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    // No visit_seq: derived structs would otherwise accept `[name, age, email]`.
    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<UserDraft, A::Error> {
        let DraftFields { name, age, email } =
            DraftFields::deserialize(MapAccessDeserializer::new(map))?;
        Ok(UserDraft { name, age, email })
    }
}

impl<'de> Deserialize<'de> for UserDraft {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_map(DraftVisitor)
    }
}

impl UserDraft {
    /// Attaches an identifier, producing the full stored record.
    pub fn with_id(self, id: UserId) -> UserRecord {
        UserRecord { id, name: self.name, age: self.age, email: self.email }
    }
}

/// A persisted user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub age: i64,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        let id = UserId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(UserId::is_valid(id.as_str()));
        assert_ne!(id, UserId::generate());
    }

    #[test]
    fn identifier_alphabet() {
        assert!(UserId::is_valid("abc123"));
        assert!(UserId::is_valid("0"));
        assert!(!UserId::is_valid(""));
        assert!(!UserId::is_valid("ABC"));
        assert!(!UserId::is_valid("a-b"));
        assert!(!UserId::is_valid("a%20b"));
        assert!(!UserId::is_valid("é1"));
        assert_eq!(UserId::parse("Zz"), None);
    }

    #[test]
    fn draft_defaults_missing_fields_and_ignores_unknown() {
        let draft: UserDraft =
            serde_json::from_str(r#"{"age":31,"id":"zzz","_id":"yyy","role":"admin"}"#).unwrap();
        assert_eq!(draft, UserDraft { name: String::new(), age: 31, email: String::new() });
    }

    #[test]
    fn draft_rejects_wrong_types() {
        assert!(serde_json::from_str::<UserDraft>(r#"{"age":"thirty"}"#).is_err());
        assert!(serde_json::from_str::<UserDraft>(r#"{"age":30.5}"#).is_err());
        assert!(serde_json::from_str::<UserDraft>(r#""ana""#).is_err());
    }

    #[test]
    fn draft_accepts_only_objects() {
        for body in ["[]", r#"["Ana",30,"a@x.com"]"#, "null", "42", r#""x""#] {
            let err = serde_json::from_str::<UserDraft>(body).unwrap_err();
            assert!(err.to_string().contains("a JSON object"), "{body}: {err}");
        }
        assert_eq!(serde_json::from_str::<UserDraft>("{}").unwrap(), UserDraft::default());
    }

    #[test]
    fn draft_treats_null_fields_as_missing() {
        let draft: UserDraft =
            serde_json::from_str(r#"{"name":null,"age":3,"email":null}"#).unwrap();
        assert_eq!(draft, UserDraft { name: String::new(), age: 3, email: String::new() });

        let draft: UserDraft = serde_json::from_str(r#"{"name":"Ana","age":null}"#).unwrap();
        assert_eq!(draft.age, 0);
        assert_eq!(draft.name, "Ana");
    }

    #[test]
    fn record_serialises_with_plain_id() {
        let record = UserDraft { name: "Ana".into(), age: 30, email: "a@x.com".into() }
            .with_id(UserId::parse("abc").unwrap());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "id": "abc", "name": "Ana", "age": 30, "email": "a@x.com" })
        );
    }
}
