//! Tri-state fields and the normalization primitives built on them
//!
//! Desired state is sparse: a field is either left to the server
//! ([`Field::Unset`]) or given a literal value ([`Field::Explicit`]),
//! including an explicit zero. Remote objects are dense and encode
//! absence as the zero value, so the two directions need help:
//!
//! - Towards the API, unset fields become `None` and are skipped.
//! - From the API, a value equal to the kind's absence sentinel is read
//!   back as `Unset` unless the caller declared that exact value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::Discrepancy;

/// A desired-state field: not provided, or an explicit value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// The user did not specify a value; the server default applies.
    #[default]
    Unset,
    /// The user gave a literal value (possibly the zero value).
    Explicit(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Borrow the explicit value, if any.
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Explicit(v) => Some(v),
            Self::Unset => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Explicit(v) => Some(v),
            Self::Unset => None,
        }
    }
}

impl<T: Clone> Field<T> {
    /// Payload form: explicit values are sent, unset ones are omitted.
    pub fn to_payload(&self) -> Option<T> {
        self.as_option().cloned()
    }

    /// Resolved value for APIs without partial-patch semantics.
    pub fn value_or(&self, default: T) -> T {
        self.as_option().cloned().unwrap_or(default)
    }
}

impl<T: Clone + PartialEq> Field<T> {
    /// Read a dense remote value back into a field.
    ///
    /// `absent` is the value the API uses for "not set". When the remote
    /// value equals it, the field is `Unset`, unless `prior` declared that
    /// same value explicitly.
    pub fn from_remote(value: &T, absent: &T, prior: Option<&Field<T>>) -> Self {
        if value != absent {
            return Self::Explicit(value.clone());
        }
        match prior {
            Some(Self::Explicit(declared)) if declared == value => Self::Explicit(value.clone()),
            _ => Self::Unset,
        }
    }

    /// Read an immutable-after-create field.
    ///
    /// A previously declared explicit value is never replaced by the
    /// server's normalized form; the mismatch is recorded instead.
    pub fn retain_declared(
        field: &'static str,
        value: &T,
        absent: &T,
        prior: Option<&Field<T>>,
        discrepancies: &mut Vec<Discrepancy>,
    ) -> Self
    where
        T: std::fmt::Display,
    {
        if let Some(Self::Explicit(declared)) = prior {
            if declared != value {
                discrepancies.push(Discrepancy {
                    field,
                    declared: declared.to_string(),
                    remote: value.to_string(),
                });
            }
            return Self::Explicit(declared.clone());
        }
        Self::from_remote(value, absent, prior)
    }
}

impl<T: Clone> Field<Vec<T>> {
    /// Read a remote list. An empty list is `Unset` unless the caller
    /// explicitly declared an empty list.
    pub fn list_from_remote(values: &[T], prior: Option<&Field<Vec<T>>>) -> Self {
        if !values.is_empty() {
            return Self::Explicit(values.to_vec());
        }
        match prior {
            Some(Self::Explicit(declared)) if declared.is_empty() => Self::Explicit(Vec::new()),
            _ => Self::Unset,
        }
    }

    /// Payload form for lists the API requires to be present.
    pub fn to_present_list(&self) -> Vec<T> {
        self.as_option().cloned().unwrap_or_default()
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Explicit(value)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Explicit)
    }
}

// Serialized as the bare value; `Unset` must be skipped by the container
// (`skip_serializing_if = "Field::is_unset"`) and restored by `default`.
impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Explicit(v) => v.serialize(serializer),
            Self::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_remote_sentinel_is_unset() {
        let field = Field::from_remote(&false, &false, None);
        assert_eq!(field, Field::Unset);
    }

    #[test]
    fn test_from_remote_keeps_declared_zero() {
        let prior = Field::Explicit(false);
        let field = Field::from_remote(&false, &false, Some(&prior));
        assert_eq!(field, Field::Explicit(false));
    }

    #[test]
    fn test_from_remote_non_sentinel_is_explicit() {
        let field = Field::from_remote(&5_i64, &0, Some(&Field::Unset));
        assert_eq!(field, Field::Explicit(5));
    }

    #[test]
    fn test_from_remote_negative_sentinel() {
        assert_eq!(Field::from_remote(&-1_i64, &-1, None), Field::Unset);
        assert_eq!(Field::from_remote(&0_i64, &-1, None), Field::Explicit(0));
    }

    #[test]
    fn test_retain_declared_records_discrepancy() {
        let mut discrepancies = Vec::new();
        let prior = Field::Explicit("1.16.0".to_string());
        let field = Field::retain_declared(
            "channel",
            &"1.16".to_string(),
            &String::new(),
            Some(&prior),
            &mut discrepancies,
        );

        assert_eq!(field, Field::Explicit("1.16.0".to_string()));
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].field, "channel");
        assert_eq!(discrepancies[0].remote, "1.16");
    }

    #[test]
    fn test_retain_declared_without_prior_takes_remote() {
        let mut discrepancies = Vec::new();
        let field = Field::retain_declared(
            "channel",
            &"1.16".to_string(),
            &String::new(),
            None,
            &mut discrepancies,
        );
        assert_eq!(field, Field::Explicit("1.16".to_string()));
        assert!(discrepancies.is_empty());
    }

    #[test]
    fn test_list_from_remote() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(Field::list_from_remote(&empty, None), Field::Unset);

        let declared_empty = Field::Explicit(Vec::<String>::new());
        assert_eq!(
            Field::list_from_remote(&empty, Some(&declared_empty)),
            Field::Explicit(Vec::new())
        );

        let values = vec!["a".to_string()];
        assert_eq!(
            Field::list_from_remote(&values, None),
            Field::Explicit(values.clone())
        );
    }

    #[test]
    fn test_payload_helpers() {
        let unset: Field<bool> = Field::Unset;
        assert_eq!(unset.to_payload(), None);
        assert!(!unset.value_or(false));
        assert!(Field::Explicit(true).value_or(false));

        let list: Field<Vec<u8>> = Field::Unset;
        assert!(list.to_present_list().is_empty());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        limit: Field<bool>,
    }

    #[test]
    fn test_serde_skips_unset() {
        let json = serde_json::to_string(&Holder { limit: Field::Unset }).unwrap();
        assert_eq!(json, "{}");

        let back: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(back.limit, Field::Unset);

        let set: Holder = serde_json::from_str(r#"{"limit":false}"#).unwrap();
        assert_eq!(set.limit, Field::Explicit(false));
    }
}
