//! Principal flags and documents

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A named permission tier
///
/// The wire form is the upper snake case name. Unknown names never map to a
/// variant; see [`UserFlag::from_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserFlag {
    User,
    ElevatedUser,
    Administrator,
    SystemOperator,
}

impl UserFlag {
    pub const ALL: [UserFlag; 4] = [
        UserFlag::User,
        UserFlag::ElevatedUser,
        UserFlag::Administrator,
        UserFlag::SystemOperator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::ElevatedUser => "ELEVATED_USER",
            Self::Administrator => "ADMINISTRATOR",
            Self::SystemOperator => "SYSTEM_OPERATOR",
        }
    }
}

impl fmt::Display for UserFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserFlag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| DomainError::configuration(format!("Unrecognized user flag '{}'", s)))
    }
}

/// The set of flags held by a principal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<UserFlag>);

impl FlagSet {
    /// No flags, the anonymous tier
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, flag: UserFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = UserFlag> + '_ {
        self.0.iter().copied()
    }

    pub fn insert(&mut self, flag: UserFlag) -> bool {
        self.0.insert(flag)
    }

    /// Parse wire strings, failing on the first unknown name
    pub fn parse<I, S>(values: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .map(|value| value.as_ref().parse::<UserFlag>())
            .collect()
    }
}

impl FromIterator<UserFlag> for FlagSet {
    fn from_iter<T: IntoIterator<Item = UserFlag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(UserFlag::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// A principal record as stored in the principal store
///
/// Both fields are optional in storage; a missing `flags` attribute means
/// the principal holds no flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
}

impl PrincipalDocument {
    pub fn new(email: impl Into<String>, flags: &[UserFlag]) -> Self {
        Self {
            email: Some(email.into()),
            flags: Some(flags.iter().map(|f| f.as_str().to_string()).collect()),
        }
    }

    /// Validate the stored flag names into a [`FlagSet`]
    pub fn flag_set(&self) -> Result<FlagSet, DomainError> {
        match &self.flags {
            Some(flags) => FlagSet::parse(flags),
            None => Ok(FlagSet::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wire_names() {
        for flag in UserFlag::ALL {
            let json = serde_json::to_string(&flag).unwrap();
            assert_eq!(json, format!("\"{}\"", flag.as_str()));
            assert_eq!(flag.as_str().parse::<UserFlag>().unwrap(), flag);
        }
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = "SUPERUSER".parse::<UserFlag>().unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        assert!("user".parse::<UserFlag>().is_err());
        assert!(serde_json::from_str::<UserFlag>("\"ROOT\"").is_err());
    }

    #[test]
    fn test_flag_set_parse() {
        let flags = FlagSet::parse(["USER", "ELEVATED_USER", "USER"]).unwrap();

        assert_eq!(flags.len(), 2);
        assert!(flags.contains(UserFlag::User));
        assert!(flags.contains(UserFlag::ElevatedUser));
        assert!(!flags.contains(UserFlag::Administrator));
    }

    #[test]
    fn test_flag_set_parse_fails_on_unknown() {
        assert!(FlagSet::parse(["USER", "GOD_MODE"]).is_err());
    }

    #[test]
    fn test_document_without_flags_is_empty() {
        let doc: PrincipalDocument = serde_json::from_str(r#"{"email": "a@b.c"}"#).unwrap();
        assert!(doc.flag_set().unwrap().is_empty());

        let doc: PrincipalDocument = serde_json::from_str(r#"{}"#).unwrap();
        assert!(doc.flag_set().unwrap().is_empty());
    }

    #[test]
    fn test_document_round_trip_flags() {
        let doc = PrincipalDocument::new("ops@example.com", &[UserFlag::SystemOperator]);
        let flags = doc.flag_set().unwrap();

        assert!(flags.contains(UserFlag::SystemOperator));
        assert_eq!(flags.to_string(), "[SYSTEM_OPERATOR]");
    }
}
