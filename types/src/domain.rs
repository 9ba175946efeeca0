//! The two independent credit/attestation namespaces.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which half of a profile a bucket or record belongs to.
///
/// Education credits can only be spent on education records and experience
/// credits only on experience records; the two never mix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Institutions (schools, universities).
    Education,
    /// Companies (employment history).
    Experience,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Education, Domain::Experience];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Education => "education",
            Domain::Experience => "experience",
        }
    }

    /// One-byte tag used in storage keys.
    pub fn tag(&self) -> u8 {
        match self {
            Domain::Education => b'e',
            Domain::Experience => b'x',
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "education" => Ok(Domain::Education),
            "experience" => Ok(Domain::Experience),
            _ => Err(TypesError::UnknownDomain(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Education".parse::<Domain>().unwrap(), Domain::Education);
        assert_eq!(" EXPERIENCE ".parse::<Domain>().unwrap(), Domain::Experience);
    }

    #[test]
    fn unknown_domain_rejected() {
        assert_eq!(
            "skills".parse::<Domain>(),
            Err(TypesError::UnknownDomain("skills".into()))
        );
    }

    #[test]
    fn tags_are_distinct() {
        assert_ne!(Domain::Education.tag(), Domain::Experience.tag());
    }
}
