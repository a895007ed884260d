//! Closed sets of user roles and faculties.
//!
//! Both are stored and serialized as the exact strings the relational schema
//! uses: lowercase role names and uppercase faculty codes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    /// Principal Lecturer.
    Prl,
    /// Program Leader.
    Pl,
    /// Faculty Management.
    Fmg,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised role `{0}`")]
pub struct InvalidRole(pub String);

impl Role {
    pub const ALL: [Role; 5] = [Role::Student, Role::Lecturer, Role::Prl, Role::Pl, Role::Fmg];

    pub fn as_str(&self) -> &'static str {
        use Role::*;
        match self {
            Student => "student",
            Lecturer => "lecturer",
            Prl => "prl",
            Pl => "pl",
            Fmg => "fmg",
        }
    }

    /// The only role this role may file a complaint against, following the
    /// chain student → lecturer → prl → pl → fmg. `None` for the top of the chain.
    pub fn complaint_target(&self) -> Option<Role> {
        use Role::*;
        match self {
            Student => Some(Lecturer),
            Lecturer => Some(Prl),
            Prl => Some(Pl),
            Pl => Some(Fmg),
            Fmg => None,
        }
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| InvalidRole(s.to_owned()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faculty {
    #[serde(rename = "FICT")]
    Fict,
    #[serde(rename = "FBMG")]
    Fbmg,
    #[serde(rename = "FABE")]
    Fabe,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised faculty `{0}`")]
pub struct InvalidFaculty(pub String);

impl Faculty {
    pub const ALL: [Faculty; 3] = [Faculty::Fict, Faculty::Fbmg, Faculty::Fabe];

    pub fn as_str(&self) -> &'static str {
        use Faculty::*;
        match self {
            Fict => "FICT",
            Fbmg => "FBMG",
            Fabe => "FABE",
        }
    }
}

impl FromStr for Faculty {
    type Err = InvalidFaculty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Faculty::ALL
            .into_iter()
            .find(|faculty| faculty.as_str() == s)
            .ok_or_else(|| InvalidFaculty(s.to_owned()))
    }
}

impl fmt::Display for Faculty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
