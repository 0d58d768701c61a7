//! Section and function identifiers
//!
//! Both are interned names: well-known values are `const` and borrow a
//! `'static` string, names read from a store are validated once on
//! construction. Comparison is exact and case-sensitive.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_NAME_LEN, PERMISSION_SEPARATOR};
use crate::error::{RolegateError, Result};

/// Check a section/function name. `kind` is only used in the error message.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RolegateError::InvalidIdentifier(format!("{} cannot be empty", kind)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(RolegateError::InvalidIdentifier(format!(
            "{} too long: {} bytes (max {})",
            kind,
            name.len(),
            MAX_NAME_LEN
        )));
    }
    if name.trim() != name {
        return Err(RolegateError::InvalidIdentifier(format!(
            "{} '{}' has surrounding whitespace",
            kind, name
        )));
    }
    if name.contains(PERMISSION_SEPARATOR) {
        return Err(RolegateError::InvalidIdentifier(format!(
            "{} '{}' contains '{}'",
            kind, name, PERMISSION_SEPARATOR
        )));
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Validate and wrap an owned name.
            pub fn new(name: impl Into<String>) -> Result<Self> {
                let name = name.into();
                validate_name($kind, &name)?;
                Ok(Self(Cow::Owned(name)))
            }

            /// Wrap a well-known name without validation.
            pub const fn from_static(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.as_str())
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }

        impl TryFrom<String> for $name {
            type Error = RolegateError;

            fn try_from(s: String) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = RolegateError;

            fn try_from(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.0.into_owned()
            }
        }
    };
}

identifier!(
    /// A coarse-grained application area, e.g. `Merchant`.
    Section,
    "section"
);

identifier!(
    /// A fine-grained action within a section, e.g. `MakeDeposit`.
    Function,
    "function"
);

/// Well-known sections
pub mod sections {
    use super::Section;

    pub const ESTATE: Section = Section::from_static("Estate");
    pub const MERCHANT: Section = Section::from_static("Merchant");
    pub const OPERATOR: Section = Section::from_static("Operator");
    pub const CONTRACT: Section = Section::from_static("Contract");
    pub const FILE_PROCESSING: Section = Section::from_static("FileProcessing");
    pub const REPORTING: Section = Section::from_static("Reporting");
    pub const USER: Section = Section::from_static("User");

    pub const ALL: &[Section] = &[ESTATE, MERCHANT, OPERATOR, CONTRACT, FILE_PROCESSING, REPORTING, USER];
}

/// Well-known functions
pub mod functions {
    use super::Function;

    pub const VIEW: Function = Function::from_static("View");
    pub const LIST: Function = Function::from_static("List");
    pub const CREATE: Function = Function::from_static("Create");
    pub const EDIT: Function = Function::from_static("Edit");
    pub const DELETE: Function = Function::from_static("Delete");
    pub const MAKE_DEPOSIT: Function = Function::from_static("MakeDeposit");

    pub const ALL: &[Function] = &[VIEW, LIST, CREATE, EDIT, DELETE, MAKE_DEPOSIT];
}

// ============================================================================
// Tests
// ============================================================================
