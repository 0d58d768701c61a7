//! Permission and Role value types.
//!
//! A `Permission` is a granted (section, function) pair. A `Role` is a named,
//! order-irrelevant set of permissions; an empty role is valid and denies
//! everything.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::caps::{Function, Section};
use crate::constants::{MAX_NAME_LEN, PERMISSION_SEPARATOR};
use crate::error::{RolegateError, Result};

/// A granted (section, function) capability.
///
/// Serialises as `{ "section": ..., "function": ... }`; the text form is
/// `Section.Function`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    section: Section,
    function: Function,
}

impl Permission {
    pub const fn new(section: Section, function: Function) -> Self {
        Self { section, function }
    }

    /// Parse from "Section.Function" text.
    ///
    /// # Example
    /// ```
    /// use rolegate::Permission;
    ///
    /// let p = Permission::parse("Merchant.MakeDeposit").unwrap();
    /// assert_eq!(p.section(), "Merchant");
    /// assert_eq!(p.function(), "MakeDeposit");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (section, function) = s.split_once(PERMISSION_SEPARATOR).ok_or_else(|| {
            RolegateError::InvalidIdentifier(format!(
                "Invalid permission '{}': must be 'Section{}Function' format",
                s, PERMISSION_SEPARATOR
            ))
        })?;
        Ok(Self::new(Section::new(section)?, Function::new(function)?))
    }

    #[inline]
    pub fn section(&self) -> &Section {
        &self.section
    }

    #[inline]
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// True if this is exactly the (section, function) pair.
    #[inline]
    pub fn matches(&self, section: &Section, function: &Function) -> bool {
        self.section == *section && self.function == *function
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.section, PERMISSION_SEPARATOR, self.function)
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permission({})", self)
    }
}

impl FromStr for Permission {
    type Err = RolegateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Permission {
    type Error = RolegateError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<(Section, Function)> for Permission {
    fn from((section, function): (Section, Function)) -> Self {
        Self::new(section, function)
    }
}

/// A named set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    name: String,
    permissions: BTreeSet<Permission>,
}

impl Role {
    /// Create a role. The name must be non-empty; duplicates in
    /// `permissions` collapse.
    pub fn new(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RolegateError::InvalidRole("Role name cannot be empty".into()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(RolegateError::InvalidRole(format!(
                "Role name too long: {} bytes (max {})",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        Ok(Self {
            name,
            permissions: permissions.into_iter().collect(),
        })
    }

    /// A role with no permissions.
    pub fn empty(name: impl Into<String>) -> Result<Self> {
        Self::new(name, std::iter::empty())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permissions in (section, function) order.
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> + '_ {
        self.permissions.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Exact, case-sensitive (section, function) membership.
    pub fn has_permission(&self, section: &Section, function: &Function) -> bool {
        self.permissions.iter().any(|p| p.matches(section, function))
    }

    /// True if any permission falls in `section`, whatever its function.
    pub fn has_section_access(&self, section: &Section) -> bool {
        self.permissions.iter().any(|p| p.section() == section)
    }

    /// Functions granted within `section`, in order.
    pub fn functions_in(&self, section: &Section) -> Vec<Function> {
        self.permissions
            .iter()
            .filter(|p| p.section() == section)
            .map(|p| p.function().clone())
            .collect()
    }

    /// Consume the role, keeping only its permissions.
    pub fn into_permissions(self) -> Vec<Permission> {
        self.permissions.into_iter().collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
