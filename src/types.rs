use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// opaque numeric scope identifier for one school
pub type TenantId = i32;

/// tenant-scoped sequential class identifier, format {tenant}{seq:2 digits}
pub type ClassId = i32;

/// fee definition identifier
pub type FeeId = i32;

/// fee type identifier
pub type FeeTypeId = i32;

/// payment plan identifier
pub type PlanId = i32;

/// unique identifier for an obligation record
pub type ObligationId = Uuid;

/// unique identifier for a payment record
pub type PaymentId = Uuid;

/// structured 12-character student identifier:
/// 4-digit literal prefix + 3-digit tenant + 2-digit class sequence + 3-digit sequence
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(raw: impl Into<String>) -> Self {
        StudentId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// trailing 3-digit sequence, if parseable
    pub fn sequence(&self) -> Option<u32> {
        let len = self.0.len();
        if len < 3 {
            return None;
        }
        self.0[len - 3..].parse().ok()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StudentId {
    fn from(s: &str) -> Self {
        StudentId(s.to_string())
    }
}

impl From<String> for StudentId {
    fn from(s: String) -> Self {
        StudentId(s)
    }
}

/// read scope: an explicit tenant, or all tenants when no session tenant exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    All,
    Tenant(TenantId),
}

impl TenantScope {
    /// absent session tenant means the cross-tenant aggregate view
    pub fn from_session(tenant: Option<TenantId>) -> Self {
        match tenant {
            Some(id) => TenantScope::Tenant(id),
            None => TenantScope::All,
        }
    }

    pub fn matches(&self, tenant: TenantId) -> bool {
        match self {
            TenantScope::All => true,
            TenantScope::Tenant(id) => *id == tenant,
        }
    }
}

/// how a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Cheque,
    Online,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Online => "online",
        };
        write!(f, "{name}")
    }
}

/// which referenced entity was missing in tenant scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    Class,
    FeeType,
    PaymentPlan,
    Student,
    Fee,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Class => "class",
            ReferenceKind::FeeType => "fee type",
            ReferenceKind::PaymentPlan => "payment plan",
            ReferenceKind::Student => "student",
            ReferenceKind::Fee => "fee",
        };
        write!(f, "{name}")
    }
}
