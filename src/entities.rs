use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    ClassId, FeeId, FeeTypeId, ObligationId, PaymentId, PaymentMethod, PlanId, StudentId, TenantId,
};

/// tenant-scoped group of students
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub class_id: ClassId,
    pub tenant_id: TenantId,
    pub class_name: String,
}

/// enrolled student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: StudentId,
    pub tenant_id: TenantId,
    pub class_id: ClassId,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
}

/// tenant-scoped fee category, e.g. "Tuition"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeType {
    pub fee_type_id: FeeTypeId,
    pub tenant_id: TenantId,
    pub name: String,
    /// uppercased for case-insensitive lookup
    pub normalized_name: String,
}

impl FeeType {
    pub fn new(fee_type_id: FeeTypeId, tenant_id: TenantId, name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = name.to_uppercase();
        Self {
            fee_type_id,
            tenant_id,
            name,
            normalized_name,
        }
    }
}

/// tenant-scoped payment cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub plan_id: PlanId,
    pub tenant_id: TenantId,
    pub name: String,
    /// uppercased for case-insensitive lookup
    pub normalized_name: String,
    /// cadence in months: 1 monthly, 3 quarterly, 12 yearly
    pub interval_months: i32,
}

impl PaymentPlan {
    pub fn new(
        plan_id: PlanId,
        tenant_id: TenantId,
        name: impl Into<String>,
        interval_months: i32,
    ) -> Self {
        let name = name.into();
        let normalized_name = name.to_uppercase();
        Self {
            plan_id,
            tenant_id,
            name,
            normalized_name,
            interval_months,
        }
    }
}

/// fee definition binding a fee type, a class, and a payment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub fee_id: FeeId,
    pub tenant_id: TenantId,
    pub class_id: ClassId,
    pub fee_type_id: FeeTypeId,
    pub plan_id: PlanId,
    pub amount: Money,
}

/// per-student instance of a fee, the unit the payment and recalculation
/// engines operate on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub tenant_id: TenantId,
    pub student_id: StudentId,
    pub fee_id: FeeId,
    pub plan_id: PlanId,
    /// original amount owed, reduced by partial payments
    pub total_amount: Money,
    /// total after surcharge and discount adjustments
    pub updated_total_amount: Money,
    pub amount_per_period: Money,
    pub additional_fee: Money,
    pub discount: Money,
    pub effective_from: DateTime<Utc>,
    /// optimistic concurrency counter, bumped on every persisted write
    pub version: u64,
}

impl Obligation {
    pub fn new(
        tenant_id: TenantId,
        student_id: StudentId,
        fee_id: FeeId,
        plan_id: PlanId,
        total_amount: Money,
        amount_per_period: Money,
        effective_from: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            student_id,
            fee_id,
            plan_id,
            total_amount,
            updated_total_amount: total_amount,
            amount_per_period,
            additional_fee: Money::ZERO,
            discount: Money::ZERO,
            effective_from,
            version: 0,
        }
    }
}

/// immutable record of a payment event, never mutated or deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub student_id: StudentId,
    pub fee_id: FeeId,
    pub amount_paid: Money,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub discount: Money,
}
