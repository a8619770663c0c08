/// explicit, statically-typed projections handed to the transport layer;
/// each conversion is written out by hand, no reflective mapping engine
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::entities::{Fee, FeeType, Obligation, Payment, PaymentPlan, SchoolClass, Student};
use crate::types::{
    ClassId, FeeId, FeeTypeId, ObligationId, PaymentId, PaymentMethod, PlanId, StudentId, TenantId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassView {
    pub class_id: ClassId,
    pub tenant_id: TenantId,
    pub class_name: String,
}

impl From<&SchoolClass> for ClassView {
    fn from(class: &SchoolClass) -> Self {
        Self {
            class_id: class.class_id,
            tenant_id: class.tenant_id,
            class_name: class.class_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentView {
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub class_id: ClassId,
    pub class_name: String,
    pub contact_number: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
}

impl StudentView {
    pub fn new(student: &Student, class: &SchoolClass) -> Self {
        Self {
            student_id: student.student_id.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            class_id: student.class_id,
            class_name: class.class_name.clone(),
            contact_number: student.contact_number.clone(),
            date_of_birth: student.date_of_birth,
            address: student.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTypeView {
    pub fee_type_id: FeeTypeId,
    pub name: String,
}

impl From<&FeeType> for FeeTypeView {
    fn from(fee_type: &FeeType) -> Self {
        Self {
            fee_type_id: fee_type.fee_type_id,
            name: fee_type.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlanView {
    pub plan_id: PlanId,
    pub name: String,
    pub interval_months: i32,
}

impl From<&PaymentPlan> for PaymentPlanView {
    fn from(plan: &PaymentPlan) -> Self {
        Self {
            plan_id: plan.plan_id,
            name: plan.name.clone(),
            interval_months: plan.interval_months,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeView {
    pub fee_id: FeeId,
    pub class_name: String,
    pub fee_heading: String,
    pub plan_name: String,
    pub amount: Money,
}

impl FeeView {
    pub fn new(fee: &Fee, class: &SchoolClass, fee_type: &FeeType, plan: &PaymentPlan) -> Self {
        Self {
            fee_id: fee.fee_id,
            class_name: class.class_name.clone(),
            fee_heading: fee_type.name.clone(),
            plan_name: plan.name.clone(),
            amount: fee.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationView {
    pub obligation_id: ObligationId,
    pub student_id: StudentId,
    pub fee_id: FeeId,
    pub fee_heading: String,
    pub plan_name: String,
    pub total_amount: Money,
    pub updated_total_amount: Money,
    pub amount_per_period: Money,
    pub additional_fee: Money,
    pub discount: Money,
    pub effective_from: DateTime<Utc>,
}

impl ObligationView {
    pub fn new(obligation: &Obligation, fee_type: &FeeType, plan: &PaymentPlan) -> Self {
        Self {
            obligation_id: obligation.id,
            student_id: obligation.student_id.clone(),
            fee_id: obligation.fee_id,
            fee_heading: fee_type.name.clone(),
            plan_name: plan.name.clone(),
            total_amount: obligation.total_amount,
            updated_total_amount: obligation.updated_total_amount,
            amount_per_period: obligation.amount_per_period,
            additional_fee: obligation.additional_fee,
            discount: obligation.discount,
            effective_from: obligation.effective_from,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub payment_id: PaymentId,
    pub student_id: StudentId,
    pub fee_id: FeeId,
    pub amount_paid: Money,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub discount: Money,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            student_id: payment.student_id.clone(),
            fee_id: payment.fee_id,
            amount_paid: payment.amount_paid,
            payment_date: payment.payment_date,
            method: payment.method,
            discount: payment.discount,
        }
    }
}
