use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Money;
use crate::entities::{Fee, Obligation};
use crate::errors::{FeeError, Result};
use crate::events::{EventStore, FeeEvent};
use crate::interval;
use crate::store::StoreData;
use crate::types::{ClassId, FeeId, PlanId, ReferenceKind, StudentId, TenantId};

/// request shape for a new fee definition
#[derive(Debug, Clone)]
pub struct FeeDefinition {
    pub class_name: String,
    pub fee_type_name: String,
    pub plan_name: String,
    pub amount: Money,
}

/// define a fee on a class and raise one obligation per enrolled student
///
/// runs inside the caller's transaction: a bad plan interval or a broken
/// obligation mid-loop rolls back the fee and every obligation written so far
pub fn allocate_fee(
    data: &mut StoreData,
    tenant_id: TenantId,
    definition: &FeeDefinition,
    time: &SafeTimeProvider,
    events: &mut EventStore,
) -> Result<Fee> {
    let class = data
        .classes
        .find_first(|c| c.tenant_id == tenant_id && c.class_name == definition.class_name)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::Class,
            key: definition.class_name.clone(),
        })?;

    let normalized_type = definition.fee_type_name.to_uppercase();
    let fee_type = data
        .fee_types
        .find_first(|ft| ft.tenant_id == tenant_id && ft.normalized_name == normalized_type)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::FeeType,
            key: definition.fee_type_name.clone(),
        })?;

    let normalized_plan = definition.plan_name.to_uppercase();
    let plan = data
        .payment_plans
        .find_first(|p| p.tenant_id == tenant_id && p.normalized_name == normalized_plan)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::PaymentPlan,
            key: definition.plan_name.clone(),
        })?;

    // reject a bad interval before any row is written
    let amount_per_period = interval::per_period_amount(definition.amount, plan.interval_months)?;

    let fee = Fee {
        fee_id: data.allocate_fee_id(),
        tenant_id,
        class_id: class.class_id,
        fee_type_id: fee_type.fee_type_id,
        plan_id: plan.plan_id,
        amount: definition.amount,
    };
    data.fees.insert(fee.clone());
    events.emit(FeeEvent::FeeDefined {
        tenant_id,
        fee_id: fee.fee_id,
        class_id: class.class_id,
        amount: fee.amount,
    });

    let students = data
        .students
        .find_all(|s| s.tenant_id == tenant_id && s.class_id == class.class_id);
    let now = time.now();

    for student in students {
        let obligation = build_obligation(
            tenant_id,
            student.student_id.clone(),
            fee.fee_id,
            plan.plan_id,
            fee.amount,
            amount_per_period,
            now,
        )?;
        events.emit(FeeEvent::ObligationCreated {
            tenant_id,
            obligation_id: obligation.id,
            student_id: obligation.student_id.clone(),
            fee_id: fee.fee_id,
            amount_per_period,
        });
        data.obligations.insert(obligation);
    }

    Ok(fee)
}

/// raise obligations on a newly enrolled student for every fee already
/// defined on their class; the mirror image of `allocate_fee`
pub fn allocate_existing_fees(
    data: &mut StoreData,
    tenant_id: TenantId,
    student_id: &StudentId,
    class_id: ClassId,
    time: &SafeTimeProvider,
    events: &mut EventStore,
) -> Result<usize> {
    let fees = data
        .fees
        .find_all(|f| f.tenant_id == tenant_id && f.class_id == class_id);
    let now = time.now();
    let mut created = 0;

    for fee in fees {
        let plan = data
            .payment_plans
            .find_first(|p| p.plan_id == fee.plan_id)
            .ok_or_else(|| FeeError::ReferenceNotFound {
                kind: ReferenceKind::PaymentPlan,
                key: fee.plan_id.to_string(),
            })?;

        let amount_per_period = interval::per_period_amount(fee.amount, plan.interval_months)?;
        let obligation = build_obligation(
            tenant_id,
            student_id.clone(),
            fee.fee_id,
            fee.plan_id,
            fee.amount,
            amount_per_period,
            now,
        )?;
        events.emit(FeeEvent::ObligationCreated {
            tenant_id,
            obligation_id: obligation.id,
            student_id: student_id.clone(),
            fee_id: fee.fee_id,
            amount_per_period,
        });
        data.obligations.insert(obligation);
        created += 1;
    }

    Ok(created)
}

/// both allocation paths produce the same obligation shape
fn build_obligation(
    tenant_id: TenantId,
    student_id: StudentId,
    fee_id: FeeId,
    plan_id: PlanId,
    total: Money,
    amount_per_period: Money,
    now: DateTime<Utc>,
) -> Result<Obligation> {
    if student_id.as_str().is_empty() || fee_id == 0 || plan_id == 0 {
        tracing::error!(%student_id, fee_id, plan_id, "missing key while building obligation");
        return Err(FeeError::InvalidObligationState {
            message: "student, fee, and plan keys are all required".to_string(),
        });
    }

    Ok(Obligation::new(
        tenant_id,
        student_id,
        fee_id,
        plan_id,
        total,
        amount_per_period,
        now,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FeeType, PaymentPlan, SchoolClass, Student};
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, Utc};
    use hourglass_rs::TimeSource;

    fn student(id: &str, tenant_id: TenantId, class_id: ClassId, contact: &str) -> Student {
        Student {
            student_id: StudentId::from(id),
            tenant_id,
            class_id,
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            contact_number: contact.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2014, 5, 20).unwrap(),
            address: "12 Lake Road".to_string(),
        }
    }

    fn seeded_store(interval_months: i32) -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .transaction(|data| {
                data.classes.insert(SchoolClass {
                    class_id: 701,
                    tenant_id: 7,
                    class_name: "Grade 1".to_string(),
                });
                data.fee_types.insert(FeeType::new(1, 7, "Tuition"));
                data.payment_plans
                    .insert(PaymentPlan::new(1, 7, "Quarterly", interval_months));
                data.students.insert(student("096700701001", 7, 701, "555-0001"));
                data.students.insert(student("096700701002", 7, 701, "555-0002"));
                data.students.insert(student("096700701003", 7, 701, "555-0003"));
                Ok(())
            })
            .unwrap();
        store
    }

    fn definition(amount: i64) -> FeeDefinition {
        FeeDefinition {
            class_name: "Grade 1".to_string(),
            fee_type_name: "Tuition".to_string(),
            plan_name: "Quarterly".to_string(),
            amount: Money::from_major(amount),
        }
    }

    #[test]
    fn test_one_obligation_per_student() {
        let mut store = seeded_store(3);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        let fee = store
            .transaction(|data| allocate_fee(data, 7, &definition(1200), &time, &mut events))
            .unwrap();

        let obligations = store.data().obligations.find_all(|o| o.fee_id == fee.fee_id);
        assert_eq!(obligations.len(), 3);
        for ob in &obligations {
            assert_eq!(ob.total_amount, Money::from_major(1200));
            assert_eq!(ob.updated_total_amount, Money::from_major(1200));
            // quarterly: 1200 over 4 periods
            assert_eq!(ob.amount_per_period, Money::from_major(300));
        }
    }

    #[test]
    fn test_missing_references_named() {
        let mut store = seeded_store(3);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        let mut bad = definition(1200);
        bad.class_name = "Grade 9".to_string();
        let err = store
            .transaction(|data| allocate_fee(data, 7, &bad, &time, &mut events))
            .unwrap_err();
        assert!(matches!(
            err,
            FeeError::ReferenceNotFound { kind: ReferenceKind::Class, .. }
        ));

        let mut bad = definition(1200);
        bad.fee_type_name = "Transport".to_string();
        let err = store
            .transaction(|data| allocate_fee(data, 7, &bad, &time, &mut events))
            .unwrap_err();
        assert!(matches!(
            err,
            FeeError::ReferenceNotFound { kind: ReferenceKind::FeeType, .. }
        ));

        let mut bad = definition(1200);
        bad.plan_name = "Weekly".to_string();
        let err = store
            .transaction(|data| allocate_fee(data, 7, &bad, &time, &mut events))
            .unwrap_err();
        assert!(matches!(
            err,
            FeeError::ReferenceNotFound { kind: ReferenceKind::PaymentPlan, .. }
        ));
    }

    #[test]
    fn test_tenant_isolation() {
        let mut store = seeded_store(3);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        // same names exist only under tenant 7
        let err = store
            .transaction(|data| allocate_fee(data, 8, &definition(1200), &time, &mut events))
            .unwrap_err();
        assert!(matches!(err, FeeError::ReferenceNotFound { .. }));
    }

    #[test]
    fn test_unsupported_interval_leaves_nothing_behind() {
        let mut store = seeded_store(6);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        let err = store
            .transaction(|data| allocate_fee(data, 7, &definition(1200), &time, &mut events))
            .unwrap_err();
        assert!(matches!(err, FeeError::UnsupportedInterval { months: 6 }));
        assert!(store.data().fees.is_empty());
        assert!(store.data().obligations.is_empty());
    }

    #[test]
    fn test_new_student_picks_up_existing_fees() {
        let mut store = seeded_store(3);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        store
            .transaction(|data| allocate_fee(data, 7, &definition(1200), &time, &mut events))
            .unwrap();

        let new_id = StudentId::from("096700701004");
        let created = store
            .transaction(|data| {
                data.students.insert(student("096700701004", 7, 701, "555-0004"));
                allocate_existing_fees(data, 7, &new_id, 701, &time, &mut events)
            })
            .unwrap();
        assert_eq!(created, 1);

        let ob = store
            .data()
            .obligations
            .find_first(|o| o.student_id == new_id)
            .unwrap();
        // same shape as the fee-first path
        assert_eq!(ob.total_amount, Money::from_major(1200));
        assert_eq!(ob.updated_total_amount, Money::from_major(1200));
        assert_eq!(ob.amount_per_period, Money::from_major(300));
    }

    #[test]
    fn test_missing_keys_rejected() {
        let err = build_obligation(
            7,
            StudentId::from(""),
            1,
            1,
            Money::from_major(100),
            Money::from_major(100),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FeeError::InvalidObligationState { .. }));

        let err = build_obligation(
            7,
            StudentId::from("096700701001"),
            0,
            1,
            Money::from_major(100),
            Money::from_major(100),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FeeError::InvalidObligationState { .. }));
    }
}
