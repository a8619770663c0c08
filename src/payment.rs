use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::decimal::Money;
use crate::entities::Payment;
use crate::errors::{FeeError, Result};
use crate::events::{EventStore, FeeEvent};
use crate::store::StoreData;
use crate::types::{FeeId, PaymentMethod, StudentId, TenantId};

/// apply a payment against a student's obligation
///
/// covering the full balance removes the obligation from active tracking;
/// anything less reduces it in place; an immutable payment record is appended
/// either way, inside the caller's transaction
pub fn apply_payment(
    data: &mut StoreData,
    tenant_id: TenantId,
    student_id: &StudentId,
    fee_id: FeeId,
    amount_paid: Money,
    method: PaymentMethod,
    discount: Money,
    time: &SafeTimeProvider,
    events: &mut EventStore,
) -> Result<Payment> {
    if amount_paid.is_zero() || amount_paid.is_negative() {
        return Err(FeeError::InvalidPaymentAmount { amount: amount_paid });
    }

    let obligation = data
        .obligations
        .find_first(|o| o.tenant_id == tenant_id && o.student_id == *student_id && o.fee_id == fee_id)
        .ok_or_else(|| FeeError::ObligationNotFound {
            student_id: student_id.clone(),
            reference: format!("fee {fee_id}"),
        })?;

    if amount_paid >= obligation.total_amount {
        // fully settled
        data.obligations.delete_where(|o| o.id == obligation.id);
        events.emit(FeeEvent::ObligationSettled {
            obligation_id: obligation.id,
            student_id: student_id.clone(),
            amount_paid,
        });
    } else {
        let mut reduced = obligation.clone();
        reduced.total_amount = reduced.total_amount - amount_paid;
        let reduced = data.update_obligation(reduced)?;
        events.emit(FeeEvent::ObligationReduced {
            obligation_id: reduced.id,
            amount_paid,
            remaining: reduced.total_amount,
        });
    }

    let payment = Payment {
        id: Uuid::new_v4(),
        tenant_id,
        student_id: student_id.clone(),
        fee_id,
        amount_paid,
        payment_date: time.now(),
        method,
        discount,
    };
    data.payments.insert(payment.clone());
    events.emit(FeeEvent::PaymentRecorded {
        payment_id: payment.id,
        student_id: student_id.clone(),
        fee_id,
        amount: amount_paid,
        timestamp: payment.payment_date,
    });

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Obligation;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use hourglass_rs::TimeSource;

    fn seeded_store(total: i64) -> (MemoryStore, StudentId) {
        let student_id = StudentId::from("096700701001");
        let sid = student_id.clone();
        let mut store = MemoryStore::new();
        store
            .transaction(move |data| {
                data.obligations.insert(Obligation::new(
                    7,
                    sid,
                    1,
                    1,
                    Money::from_major(total),
                    Money::from_major(total),
                    Utc::now(),
                ));
                Ok(())
            })
            .unwrap();
        (store, student_id)
    }

    #[test]
    fn test_full_payment_settles_and_records() {
        let (mut store, student_id) = seeded_store(500);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        let payment = store
            .transaction(|data| {
                apply_payment(
                    data,
                    7,
                    &student_id,
                    1,
                    Money::from_major(500),
                    PaymentMethod::Cash,
                    Money::ZERO,
                    &time,
                    &mut events,
                )
            })
            .unwrap();

        assert!(store.data().obligations.is_empty());
        assert_eq!(store.data().payments.len(), 1);
        assert_eq!(payment.amount_paid, Money::from_major(500));
    }

    #[test]
    fn test_overpayment_also_settles() {
        let (mut store, student_id) = seeded_store(500);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        store
            .transaction(|data| {
                apply_payment(
                    data,
                    7,
                    &student_id,
                    1,
                    Money::from_major(600),
                    PaymentMethod::Online,
                    Money::ZERO,
                    &time,
                    &mut events,
                )
            })
            .unwrap();

        assert!(store.data().obligations.is_empty());
        assert_eq!(store.data().payments.len(), 1);
    }

    #[test]
    fn test_partial_payment_reduces_in_place() {
        let (mut store, student_id) = seeded_store(500);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        store
            .transaction(|data| {
                apply_payment(
                    data,
                    7,
                    &student_id,
                    1,
                    Money::from_major(200),
                    PaymentMethod::Card,
                    Money::ZERO,
                    &time,
                    &mut events,
                )
            })
            .unwrap();

        let ob = store
            .data()
            .obligations
            .find_first(|o| o.student_id == student_id)
            .unwrap();
        assert_eq!(ob.total_amount, Money::from_major(300));
        assert_eq!(ob.version, 1);
        assert_eq!(store.data().payments.len(), 1);
        let recorded = store.data().payments.find_first(|_| true).unwrap();
        assert_eq!(recorded.amount_paid, Money::from_major(200));
    }

    #[test]
    fn test_payment_history_accumulates() {
        let (mut store, student_id) = seeded_store(500);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        for amount in [100, 100, 300] {
            store
                .transaction(|data| {
                    apply_payment(
                        data,
                        7,
                        &student_id,
                        1,
                        Money::from_major(amount),
                        PaymentMethod::Cash,
                        Money::ZERO,
                        &time,
                        &mut events,
                    )
                })
                .unwrap();
        }

        // final installment settled the obligation, every payment kept
        assert!(store.data().obligations.is_empty());
        assert_eq!(store.data().payments.len(), 3);
    }

    #[test]
    fn test_missing_obligation() {
        let (mut store, _student_id) = seeded_store(500);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();
        let ghost = StudentId::from("096700701099");

        let err = store
            .transaction(|data| {
                apply_payment(
                    data,
                    7,
                    &ghost,
                    1,
                    Money::from_major(100),
                    PaymentMethod::Cash,
                    Money::ZERO,
                    &time,
                    &mut events,
                )
            })
            .unwrap_err();
        assert!(matches!(err, FeeError::ObligationNotFound { .. }));
        // no payment record on the failed path
        assert!(store.data().payments.is_empty());
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let (mut store, student_id) = seeded_store(500);
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();

        for amount in [Money::ZERO, Money::from_major(-50)] {
            let err = store
                .transaction(|data| {
                    apply_payment(
                        data,
                        7,
                        &student_id,
                        1,
                        amount,
                        PaymentMethod::Cash,
                        Money::ZERO,
                        &time,
                        &mut events,
                    )
                })
                .unwrap_err();
            assert!(matches!(err, FeeError::InvalidPaymentAmount { .. }));
        }
    }
}
