use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::entities::Obligation;
use crate::errors::{FeeError, Result};
use crate::events::{EventStore, FeeEvent};
use crate::interval;
use crate::store::StoreData;
use crate::types::{FeeId, ReferenceKind, StudentId, TenantId};

/// re-derive an obligation's totals after a surcharge or discount change
///
/// the obligation is located by (student, fee heading); the update is a pure
/// function of the original total and the new inputs, so repeating it with the
/// same inputs is a no-op on the amounts
pub fn recalculate(
    data: &mut StoreData,
    tenant_id: TenantId,
    student_id: &StudentId,
    fee_heading: &str,
    additional_fee: Money,
    discount: Money,
    events: &mut EventStore,
) -> Result<Obligation> {
    let normalized = fee_heading.to_uppercase();
    let fee_type = data
        .fee_types
        .find_first(|ft| ft.tenant_id == tenant_id && ft.normalized_name == normalized)
        .ok_or_else(|| FeeError::ObligationNotFound {
            student_id: student_id.clone(),
            reference: fee_heading.to_string(),
        })?;

    let fee_ids: Vec<FeeId> = data
        .fees
        .find_all(|f| f.tenant_id == tenant_id && f.fee_type_id == fee_type.fee_type_id)
        .into_iter()
        .map(|f| f.fee_id)
        .collect();

    let mut obligation = data
        .obligations
        .find_first(|o| o.student_id == *student_id && fee_ids.contains(&o.fee_id))
        .ok_or_else(|| FeeError::ObligationNotFound {
            student_id: student_id.clone(),
            reference: fee_heading.to_string(),
        })?;

    let plan = data
        .payment_plans
        .find_first(|p| p.plan_id == obligation.plan_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::PaymentPlan,
            key: obligation.plan_id.to_string(),
        })?;
    let periods = interval::periods_per_year(plan.interval_months)?;

    obligation.additional_fee = additional_fee;
    obligation.discount = discount;
    // always derived from the original total, never accumulated; a discount
    // larger than the total leaves a negative balance, which is permitted
    obligation.updated_total_amount = obligation.total_amount + additional_fee - discount;
    obligation.amount_per_period = obligation.updated_total_amount / Decimal::from(periods);

    let obligation = data.update_obligation(obligation)?;
    events.emit(FeeEvent::ObligationRecalculated {
        obligation_id: obligation.id,
        updated_total: obligation.updated_total_amount,
        amount_per_period: obligation.amount_per_period,
    });

    Ok(obligation)
}
