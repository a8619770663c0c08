use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ClassId, FeeId, ObligationId, PaymentId, StudentId, TenantId};

/// all events that can be emitted by the fee engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeeEvent {
    // definition events
    FeeDefined {
        tenant_id: TenantId,
        fee_id: FeeId,
        class_id: ClassId,
        amount: Money,
    },

    // obligation events
    ObligationCreated {
        tenant_id: TenantId,
        obligation_id: ObligationId,
        student_id: StudentId,
        fee_id: FeeId,
        amount_per_period: Money,
    },
    ObligationRecalculated {
        obligation_id: ObligationId,
        updated_total: Money,
        amount_per_period: Money,
    },
    ObligationReduced {
        obligation_id: ObligationId,
        amount_paid: Money,
        remaining: Money,
    },
    ObligationSettled {
        obligation_id: ObligationId,
        student_id: StudentId,
        amount_paid: Money,
    },

    // payment events
    PaymentRecorded {
        payment_id: PaymentId,
        student_id: StudentId,
        fee_id: FeeId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // enrollment events
    StudentEnrolled {
        tenant_id: TenantId,
        student_id: StudentId,
        class_id: ClassId,
    },
    StudentRemoved {
        tenant_id: TenantId,
        student_id: StudentId,
    },
    ClassCreated {
        tenant_id: TenantId,
        class_id: ClassId,
    },
    ClassRemoved {
        tenant_id: TenantId,
        class_id: ClassId,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<FeeEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: FeeEvent) {
        self.events.push(event);
    }

    /// move every event out of `other` onto the end of this store
    pub fn append(&mut self, other: &mut EventStore) {
        self.events.append(&mut other.events);
    }

    pub fn take_events(&mut self) -> Vec<FeeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[FeeEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
