pub mod allocation;
pub mod config;
pub mod decimal;
pub mod entities;
pub mod errors;
pub mod events;
pub mod ids;
pub mod interval;
pub mod payment;
pub mod recalculation;
pub mod service;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use allocation::FeeDefinition;
pub use config::EngineConfig;
pub use decimal::Money;
pub use errors::{FeeError, Result};
pub use events::{EventStore, FeeEvent};
pub use service::{FeeService, NewStudent, StudentUpdate};
pub use store::{MemoryStore, StoreData, Table};
pub use types::{
    ClassId, FeeId, FeeTypeId, ObligationId, PaymentId, PaymentMethod, PlanId, ReferenceKind,
    StudentId, TenantId, TenantScope,
};
pub use views::{
    ClassView, FeeTypeView, FeeView, ObligationView, PaymentPlanView, PaymentView, StudentView,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
