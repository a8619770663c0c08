use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;

use crate::allocation::{self, FeeDefinition};
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::entities::{FeeType, Obligation, PaymentPlan, SchoolClass, Student};
use crate::errors::{FeeError, Result};
use crate::events::{EventStore, FeeEvent};
use crate::ids;
use crate::payment;
use crate::recalculation;
use crate::store::{MemoryStore, StoreData};
use crate::types::{
    ClassId, FeeId, FeeTypeId, PaymentMethod, PlanId, ReferenceKind, StudentId, TenantId,
    TenantScope,
};
use crate::views::{
    ClassView, FeeTypeView, FeeView, ObligationView, PaymentPlanView, PaymentView, StudentView,
};

/// request shape for enrolling a student
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub class_id: ClassId,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
}

/// request shape for editing a student's own details
#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub address: String,
}

/// application service facade over the fee engines
///
/// every operation takes the tenant explicitly; there is no ambient session.
/// multi-entity operations run inside one store transaction so partial state
/// is never committed; domain events are staged per operation and kept only
/// when that transaction commits.
pub struct FeeService {
    store: MemoryStore,
    config: EngineConfig,
    events: EventStore,
}

impl FeeService {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_store(config, MemoryStore::new())
    }

    pub fn with_store(config: EngineConfig, store: MemoryStore) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            events: EventStore::new(),
        })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// drain the events collected since the last call
    pub fn take_events(&mut self) -> Vec<FeeEvent> {
        self.events.take_events()
    }

    // ---- class management ----

    pub fn create_class(&mut self, tenant_id: TenantId, class_name: &str) -> Result<ClassView> {
        let mut staged = EventStore::new();
        let events = &mut staged;
        let name = class_name.to_string();
        let class = self.store.transaction(move |data| {
            if data
                .classes
                .any(|c| c.tenant_id == tenant_id && c.class_name == name)
            {
                return Err(FeeError::DuplicateClassName { name });
            }

            let max_id = data
                .classes
                .find_all(|c| c.tenant_id == tenant_id)
                .into_iter()
                .map(|c| c.class_id)
                .max();
            let class = SchoolClass {
                class_id: ids::next_class_id(tenant_id, max_id)?,
                tenant_id,
                class_name: name,
            };
            data.classes.insert(class.clone());
            events.emit(FeeEvent::ClassCreated {
                tenant_id,
                class_id: class.class_id,
            });
            Ok(class)
        })?;
        self.events.append(&mut staged);
        Ok(ClassView::from(&class))
    }

    pub fn get_class(&self, tenant_id: TenantId, class_id: ClassId) -> Result<ClassView> {
        let class = find_class(self.store.data(), tenant_id, class_id)?;
        Ok(ClassView::from(&class))
    }

    pub fn list_classes(&self, tenant_id: TenantId) -> Vec<ClassView> {
        self.store
            .data()
            .classes
            .find_all(|c| c.tenant_id == tenant_id)
            .iter()
            .map(ClassView::from)
            .collect()
    }

    pub fn rename_class(
        &mut self,
        tenant_id: TenantId,
        class_id: ClassId,
        new_name: &str,
    ) -> Result<ClassView> {
        let name = new_name.to_string();
        let class = self.store.transaction(move |data| {
            if data
                .classes
                .any(|c| c.tenant_id == tenant_id && c.class_name == name && c.class_id != class_id)
            {
                return Err(FeeError::DuplicateClassName { name });
            }

            let mut class = find_class(data, tenant_id, class_id)?;
            class.class_name = name;
            data.classes
                .update_first(|c| c.class_id == class_id, class.clone());
            Ok(class)
        })?;
        Ok(ClassView::from(&class))
    }

    /// a class cannot be deleted while any student still references it
    pub fn delete_class(&mut self, tenant_id: TenantId, class_id: ClassId) -> Result<()> {
        let mut staged = EventStore::new();
        let events = &mut staged;
        self.store.transaction(move |data| {
            let class = find_class(data, tenant_id, class_id)?;
            let enrolled = data
                .students
                .count(|s| s.tenant_id == tenant_id && s.class_id == class_id);
            if enrolled > 0 {
                tracing::warn!(tenant_id, class_id, enrolled, "blocked class deletion");
                return Err(FeeError::ClassNotEmpty { class_id });
            }

            data.classes.delete_where(|c| c.class_id == class.class_id);
            events.emit(FeeEvent::ClassRemoved {
                tenant_id,
                class_id,
            });
            Ok(())
        })?;
        self.events.append(&mut staged);
        Ok(())
    }

    // ---- fee type management ----

    pub fn create_fee_type(&mut self, tenant_id: TenantId, name: &str) -> Result<FeeTypeView> {
        let name = name.to_string();
        let fee_type = self.store.transaction(move |data| {
            let fee_type = FeeType::new(data.allocate_fee_type_id(), tenant_id, name);
            data.fee_types.insert(fee_type.clone());
            Ok(fee_type)
        })?;
        Ok(FeeTypeView::from(&fee_type))
    }

    pub fn update_fee_type(
        &mut self,
        tenant_id: TenantId,
        fee_type_id: FeeTypeId,
        name: &str,
    ) -> Result<FeeTypeView> {
        let name = name.to_string();
        let fee_type = self.store.transaction(move |data| {
            let mut fee_type = data
                .fee_types
                .find_first(|ft| ft.tenant_id == tenant_id && ft.fee_type_id == fee_type_id)
                .ok_or_else(|| FeeError::ReferenceNotFound {
                    kind: ReferenceKind::FeeType,
                    key: fee_type_id.to_string(),
                })?;
            fee_type.normalized_name = name.to_uppercase();
            fee_type.name = name;
            data.fee_types
                .update_first(|ft| ft.fee_type_id == fee_type_id, fee_type.clone());
            Ok(fee_type)
        })?;
        Ok(FeeTypeView::from(&fee_type))
    }

    pub fn delete_fee_type(&mut self, tenant_id: TenantId, fee_type_id: FeeTypeId) -> Result<()> {
        self.store.transaction(move |data| {
            let removed = data
                .fee_types
                .delete_where(|ft| ft.tenant_id == tenant_id && ft.fee_type_id == fee_type_id);
            if removed == 0 {
                return Err(FeeError::ReferenceNotFound {
                    kind: ReferenceKind::FeeType,
                    key: fee_type_id.to_string(),
                });
            }
            Ok(())
        })
    }

    pub fn list_fee_types(&self, tenant_id: TenantId) -> Vec<FeeTypeView> {
        self.store
            .data()
            .fee_types
            .find_all(|ft| ft.tenant_id == tenant_id)
            .iter()
            .map(FeeTypeView::from)
            .collect()
    }

    // ---- payment plan management ----

    pub fn create_payment_plan(
        &mut self,
        tenant_id: TenantId,
        name: &str,
        interval_months: i32,
    ) -> Result<PaymentPlanView> {
        let name = name.to_string();
        let plan = self.store.transaction(move |data| {
            let plan = PaymentPlan::new(data.allocate_plan_id(), tenant_id, name, interval_months);
            data.payment_plans.insert(plan.clone());
            Ok(plan)
        })?;
        Ok(PaymentPlanView::from(&plan))
    }

    pub fn update_payment_plan(
        &mut self,
        tenant_id: TenantId,
        plan_id: PlanId,
        name: &str,
    ) -> Result<PaymentPlanView> {
        let name = name.to_string();
        let plan = self.store.transaction(move |data| {
            let mut plan = data
                .payment_plans
                .find_first(|p| p.tenant_id == tenant_id && p.plan_id == plan_id)
                .ok_or_else(|| FeeError::ReferenceNotFound {
                    kind: ReferenceKind::PaymentPlan,
                    key: plan_id.to_string(),
                })?;
            plan.normalized_name = name.to_uppercase();
            plan.name = name;
            data.payment_plans
                .update_first(|p| p.plan_id == plan_id, plan.clone());
            Ok(plan)
        })?;
        Ok(PaymentPlanView::from(&plan))
    }

    /// a plan cannot be deleted while any fee still references it; a dangling
    /// plan would make every later enrollment in the class fail
    pub fn delete_payment_plan(&mut self, tenant_id: TenantId, plan_id: PlanId) -> Result<()> {
        self.store.transaction(move |data| {
            if data
                .fees
                .any(|f| f.tenant_id == tenant_id && f.plan_id == plan_id)
            {
                tracing::warn!(tenant_id, plan_id, "blocked plan deletion, fees reference it");
                return Err(FeeError::PlanInUse { plan_id });
            }

            let removed = data
                .payment_plans
                .delete_where(|p| p.tenant_id == tenant_id && p.plan_id == plan_id);
            if removed == 0 {
                return Err(FeeError::ReferenceNotFound {
                    kind: ReferenceKind::PaymentPlan,
                    key: plan_id.to_string(),
                });
            }
            Ok(())
        })
    }

    pub fn list_payment_plans(&self, tenant_id: TenantId) -> Vec<PaymentPlanView> {
        self.store
            .data()
            .payment_plans
            .find_all(|p| p.tenant_id == tenant_id)
            .iter()
            .map(PaymentPlanView::from)
            .collect()
    }

    // ---- fee definitions ----

    /// define a fee and allocate it to every student in the class, atomically
    pub fn create_fee_definition(
        &mut self,
        tenant_id: TenantId,
        definition: FeeDefinition,
        time: &SafeTimeProvider,
    ) -> Result<FeeView> {
        let mut staged = EventStore::new();
        let events = &mut staged;
        let fee = self
            .store
            .transaction(|data| allocation::allocate_fee(data, tenant_id, &definition, time, events))?;
        self.events.append(&mut staged);
        fee_view(self.store.data(), tenant_id, fee.fee_id)
    }

    pub fn get_fee(&self, tenant_id: TenantId, fee_id: FeeId) -> Result<FeeView> {
        fee_view(self.store.data(), tenant_id, fee_id)
    }

    pub fn list_fees(&self, tenant_id: TenantId) -> Result<Vec<FeeView>> {
        self.store
            .data()
            .fees
            .find_all(|f| f.tenant_id == tenant_id)
            .iter()
            .map(|f| fee_view(self.store.data(), tenant_id, f.fee_id))
            .collect()
    }

    pub fn delete_fee(&mut self, tenant_id: TenantId, fee_id: FeeId) -> Result<()> {
        self.store.transaction(move |data| {
            let removed = data
                .fees
                .delete_where(|f| f.tenant_id == tenant_id && f.fee_id == fee_id);
            if removed == 0 {
                return Err(FeeError::ReferenceNotFound {
                    kind: ReferenceKind::Fee,
                    key: fee_id.to_string(),
                });
            }
            Ok(())
        })
    }

    // ---- student management ----

    /// enroll a student: generated identifier, duplicate-contact guard, and
    /// allocation of every fee already defined on the class, in one transaction
    pub fn create_student(
        &mut self,
        tenant_id: TenantId,
        input: NewStudent,
        time: &SafeTimeProvider,
    ) -> Result<StudentView> {
        let config = self.config.clone();
        let mut staged = EventStore::new();
        let events = &mut staged;
        let student = self.store.transaction(move |data| {
            if data
                .students
                .any(|s| s.tenant_id == tenant_id && s.contact_number == input.contact_number)
            {
                return Err(FeeError::DuplicateContact {
                    number: input.contact_number,
                });
            }

            let class = find_class(data, tenant_id, input.class_id)?;

            let max_id = data
                .students
                .find_all(|s| s.tenant_id == tenant_id && s.class_id == class.class_id)
                .into_iter()
                .map(|s| s.student_id)
                .max();
            let student_id =
                ids::next_student_id(&config, tenant_id, class.class_id, max_id.as_ref())?;

            let student = Student {
                student_id: student_id.clone(),
                tenant_id,
                class_id: class.class_id,
                first_name: input.first_name,
                last_name: input.last_name,
                contact_number: input.contact_number,
                date_of_birth: input.date_of_birth,
                address: input.address,
            };
            data.students.insert(student.clone());
            events.emit(FeeEvent::StudentEnrolled {
                tenant_id,
                student_id: student_id.clone(),
                class_id: class.class_id,
            });

            allocation::allocate_existing_fees(data, tenant_id, &student_id, class.class_id, time, events)?;
            Ok(student)
        })?;
        self.events.append(&mut staged);
        student_view(self.store.data(), &student)
    }

    pub fn get_student(&self, tenant_id: TenantId, student_id: &StudentId) -> Result<StudentView> {
        let student = find_student(self.store.data(), tenant_id, student_id)?;
        student_view(self.store.data(), &student)
    }

    /// list students; `TenantScope::All` is the cross-tenant aggregate read
    /// used when no session tenant exists
    pub fn list_students(&self, scope: TenantScope) -> Result<Vec<StudentView>> {
        self.store
            .data()
            .students
            .find_all(|s| scope.matches(s.tenant_id))
            .iter()
            .map(|s| student_view(self.store.data(), s))
            .collect()
    }

    pub fn update_student(
        &mut self,
        tenant_id: TenantId,
        input: StudentUpdate,
    ) -> Result<StudentView> {
        let student = self.store.transaction(move |data| {
            let mut student = find_student(data, tenant_id, &input.student_id)?;

            if data.students.any(|s| {
                s.tenant_id == tenant_id
                    && s.contact_number == input.contact_number
                    && s.student_id != input.student_id
            }) {
                return Err(FeeError::DuplicateContact {
                    number: input.contact_number,
                });
            }

            student.first_name = input.first_name;
            student.last_name = input.last_name;
            student.contact_number = input.contact_number;
            student.address = input.address;
            data.students
                .update_first(|s| s.student_id == input.student_id, student.clone());
            Ok(student)
        })?;
        student_view(self.store.data(), &student)
    }

    /// a student cannot be deleted while any obligation still references them
    pub fn delete_student(&mut self, tenant_id: TenantId, student_id: &StudentId) -> Result<()> {
        let mut staged = EventStore::new();
        let events = &mut staged;
        let student_id = student_id.clone();
        self.store.transaction(move |data| {
            find_student(data, tenant_id, &student_id)?;

            if data.obligations.any(|o| o.student_id == student_id) {
                tracing::warn!(%student_id, "blocked student deletion, obligations remain");
                return Err(FeeError::StudentHasObligations { student_id });
            }

            data.students.delete_where(|s| s.student_id == student_id);
            events.emit(FeeEvent::StudentRemoved {
                tenant_id,
                student_id,
            });
            Ok(())
        })?;
        self.events.append(&mut staged);
        Ok(())
    }

    /// every open obligation carried by a student
    pub fn fees_for_student(
        &self,
        tenant_id: TenantId,
        student_id: &StudentId,
    ) -> Result<Vec<ObligationView>> {
        let data = self.store.data();
        find_student(data, tenant_id, student_id)?;

        data.obligations
            .find_all(|o| o.tenant_id == tenant_id && o.student_id == *student_id)
            .iter()
            .map(|o| obligation_view(data, o))
            .collect()
    }

    // ---- obligation and payment engines ----

    pub fn recalculate_obligation(
        &mut self,
        tenant_id: TenantId,
        student_id: &StudentId,
        fee_heading: &str,
        additional_fee: Money,
        discount: Money,
    ) -> Result<ObligationView> {
        let mut staged = EventStore::new();
        let events = &mut staged;
        let obligation = self.store.transaction(|data| {
            recalculation::recalculate(
                data,
                tenant_id,
                student_id,
                fee_heading,
                additional_fee,
                discount,
                events,
            )
        })?;
        self.events.append(&mut staged);
        obligation_view(self.store.data(), &obligation)
    }

    pub fn apply_payment(
        &mut self,
        tenant_id: TenantId,
        student_id: &StudentId,
        fee_id: FeeId,
        amount_paid: Money,
        method: PaymentMethod,
        discount: Money,
        time: &SafeTimeProvider,
    ) -> Result<PaymentView> {
        let mut staged = EventStore::new();
        let events = &mut staged;
        let payment = self.store.transaction(|data| {
            payment::apply_payment(
                data,
                tenant_id,
                student_id,
                fee_id,
                amount_paid,
                method,
                discount,
                time,
                events,
            )
        })?;
        self.events.append(&mut staged);
        Ok(PaymentView::from(&payment))
    }

    /// full payment history for a student, oldest first
    pub fn payments_for_student(
        &self,
        tenant_id: TenantId,
        student_id: &StudentId,
    ) -> Vec<PaymentView> {
        self.store
            .data()
            .payments
            .find_all(|p| p.tenant_id == tenant_id && p.student_id == *student_id)
            .iter()
            .map(PaymentView::from)
            .collect()
    }
}

// lookup helpers shared by the facade operations

fn find_class(data: &StoreData, tenant_id: TenantId, class_id: ClassId) -> Result<SchoolClass> {
    data.classes
        .find_first(|c| c.tenant_id == tenant_id && c.class_id == class_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::Class,
            key: class_id.to_string(),
        })
}

fn find_student(data: &StoreData, tenant_id: TenantId, student_id: &StudentId) -> Result<Student> {
    data.students
        .find_first(|s| s.tenant_id == tenant_id && s.student_id == *student_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::Student,
            key: student_id.to_string(),
        })
}

fn student_view(data: &StoreData, student: &Student) -> Result<StudentView> {
    let class = find_class(data, student.tenant_id, student.class_id)?;
    Ok(StudentView::new(student, &class))
}

fn fee_view(data: &StoreData, tenant_id: TenantId, fee_id: FeeId) -> Result<FeeView> {
    let fee = data
        .fees
        .find_first(|f| f.tenant_id == tenant_id && f.fee_id == fee_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::Fee,
            key: fee_id.to_string(),
        })?;
    let class = find_class(data, tenant_id, fee.class_id)?;
    let fee_type = data
        .fee_types
        .find_first(|ft| ft.fee_type_id == fee.fee_type_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::FeeType,
            key: fee.fee_type_id.to_string(),
        })?;
    let plan = data
        .payment_plans
        .find_first(|p| p.plan_id == fee.plan_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::PaymentPlan,
            key: fee.plan_id.to_string(),
        })?;
    Ok(FeeView::new(&fee, &class, &fee_type, &plan))
}

fn obligation_view(data: &StoreData, obligation: &Obligation) -> Result<ObligationView> {
    let fee = data
        .fees
        .find_first(|f| f.fee_id == obligation.fee_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::Fee,
            key: obligation.fee_id.to_string(),
        })?;
    let fee_type = data
        .fee_types
        .find_first(|ft| ft.fee_type_id == fee.fee_type_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::FeeType,
            key: fee.fee_type_id.to_string(),
        })?;
    let plan = data
        .payment_plans
        .find_first(|p| p.plan_id == obligation.plan_id)
        .ok_or_else(|| FeeError::ReferenceNotFound {
            kind: ReferenceKind::PaymentPlan,
            key: obligation.plan_id.to_string(),
        })?;
    Ok(ObligationView::new(obligation, &fee_type, &plan))
}
