use std::sync::Arc;

use chrono::Utc;
use entity::employee;
use platform_api::FieldErrors;
use platform_authz::{Action, PolicyEngine, Resource, Viewer};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    HrError,
    additional_info::REQUIRED,
    input::{EmployeeInput, InputMode, ManagerField},
    manager::{
        FullManager, ManagerRenderer, ManagerVariant, ManagerView, ShortManager,
        get_manager_for_employee,
    },
    permission::has_permission_to_edit,
    training::mark_hired,
};

const UNKNOWN_MANAGER: &str = "Unknown employee.";
const SELF_MANAGED: &str = "An employee cannot be their own manager.";
const MANAGER_CYCLE: &str = "This assignment would create a reporting cycle.";
const CHAIN_TOO_DEEP: &str = "Reporting chain is too deep.";
const MAX_CHAIN_DEPTH: usize = 256;

/// JSON representation of an employee for one viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmployeeView {
    pub employee_id: Uuid,
    pub login: String,
    pub creator_id: Uuid,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
    pub manager: Option<ManagerView>,
    pub additional_info: Value,
    pub allow_edit: bool,
}

/// Maps employee rows to and from their HTTP representation. The variant is
/// fixed by the injected [`ManagerRenderer`].
#[derive(Clone)]
pub struct EmployeeTransformer {
    renderer: Arc<dyn ManagerRenderer>,
}

impl EmployeeTransformer {
    pub fn new(renderer: Arc<dyn ManagerRenderer>) -> Self {
        Self { renderer }
    }

    pub fn short() -> Self {
        Self::new(Arc::new(ShortManager))
    }

    pub fn full() -> Self {
        Self::new(Arc::new(FullManager))
    }

    pub fn for_variant(variant: ManagerVariant) -> Self {
        match variant {
            ManagerVariant::Short => Self::short(),
            ManagerVariant::Full => Self::full(),
        }
    }

    pub fn variant(&self) -> ManagerVariant {
        self.renderer.variant()
    }

    pub async fn serialize<C>(
        &self,
        db: &C,
        viewer: &Viewer,
        record: &employee::Model,
    ) -> EmployeeView
    where
        C: ConnectionTrait,
    {
        EmployeeView {
            employee_id: record.employee_id,
            login: record.login.clone(),
            creator_id: record.creator_id,
            created: record.created,
            updated: record.updated,
            manager: self.manager_field(db, record).await,
            additional_info: record.additional_info.clone(),
            allow_edit: has_permission_to_edit(viewer, record),
        }
    }

    pub async fn serialize_many<C>(
        &self,
        db: &C,
        viewer: &Viewer,
        records: &[employee::Model],
    ) -> Vec<EmployeeView>
    where
        C: ConnectionTrait,
    {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.serialize(db, viewer, record).await);
        }
        views
    }

    pub fn deserialize(&self, payload: &Value, mode: InputMode) -> Result<EmployeeInput, HrError> {
        Ok(EmployeeInput::from_json(payload, mode)?)
    }

    /// A failed lookup renders as `null` rather than failing the response.
    async fn manager_field<C>(&self, db: &C, record: &employee::Model) -> Option<ManagerView>
    where
        C: ConnectionTrait,
    {
        match get_manager_for_employee(db, record.employee_id).await {
            Ok(manager) => manager.map(|m| self.renderer.render(&m)),
            Err(err) => {
                warn!(employee_id = %record.employee_id, error = %err, "manager lookup failed");
                None
            }
        }
    }

    /// Persists a new employee stamped with the viewer as creator, and marks
    /// matching training-list entries as hired in the same transaction.
    #[instrument(name = "hr.employee.create", skip_all, fields(creator_id = %viewer.user_id))]
    pub async fn create(
        &self,
        db: &DatabaseConnection,
        viewer: &Viewer,
        input: EmployeeInput,
    ) -> Result<employee::Model, HrError> {
        PolicyEngine.check(viewer, Action::Create, Resource::default())?;

        let txn = db.begin().await?;
        let mut errors = FieldErrors::new();
        let manager_id = match input.manager {
            ManagerField::Unchanged | ManagerField::Clear => None,
            ManagerField::Set(id) => {
                if let Some(message) = check_manager(&txn, None, id).await? {
                    errors.add("manager", message);
                }
                Some(id)
            }
        };
        let Some(info) = input.additional_info else {
            errors.add("additional_info", REQUIRED);
            return Err(errors.into());
        };
        let Some(login) = info.derive_login() else {
            errors.add(
                "additional_info.email",
                "Cannot derive a login from this address.",
            );
            return Err(errors.into());
        };
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let record = employee::ActiveModel {
            employee_id: Set(Uuid::new_v4()),
            login: Set(login),
            creator_id: Set(viewer.user_id),
            manager_id: Set(manager_id),
            additional_info: Set(info.to_json()),
            created: Set(now),
            updated: Set(now),
        }
        .insert(&txn)
        .await?;
        let hired = mark_hired(&txn, &record.login).await?;
        txn.commit().await?;

        info!(
            employee_id = %record.employee_id,
            login = %record.login,
            hired,
            "employee created"
        );
        Ok(record)
    }

    /// Applies the writable fields present in `input`. Requires
    /// [`has_permission_to_edit`] on the stored record.
    #[instrument(name = "hr.employee.update", skip_all, fields(employee_id = %employee_id))]
    pub async fn update(
        &self,
        db: &DatabaseConnection,
        viewer: &Viewer,
        employee_id: Uuid,
        input: EmployeeInput,
    ) -> Result<employee::Model, HrError> {
        let txn = db.begin().await?;
        let existing = employee::Entity::find_by_id(employee_id)
            .one(&txn)
            .await?
            .ok_or(HrError::NotFound)?;
        if !has_permission_to_edit(viewer, &existing) {
            return Err(HrError::Forbidden);
        }

        let mut active: employee::ActiveModel = existing.into();
        match input.manager {
            ManagerField::Unchanged => {}
            ManagerField::Clear => active.manager_id = Set(None),
            ManagerField::Set(manager_id) => {
                if let Some(message) = check_manager(&txn, Some(employee_id), manager_id).await? {
                    let mut errors = FieldErrors::new();
                    errors.add("manager", message);
                    return Err(errors.into());
                }
                active.manager_id = Set(Some(manager_id));
            }
        }
        if let Some(info) = input.additional_info {
            active.additional_info = Set(info.to_json());
        }
        active.updated = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        info!(login = %updated.login, "employee updated");
        Ok(updated)
    }
}

/// Returns the validation message for assigning `manager_id`, if any.
/// `employee_id` is `None` for a record that does not exist yet and so cannot
/// appear in anyone's reporting chain.
async fn check_manager<C>(
    conn: &C,
    employee_id: Option<Uuid>,
    manager_id: Uuid,
) -> Result<Option<&'static str>, HrError>
where
    C: ConnectionTrait,
{
    if employee_id == Some(manager_id) {
        return Ok(Some(SELF_MANAGED));
    }
    let Some(manager) = employee::Entity::find_by_id(manager_id).one(conn).await? else {
        return Ok(Some(UNKNOWN_MANAGER));
    };
    let Some(employee_id) = employee_id else {
        return Ok(None);
    };

    let mut next = manager.manager_id;
    for _ in 0..MAX_CHAIN_DEPTH {
        let Some(current) = next else {
            return Ok(None);
        };
        if current == employee_id {
            return Ok(Some(MANAGER_CYCLE));
        }
        next = employee::Entity::find_by_id(current)
            .one(conn)
            .await?
            .and_then(|row| row.manager_id);
    }
    Ok(Some(CHAIN_TOO_DEEP))
}
