use std::{fmt, str::FromStr};

use entity::employee;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::additional_info::AdditionalInfo;

/// The employee row an employee reports to.
pub type ManagerRecord = employee::Model;

/// Looks up the manager of `employee_id`. `None` when the employee does not
/// exist or has no manager.
pub async fn get_manager_for_employee<C>(
    db: &C,
    employee_id: Uuid,
) -> Result<Option<ManagerRecord>, DbErr>
where
    C: ConnectionTrait,
{
    let found = employee::Entity::find_by_id(employee_id)
        .find_also_linked(employee::ManagerLink)
        .one(db)
        .await?;
    Ok(found.and_then(|(_, manager)| manager))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerVariant {
    #[default]
    Short,
    Full,
}

impl FromStr for ManagerVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(ManagerVariant::Short),
            "full" => Ok(ManagerVariant::Full),
            other => Err(format!("unknown manager view: {other}")),
        }
    }
}

impl fmt::Display for ManagerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManagerVariant::Short => "short",
            ManagerVariant::Full => "full",
        })
    }
}

/// Minimal public view of a manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManagerSummary {
    pub employee_id: Uuid,
    pub login: String,
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManagerDetail {
    pub employee_id: Uuid,
    pub login: String,
    pub manager_id: Option<Uuid>,
    pub additional_info: Value,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ManagerView {
    Short(ManagerSummary),
    Full(ManagerDetail),
}

/// Renders the `manager` field of an employee's output.
pub trait ManagerRenderer: Send + Sync {
    fn variant(&self) -> ManagerVariant;

    fn render(&self, manager: &ManagerRecord) -> ManagerView;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ShortManager;

impl ManagerRenderer for ShortManager {
    fn variant(&self) -> ManagerVariant {
        ManagerVariant::Short
    }

    fn render(&self, manager: &ManagerRecord) -> ManagerView {
        ManagerView::Short(ManagerSummary {
            employee_id: manager.employee_id,
            login: manager.login.clone(),
            full_name: AdditionalInfo::from_stored(&manager.additional_info)
                .map(|info| info.full_name),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FullManager;

impl ManagerRenderer for FullManager {
    fn variant(&self) -> ManagerVariant {
        ManagerVariant::Full
    }

    fn render(&self, manager: &ManagerRecord) -> ManagerView {
        ManagerView::Full(ManagerDetail {
            employee_id: manager.employee_id,
            login: manager.login.clone(),
            manager_id: manager.manager_id,
            additional_info: manager.additional_info.clone(),
            created: manager.created,
            updated: manager.updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn boss() -> ManagerRecord {
        let now: DateTimeWithTimeZone = Utc::now().into();
        employee::Model {
            employee_id: Uuid::new_v4(),
            login: "boss".into(),
            creator_id: Uuid::new_v4(),
            manager_id: None,
            additional_info: json!({"full_name": "Big Boss", "email": "boss@corp.test"}),
            created: now,
            updated: now,
        }
    }

    #[test]
    fn short_view_exposes_only_public_fields() {
        let manager = boss();
        let rendered = serde_json::to_value(ShortManager.render(&manager)).unwrap();
        assert_eq!(
            rendered,
            json!({
                "employee_id": manager.employee_id,
                "login": "boss",
                "full_name": "Big Boss",
            })
        );
    }

    #[test]
    fn full_view_carries_profile_and_timestamps() {
        let manager = boss();
        let rendered = serde_json::to_value(FullManager.render(&manager)).unwrap();
        assert_eq!(rendered["additional_info"]["email"], "boss@corp.test");
        assert_eq!(rendered["manager_id"], Value::Null);
        assert!(rendered["created"].is_string());
    }

    #[test]
    fn short_view_tolerates_unreadable_profile() {
        let mut manager = boss();
        manager.additional_info = json!("legacy");
        let ManagerView::Short(summary) = ShortManager.render(&manager) else {
            panic!("short renderer produced a full view");
        };
        assert_eq!(summary.full_name, None);
    }

    #[test]
    fn variants_parse() {
        assert_eq!("FULL".parse::<ManagerVariant>(), Ok(ManagerVariant::Full));
        assert!("tiny".parse::<ManagerVariant>().is_err());
        assert_eq!(ManagerVariant::default().to_string(), "short");
    }
}
