use entity::employee;
use platform_api::FieldErrors;
use platform_authz::{Action, PolicyEngine, Resource, Viewer};
use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::HrError;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;
/// Offsets are bound as signed 64-bit integers.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 {
            errors.add("limit", "Ensure this value is greater than or equal to 1.");
        } else if limit > MAX_PAGE_SIZE {
            errors.add(
                "limit",
                format!("Ensure this value is less than or equal to {MAX_PAGE_SIZE}."),
            );
        }
        let offset = offset.unwrap_or(0);
        if offset > MAX_OFFSET {
            errors.add(
                "offset",
                format!("Ensure this value is less than or equal to {MAX_OFFSET}."),
            );
        }
        errors.into_result(Self { limit, offset })
    }
}

pub async fn find_employee<C>(
    db: &C,
    viewer: &Viewer,
    employee_id: Uuid,
) -> Result<employee::Model, HrError>
where
    C: ConnectionTrait,
{
    PolicyEngine.check(viewer, Action::Read, Resource::default())?;
    employee::Entity::find_by_id(employee_id)
        .one(db)
        .await?
        .ok_or(HrError::NotFound)
}

/// Oldest first; ties broken by id so pages are stable.
pub async fn list_employees<C>(
    db: &C,
    viewer: &Viewer,
    page: Page,
) -> Result<Vec<employee::Model>, HrError>
where
    C: ConnectionTrait,
{
    PolicyEngine.check(viewer, Action::Read, Resource::default())?;
    let rows = employee::Entity::find()
        .order_by_asc(employee::Column::Created)
        .order_by_asc(employee::Column::EmployeeId)
        .limit(page.limit)
        .offset(page.offset)
        .all(db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        assert_eq!(Page::new(None, None), Ok(Page::default()));
        assert_eq!(
            Page::new(Some(10), Some(20)),
            Ok(Page {
                limit: 10,
                offset: 20
            })
        );
        assert!(Page::new(Some(0), None).unwrap_err().contains("limit"));
        assert!(Page::new(Some(MAX_PAGE_SIZE + 1), None).is_err());
        assert_eq!(
            Page::new(None, Some(MAX_OFFSET)).map(|page| page.offset),
            Ok(MAX_OFFSET)
        );
        let errors = Page::new(Some(10), Some(u64::MAX)).unwrap_err();
        assert!(errors.contains("offset"));
        assert!(!errors.contains("limit"));
    }
}
