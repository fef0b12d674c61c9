use chrono::Utc;
use entity::training_list;
use platform_authz::{Action, PolicyEngine, Resource, Viewer};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::HrError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrainingEntry {
    pub id: Uuid,
    pub login: String,
    pub hired: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<training_list::Model> for TrainingEntry {
    fn from(model: training_list::Model) -> Self {
        Self {
            id: model.id,
            login: model.login,
            hired: model.hired,
            created_at: model.created_at,
        }
    }
}

/// Sets `hired = true` on every entry for `login`. Returns the number of rows
/// touched.
pub async fn mark_hired<C>(conn: &C, login: &str) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = training_list::Entity::update_many()
        .col_expr(training_list::Column::Hired, Expr::value(true))
        .filter(training_list::Column::Login.eq(login))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn add_training_entry<C>(conn: &C, login: &str) -> Result<training_list::Model, DbErr>
where
    C: ConnectionTrait,
{
    training_list::ActiveModel {
        id: Set(Uuid::new_v4()),
        login: Set(login.trim().to_ascii_lowercase()),
        hired: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
}

pub async fn list_training<C>(
    conn: &C,
    viewer: &Viewer,
    hired: Option<bool>,
) -> Result<Vec<TrainingEntry>, HrError>
where
    C: ConnectionTrait,
{
    PolicyEngine.check(viewer, Action::Read, Resource::default())?;
    let mut query = training_list::Entity::find()
        .order_by_asc(training_list::Column::Login)
        .order_by_asc(training_list::Column::CreatedAt);
    if let Some(hired) = hired {
        query = query.filter(training_list::Column::Hired.eq(hired));
    }
    let rows = query.all(conn).await?;
    Ok(rows.into_iter().map(TrainingEntry::from).collect())
}
