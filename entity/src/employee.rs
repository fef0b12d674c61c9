use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub employee_id: Uuid,
    #[sea_orm(unique)]
    pub login: String,
    pub creator_id: Uuid,
    #[sea_orm(indexed)]
    pub manager_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub additional_info: Json,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ManagerId",
        to = "Column::EmployeeId",
        on_delete = "SetNull"
    )]
    Manager,
}

/// Follows `manager_id` from an employee to the employee it reports to.
pub struct ManagerLink;

impl Linked for ManagerLink {
    type FromEntity = Entity;
    type ToEntity = Entity;

    fn link(&self) -> Vec<RelationDef> {
        vec![Relation::Manager.def()]
    }
}

impl ActiveModelBehavior for ActiveModel {}
