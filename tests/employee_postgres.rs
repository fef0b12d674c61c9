use anyhow::Result;
use entity::training_list;
use hr_tests::{POSTGRES_PORT, migrated_pool, postgres_image};
use migration::{Migrator, MigratorTrait};
use platform_authz::{Role, Viewer};
use products_hr::{
    EmployeeTransformer, HrError, InputMode, ManagerVariant, add_training_entry,
    get_manager_for_employee,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use testcontainers::clients::Cli;
use uuid::Uuid;

#[tokio::test]
async fn create_hires_atomically_on_postgres() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let pool = migrated_pool(container.get_host_port_ipv4(POSTGRES_PORT)).await?;

    let viewer = Viewer::new(Uuid::new_v4(), vec![Role::Hr]);
    let transformer = EmployeeTransformer::for_variant(ManagerVariant::Full);
    let payload = |email: &str| json!({"additional_info": {"full_name": "J. Doe", "email": email}});

    add_training_entry(&pool, "jdoe").await?;
    let input = transformer.deserialize(&payload("jdoe@corp.test"), InputMode::Create)?;
    let record = transformer.create(&pool, &viewer, input).await?;
    assert_eq!(record.creator_id, viewer.user_id);
    assert!(hired_flags(&pool, "jdoe").await?.iter().all(|hired| *hired));

    // A second training entry arrives after the hire; a clashing create must
    // roll back without touching it.
    add_training_entry(&pool, "jdoe").await?;
    let input = transformer.deserialize(&payload("JDOE@other.test"), InputMode::Create)?;
    let err = transformer
        .create(&pool, &viewer, input)
        .await
        .expect_err("duplicate login must fail");
    assert!(matches!(err, HrError::Db(_)));
    assert_eq!(hired_flags(&pool, "jdoe").await?, vec![true, false]);

    let mut report = payload("report@corp.test");
    report["manager"] = json!(record.employee_id);
    let input = transformer.deserialize(&report, InputMode::Create)?;
    let report = transformer.create(&pool, &viewer, input).await?;
    let manager = get_manager_for_employee(&pool, report.employee_id).await?;
    assert_eq!(manager.map(|m| m.employee_id), Some(record.employee_id));

    let view = serde_json::to_value(transformer.serialize(&pool, &viewer, &report).await)?;
    assert_eq!(view["manager"]["additional_info"]["email"], "jdoe@corp.test");
    assert_eq!(view["allow_edit"], true);
    Ok(())
}

#[tokio::test]
async fn migrations_roll_back_and_reapply() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let pool = migrated_pool(container.get_host_port_ipv4(POSTGRES_PORT)).await?;

    Migrator::down(&pool, None).await?;
    assert_eq!(Migrator::get_pending_migrations(&pool).await?.len(), 2);
    Migrator::up(&pool, None).await?;
    assert!(Migrator::get_pending_migrations(&pool).await?.is_empty());
    Ok(())
}

async fn hired_flags(pool: &platform_db::DbPool, login: &str) -> Result<Vec<bool>> {
    let mut rows = training_list::Entity::find()
        .filter(training_list::Column::Login.eq(login))
        .all(pool)
        .await?;
    rows.sort_by_key(|row| row.created_at);
    Ok(rows.into_iter().map(|row| row.hired).collect())
}
