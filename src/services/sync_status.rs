//! Sweep bookkeeping: last success/attempt per job, with running counters

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::sync_status::{self, Entity as SyncStatus};
use crate::error::SyncResult;

/// Current bookkeeping row for a job, if it ever ran
pub async fn get_status(
    db: &DatabaseConnection,
    job_name: &str,
) -> SyncResult<Option<sync_status::Model>> {
    let status = SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await?;

    Ok(status)
}

/// Record a completed sweep
pub async fn record_success(
    db: &DatabaseConnection,
    job_name: &str,
    refreshed: usize,
) -> SyncResult<()> {
    let now = Utc::now().naive_utc();
    let refreshed = refreshed as i64;

    match get_status(db, job_name).await? {
        Some(record) => {
            let success_count = record.success_count + 1;
            let mut active_model: sync_status::ActiveModel = record.into();
            active_model.last_success_at = Set(Some(now));
            active_model.last_attempt_at = Set(Some(now));
            active_model.last_error = Set(None);
            active_model.last_refreshed_count = Set(refreshed);
            active_model.success_count = Set(success_count);
            active_model.update(db).await?;
        }
        None => {
            let new_record = sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(Some(now)),
                last_attempt_at: Set(Some(now)),
                last_error: Set(None),
                last_refreshed_count: Set(refreshed),
                success_count: Set(1),
                error_count: Set(0),
                ..Default::default()
            };
            new_record.insert(db).await?;
        }
    }

    tracing::debug!("[{}] Recorded successful sweep", job_name);
    Ok(())
}

/// Record a failed sweep attempt
pub async fn record_failure(
    db: &DatabaseConnection,
    job_name: &str,
    error: &str,
) -> SyncResult<()> {
    let now = Utc::now().naive_utc();

    match get_status(db, job_name).await? {
        Some(record) => {
            let error_count = record.error_count + 1;
            let mut active_model: sync_status::ActiveModel = record.into();
            active_model.last_attempt_at = Set(Some(now));
            active_model.last_error = Set(Some(error.to_string()));
            active_model.error_count = Set(error_count);
            active_model.update(db).await?;
        }
        None => {
            let new_record = sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(None),
                last_attempt_at: Set(Some(now)),
                last_error: Set(Some(error.to_string())),
                last_refreshed_count: Set(0),
                success_count: Set(0),
                error_count: Set(1),
                ..Default::default()
            };
            new_record.insert(db).await?;
        }
    }

    tracing::debug!("[{}] Recorded failed sweep: {}", job_name, error);
    Ok(())
}
