//! Apply engine
//!
//! Executes one change-set entry against the provider and reports the
//! outcome to the registry. Entries are independent: callers apply each one
//! and carry on whatever the result.

use super::SyncContext;
use crate::diff::{Action, ChangeSetEntry};
use crate::error::{Error, Result};
use crate::record::CanonicalRecord;
use crate::traits::ResourceStatus;
use tracing::debug;

/// Apply a single change-set entry.
///
/// Create and update report [`ResourceStatus::Created`] for the record's
/// origin once the provider call succeeds. Delete never reports: deleted
/// records exist only at the provider and have no originating resource.
pub async fn apply(ctx: &SyncContext, entry: &ChangeSetEntry) -> Result<()> {
    let record = &entry.record;
    let provider = ctx.provider();

    match entry.action {
        Action::Create => {
            provider
                .create_record(
                    ctx.domain(),
                    &record.name,
                    &record.record_type,
                    record.ttl,
                    &record.values,
                )
                .await
                .map_err(|e| {
                    Error::provider(
                        provider.provider_name(),
                        format!(
                            "Failed to create record {}({}): {}",
                            record.name, record.record_type, e
                        ),
                    )
                })?;
            debug!("Record {}({}) has been created", record.name, record.record_type);

            report_created(ctx, record).await
        }
        Action::Update => {
            provider
                .change_records(ctx.domain(), std::slice::from_ref(record))
                .await
                .map_err(|e| {
                    Error::provider(
                        provider.provider_name(),
                        format!(
                            "Failed to update record {}({}): {}",
                            record.name, record.record_type, e
                        ),
                    )
                })?;
            debug!("Record {}({}) has been updated", record.name, record.record_type);

            report_created(ctx, record).await
        }
        Action::Delete => {
            provider
                .delete_record(ctx.domain(), &record.name, &record.record_type)
                .await
                .map_err(|e| {
                    Error::provider(
                        provider.provider_name(),
                        format!(
                            "Failed to delete record {}({}): {}",
                            record.name, record.record_type, e
                        ),
                    )
                })?;
            debug!("Record {}({}) has been deleted", record.name, record.record_type);

            Ok(())
        }
    }
}

async fn report_created(ctx: &SyncContext, record: &CanonicalRecord) -> Result<()> {
    let Some(id) = record.origin_id.as_deref() else {
        return Ok(());
    };

    ctx.registry()
        .set_resource_status(id, ResourceStatus::Created)
        .await
        .map_err(|e| Error::registry(format!("Failed to set status for resource {}: {}", id, e)))
}
