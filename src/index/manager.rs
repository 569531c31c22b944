//! Index version management: ensure the physical schema exists and is
//! discoverable by alias, and detect the currently-aliased schema version.

use crate::capability::store::{SearchStore, StoreError};
use crate::error::{RepositoryError, Result};
use crate::index::descriptor::{parse_index_version, IndexDescriptor, UNKNOWN_VERSION};
use crate::index::reindex::ReindexOrchestrator;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Ensures a descriptor's physical index (or template), alias binding and
/// version are in place. Idempotent: re-running against a correct state
/// performs read-only existence checks only.
pub struct IndexVersionManager {
    store: Arc<dyn SearchStore>,
}

impl IndexVersionManager {
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self { store }
    }

    /// Ensure the physical schema exists and the alias points at it.
    /// Returns the schema version the alias pointed at *before* this call
    /// ([`UNKNOWN_VERSION`] when the alias resolved to nothing parsable),
    /// which is what reindex decisions are made from.
    ///
    /// Any failed create/alias/template call is a fatal configuration
    /// error: the application cannot proceed against a misconfigured store.
    pub async fn configure(&self, descriptor: &IndexDescriptor) -> Result<i32> {
        let current_version = self.alias_version(&descriptor.alias).await?;
        let versioned_name = descriptor.versioned_name();

        if descriptor.time_partitioned {
            // a template, so future period-indices auto-apply the mapping
            self.store
                .put_template(&versioned_name, &descriptor.mapping)
                .await
                .map_err(fatal)?;
        } else if !self.store.index_exists(&versioned_name).await.map_err(fatal)? {
            // two processes may race here; the store's idempotent-create
            // semantics absorb the benign "already exists" outcome
            match self.store.create_index(&versioned_name, &descriptor.mapping).await {
                Ok(()) => {}
                Err(err) if already_exists(&err) => {}
                Err(err) => return Err(fatal(err)),
            }
        }

        if !self.store.alias_exists(&descriptor.alias).await.map_err(fatal)? {
            if descriptor.time_partitioned {
                // adopt every existing physical index of this version so
                // pre-existing data is reachable on first run
                let existing = self.store.list_indices(&versioned_name).await.map_err(fatal)?;
                if !existing.is_empty() {
                    self.store
                        .bind_alias(&descriptor.alias, &existing)
                        .await
                        .map_err(fatal)?;
                }
            } else {
                self.store
                    .bind_alias(&descriptor.alias, std::slice::from_ref(&versioned_name))
                    .await
                    .map_err(fatal)?;
            }

            tracing::info!(
                alias = %descriptor.alias,
                index = %versioned_name,
                "Alias bound"
            );
        }

        Ok(current_version)
    }

    /// Resolve the alias and parse the trailing `-v{N}` of the physical
    /// index it points at. No alias, or an unparsable suffix, yields
    /// [`UNKNOWN_VERSION`].
    pub async fn alias_version(&self, alias: &str) -> Result<i32> {
        let indices = match self.store.resolve_alias(alias).await {
            Ok(indices) => indices,
            Err(StoreError::NotFound(_)) => return Ok(UNKNOWN_VERSION),
            Err(err) => return Err(fatal(err)),
        };

        match indices.first() {
            Some(index_name) => Ok(parse_index_version(index_name)),
            None => Ok(UNKNOWN_VERSION),
        }
    }
}

/// One configuration pass over a set of descriptors: ensure each schema,
/// then hand version drift to the reindex orchestrator.
pub struct IndexConfigurator {
    manager: IndexVersionManager,
    orchestrator: ReindexOrchestrator,
}

impl IndexConfigurator {
    pub fn new(manager: IndexVersionManager, orchestrator: ReindexOrchestrator) -> Self {
        Self {
            manager,
            orchestrator,
        }
    }

    pub async fn configure_all(
        &self,
        descriptors: &[IndexDescriptor],
        token: &CancellationToken,
    ) -> Result<()> {
        for descriptor in descriptors {
            let current_version = self.manager.configure(descriptor).await?;
            self.orchestrator
                .ensure_current(descriptor, current_version, token)
                .await?;
        }

        Ok(())
    }
}

fn fatal(err: StoreError) -> RepositoryError {
    RepositoryError::Configuration(err.to_string())
}

fn already_exists(err: &StoreError) -> bool {
    matches!(err, StoreError::IndexOperation(msg) if msg.contains("already exists"))
}
