//! Alert subscription use cases.
//!
//! # Responsibility
//! - Create an alert config together with its configured filters.
//! - List and remove a chat's subscriptions.
//!
//! # Invariants
//! - A subscription is never left behind without the filters it was
//!   created with: a failed filter batch removes the new config again.
//! - Unsubscribing deletes filters before their config, so no filter ever
//!   points at a missing config.

use crate::model::alert::{AlertConfig, AlertConfigInput, ConfiguredFilter, ConfiguredFilterInput};
use crate::model::entity::{EntityId, Record};
use crate::model::value::field_map;
use crate::repo::{CrudRepository, ListQuery, RepoResult};
use crate::uow::UnitOfWork;
use log::warn;

/// Use-case service over the alert config and filter repositories.
#[derive(Debug, Clone, Default)]
pub struct AlertService {
    configs: CrudRepository<AlertConfig>,
    filters: CrudRepository<ConfiguredFilter>,
}

impl AlertService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `config` and attaches every filter to it.
    ///
    /// # Errors
    /// Any repository error. When the filter batch fails the created config
    /// is removed before the error is returned.
    pub fn subscribe<U: UnitOfWork>(
        &self,
        uow: &mut U,
        config: &AlertConfigInput,
        filters: &[ConfiguredFilterInput],
    ) -> RepoResult<Record<AlertConfig>> {
        let created = self.configs.create(uow, config)?;
        let bound: Vec<ConfiguredFilterInput> = filters
            .iter()
            .cloned()
            .map(|filter| filter.alert_config_id(Some(created.id)))
            .collect();

        if let Err(err) = self.filters.create_multi(uow, &bound) {
            if let Err(cleanup_err) = self.configs.remove_with_id(uow, created.id) {
                warn!(
                    "event=alert_subscribe module=service status=cleanup_failed id={} error={cleanup_err}",
                    created.id
                );
            }
            return Err(err);
        }
        Ok(created)
    }

    /// Every filter attached to `config_id`, ordered by identity.
    pub fn filters_for<U: UnitOfWork>(
        &self,
        uow: &U,
        config_id: EntityId,
    ) -> RepoResult<Vec<Record<ConfiguredFilter>>> {
        let query = ListQuery {
            limit: u32::MAX,
            ..ListQuery::filtered(field_map([("alert_config_id", config_id)]))
        };
        self.filters.get_multi(uow, &query)
    }

    /// Every alert config owned by `chat_id`, ordered by identity.
    pub fn subscriptions_for_chat<U: UnitOfWork>(
        &self,
        uow: &U,
        chat_id: &str,
    ) -> RepoResult<Vec<Record<AlertConfig>>> {
        let query = ListQuery {
            limit: u32::MAX,
            ..ListQuery::filtered(field_map([("chat_id", chat_id)]))
        };
        self.configs.get_multi(uow, &query)
    }

    /// Deletes the config's filters, then the config itself.
    ///
    /// # Errors
    /// `MissingTarget` when no config has identity `config_id`.
    pub fn unsubscribe<U: UnitOfWork>(
        &self,
        uow: &mut U,
        config_id: EntityId,
    ) -> RepoResult<Record<AlertConfig>> {
        let filters = self.filters_for(uow, config_id)?;
        if !filters.is_empty() {
            self.filters.remove_multi(uow, &filters)?;
        }
        self.configs.remove_with_id(uow, config_id)
    }
}
