// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The generic repository: uniform CRUD + conditional query + bounded
//! TTL cache over any [`Entity`] backed by any [`SqlStore`].
//!
//! Store failures never cross this boundary as errors — they are
//! logged and surfaced as `false`/`None`/empty, per the propagation
//! policy for repositories.

use crate::cache::Cache;
use crate::entity::Entity;
use crate::query::{conditions_to_where, order_by_to_sql, sql_escape, OrderBy, Pagination, QueryCondition};
use crate::sql_store::SqlStore;
use pulseone_core::Clock;
use std::sync::Arc;

pub struct Repository<E: Entity, S: SqlStore> {
    store: Arc<S>,
    cache: Cache<E::Id, E>,
}

impl<E: Entity, S: SqlStore> Repository<E, S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache: Cache::new(clock),
        }
    }

    pub fn with_cache_limits(store: Arc<S>, clock: Arc<dyn Clock>, max_size: usize, ttl_ms: u64) -> Self {
        Self {
            store,
            cache: Cache::with_limits(clock, max_size, ttl_ms),
        }
    }

    pub fn cache(&self) -> &Cache<E::Id, E> {
        &self.cache
    }

    pub fn find_all(&self) -> Vec<E> {
        let sql = format!("SELECT * FROM {}", E::table_name());
        self.rows_to_entities(self.store.execute_query(&sql))
    }

    pub fn find_by_id(&self, id: &E::Id) -> Option<E> {
        if let Some(cached) = self.cache.get(id) {
            return Some(cached);
        }
        let sql = format!(
            "SELECT * FROM {} WHERE id = '{}'",
            E::table_name(),
            sql_escape(&id.to_string())
        );
        let rows = self.store.execute_query(&sql);
        let entity = rows.first().and_then(E::from_row)?;
        self.cache.put(id.clone(), entity.clone());
        Some(entity)
    }

    pub fn find_by_ids(&self, ids: &[E::Id]) -> Vec<E> {
        ids.iter().filter_map(|id| self.find_by_id(id)).collect()
    }

    /// Upsert semantics: inserts if the id is new, overwrites if known.
    pub fn save(&self, entity: &E) -> bool {
        let row = entity.to_row();
        let mut cols = Vec::with_capacity(row.len());
        let mut vals = Vec::with_capacity(row.len());
        for (k, v) in &row {
            cols.push(k.clone());
            vals.push(format!("'{}'", sql_escape(v)));
        }
        let sql = format!(
            "REPLACE INTO {} ({}) VALUES ({})",
            E::table_name(),
            cols.join(", "),
            vals.join(", ")
        );
        let ok = self.store.execute_non_query(&sql);
        if ok {
            self.cache.put(entity.id(), entity.clone());
        } else {
            tracing::warn!(table = E::table_name(), "repository save failed");
        }
        ok
    }

    pub fn save_bulk(&self, entities: &[E]) -> usize {
        entities.iter().filter(|e| self.save(e)).count()
    }

    /// Same wire format as [`Self::save`]; kept distinct because the
    /// spec names `update` and `save` as separate operations even
    /// though both are upserts at this store's SQL-black-box level.
    pub fn update(&self, entity: &E) -> bool {
        let saved = self.save(entity);
        if saved {
            self.cache.invalidate(&entity.id());
            self.cache.put(entity.id(), entity.clone());
        }
        saved
    }

    pub fn update_bulk(&self, entities: &[E]) -> usize {
        entities.iter().filter(|e| self.update(e)).count()
    }

    pub fn delete_by_id(&self, id: &E::Id) -> bool {
        let sql = format!(
            "DELETE FROM {} WHERE id = '{}'",
            E::table_name(),
            sql_escape(&id.to_string())
        );
        let ok = self.store.execute_non_query(&sql);
        if ok {
            self.cache.invalidate(id);
        } else {
            tracing::warn!(table = E::table_name(), "repository delete failed");
        }
        ok
    }

    pub fn delete_by_ids(&self, ids: &[E::Id]) -> usize {
        ids.iter().filter(|id| self.delete_by_id(id)).count()
    }

    pub fn exists(&self, id: &E::Id) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn find_by_conditions(
        &self,
        conds: &[QueryCondition],
        order: Option<&OrderBy>,
        page: Option<Pagination>,
    ) -> Vec<E> {
        let sql = self.select_sql(conds, order, page);
        self.rows_to_entities(self.store.execute_query(&sql))
    }

    pub fn count_by_conditions(&self, conds: &[QueryCondition]) -> usize {
        let mut sql = format!("SELECT COUNT(*) FROM {}", E::table_name());
        if !conds.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions_to_where(conds));
        }
        self.store.execute_query(&sql).len()
    }

    pub fn find_first_by_conditions(&self, conds: &[QueryCondition]) -> Option<E> {
        self.find_by_conditions(conds, None, Some(Pagination::new(1, 1)))
            .into_iter()
            .next()
    }

    fn select_sql(&self, conds: &[QueryCondition], order: Option<&OrderBy>, page: Option<Pagination>) -> String {
        let mut sql = format!("SELECT * FROM {}", E::table_name());
        if !conds.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions_to_where(conds));
        }
        if let Some(order) = order {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by_to_sql(order));
        }
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.limit(), page.offset()));
        }
        sql
    }

    fn rows_to_entities(&self, rows: Vec<crate::entity::Row>) -> Vec<E> {
        rows.iter()
            .filter_map(|row| {
                let entity = E::from_row(row)?;
                self.cache.put(entity.id(), entity.clone());
                Some(entity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSqlStore;
    use pulseone_core::{Device, DeviceId, FakeClock};

    fn repo() -> (Repository<Device, FakeSqlStore>, Arc<FakeSqlStore>) {
        let store = Arc::new(FakeSqlStore::new());
        let clock = Arc::new(FakeClock::new());
        (Repository::new(store.clone(), clock), store)
    }

    fn device(id: &str) -> Device {
        Device::builder().id(DeviceId::new(id)).name("pump-1").build()
    }

    #[test]
    fn round_trip_save_and_find() {
        let (repo, _store) = repo();
        assert!(repo.save(&device("d-1")));
        let found = repo.find_by_id(&DeviceId::new("d-1")).unwrap();
        assert_eq!(found.name, "pump-1");
    }

    #[test]
    fn update_invalidates_stale_cache_entry() {
        let (repo, _store) = repo();
        let mut d = device("d-2");
        repo.save(&d);
        assert_eq!(repo.find_by_id(&DeviceId::new("d-2")).unwrap().name, "pump-1");
        d.name = "pump-2".to_string();
        repo.update(&d);
        assert_eq!(repo.find_by_id(&DeviceId::new("d-2")).unwrap().name, "pump-2");
    }

    #[test]
    fn delete_removes_from_cache_and_store() {
        let (repo, _store) = repo();
        let id = DeviceId::new("d-3");
        repo.save(&device("d-3"));
        assert!(repo.delete_by_id(&id));
        assert!(repo.find_by_id(&id).is_none());
    }

    #[test]
    fn find_by_ids_silently_skips_missing() {
        let (repo, _store) = repo();
        repo.save(&device("d-4"));
        let found = repo.find_by_ids(&[DeviceId::new("d-4"), DeviceId::new("missing")]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn query_condition_count_matches_find_length() {
        let (repo, _store) = repo();
        for i in 0..5 {
            let mut d = device(&format!("d-{i}"));
            d.enabled = i % 2 == 0;
            repo.save(&d);
        }
        let conds = vec![QueryCondition::eq("enabled", "true")];
        let found = repo.find_by_conditions(&conds, None, None);
        let count = repo.count_by_conditions(&conds);
        assert_eq!(found.len(), count);
        assert_eq!(count, 3);
    }
}
