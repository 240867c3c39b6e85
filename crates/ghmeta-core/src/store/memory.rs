use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;

use super::{Cancellation, EntityStore, UpsertOutcome, UpsertRequest};
use crate::entity::{EntityKind, EntityRow};
use crate::errors::StoreError;

/// Backend en memoria con la misma semántica que el de Postgres.
///
/// La entrada de `DashMap` bloquea el shard de la clave mientras decide entre
/// insertar y agregar versión, que es el equivalente a la restricción de
/// unicidad sobre `sum256`.
#[derive(Default)]
pub struct InMemoryEntityStore {
    inner: DashMap<(EntityKind, String), EntityRow>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn upsert(&self, request: &UpsertRequest, cancel: &Cancellation) -> Result<UpsertOutcome, StoreError> {
        request.validate()?;
        let identity = request.identity();
        // Sin transacción real: el chequeo previo a tocar el mapa equivale al
        // rollback (nada se escribe si ya está cancelado).
        cancel.check()?;
        let outcome = match self.inner.entry((request.kind, identity.clone())) {
            Entry::Occupied(mut row) => {
                row.get_mut().versions.push(request.version);
                UpsertOutcome::Appended
            }
            Entry::Vacant(slot) => {
                slot.insert(EntityRow { identity: identity.clone(),
                                        versions: vec![request.version],
                                        content: request.content() });
                UpsertOutcome::Inserted
            }
        };
        debug!("upsert kind={} identity={identity} outcome={outcome:?}", request.kind);
        Ok(outcome)
    }

    fn find(&self, kind: EntityKind, identity: &str) -> Result<Option<EntityRow>, StoreError> {
        Ok(self.inner.get(&(kind, identity.to_string())).map(|r| r.value().clone()))
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRow>, StoreError> {
        Ok(self.inner
               .iter()
               .filter(|r| r.key().0 == kind)
               .map(|r| r.value().clone())
               .collect())
    }
}
