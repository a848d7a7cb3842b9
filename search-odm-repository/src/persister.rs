//! Entity persister.
//!
//! Ties a mapped entity type to a search connection: criteria lookups,
//! batched inserts with schema bootstrap and identity checks, updates,
//! deletes and id lookups.

use std::sync::Arc;

use search_odm_shared::{
    Document, FieldKind, OrderBy, SearchCriteria, SearchHits, SearchResult, ID_META_FIELD,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::PersisterConfig;
use crate::errors::OdmError;
use crate::hydrator::EntityHydrator;
use crate::interfaces::{LifecycleEvent, LifecycleListener, SearchConnection};
use crate::mapping::{MappingDescriptor, MappingRegistry};
use crate::types::{
    DefaultOperator, DeleteParams, GetParams, InsertParams, SearchParams, UpdateParams,
    WriteResponse,
};
use crate::utils::value_as_id;

/// Handle to an entity queued with `EntityPersister::add_insert`.
///
/// Tickets of one batch share `batch_id` and are ordered by `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsertTicket {
    pub batch_id: Uuid,
    pub sequence: u64,
}

/// Persists one entity type through a search connection.
pub struct EntityPersister<E: Document> {
    connection: Arc<dyn SearchConnection>,
    hydrator: EntityHydrator,
    config: PersisterConfig,
    listeners: Vec<Arc<dyn LifecycleListener<E>>>,
    queue: Vec<(InsertTicket, E)>,
    completed: Vec<(InsertTicket, E)>,
    batch_id: Uuid,
    next_sequence: u64,
}

impl<E: Document> EntityPersister<E> {
    /// Create a persister with the default configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(EntityPersister)` - A persister bound to `E`'s mapping
    /// * `Err(OdmError::MappingValidation)` - If `E`'s mapping declaration is invalid
    pub fn new(
        connection: Arc<dyn SearchConnection>,
        registry: &MappingRegistry,
    ) -> Result<Self, OdmError> {
        Self::with_config(connection, registry, PersisterConfig::default())
    }

    pub fn with_config(
        connection: Arc<dyn SearchConnection>,
        registry: &MappingRegistry,
        config: PersisterConfig,
    ) -> Result<Self, OdmError> {
        let descriptor = registry.descriptor::<E>()?;

        Ok(Self {
            connection,
            hydrator: EntityHydrator::new(descriptor),
            config,
            listeners: Vec::new(),
            queue: Vec::new(),
            completed: Vec::new(),
            batch_id: Uuid::new_v4(),
            next_sequence: 0,
        })
    }

    pub fn descriptor(&self) -> &MappingDescriptor {
        self.hydrator.descriptor()
    }

    /// Register a listener for insert lifecycle events.
    pub fn add_listener(&mut self, listener: Arc<dyn LifecycleListener<E>>) {
        self.listeners.push(listener);
    }

    /// Load every entity matching all criteria.
    ///
    /// Criteria and order keys are entity property names. Hits are returned in
    /// engine order; `limit` defaults to the connection's result cap.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<E>)` - The hydrated entities, possibly empty
    /// * `Err(OdmError::InvalidParameters)` - If a criteria or order key is not mapped
    pub async fn load_all(
        &self,
        criteria: &SearchCriteria,
        order_by: Option<&OrderBy>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<E>, OdmError> {
        let body = self.search_body(criteria, order_by)?;
        let params = SearchParams {
            default_operator: Some(DefaultOperator::And),
            ..SearchParams::paged(limit, offset)
        };

        let descriptor = self.descriptor();
        let response = self
            .connection
            .search(descriptor.index_name(), descriptor.type_name(), &body, &params)
            .await?;

        let hits = SearchHits::from_response(&response);
        debug!(
            index = descriptor.index_name(),
            total = hits.total,
            returned = hits.len(),
            "Loaded entities"
        );

        hits.hits
            .iter()
            .map(|hit| {
                let mut entity = E::default();
                self.hydrator.hydrate(&mut entity, hit)?;
                Ok(entity)
            })
            .collect()
    }

    /// Load the first entity matching all criteria.
    pub async fn load(
        &self,
        criteria: &SearchCriteria,
        order_by: Option<&OrderBy>,
    ) -> Result<Option<E>, OdmError> {
        Ok(self
            .load_all(criteria, order_by, Some(1), None)
            .await?
            .into_iter()
            .next())
    }

    /// Queue an entity for the next `execute_inserts`.
    pub fn add_insert(&mut self, entity: E) -> InsertTicket {
        let ticket = InsertTicket {
            batch_id: self.batch_id,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.queue.push((ticket, entity));
        ticket
    }

    /// Entities waiting for `execute_inserts`, in ticket order.
    pub fn queued_inserts(&self) -> &[(InsertTicket, E)] {
        &self.queue
    }

    /// Entities written by flushes that later failed, in ticket order.
    ///
    /// Drains the list. Each entity carries the document id it was written
    /// under.
    pub fn take_completed_inserts(&mut self) -> Vec<(InsertTicket, E)> {
        std::mem::take(&mut self.completed)
    }

    /// Insert every queued entity, in ticket order.
    ///
    /// Each returned entity is hydrated from its insert response, so its
    /// `_id` meta-field holds the document id. On failure the failing entity
    /// and everything queued after it stay queued, and the entities written
    /// before it are kept for `take_completed_inserts`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<(InsertTicket, E)>)` - The inserted entities with their tickets
    /// * `Err(OdmError::BatchSizeExceeded)` - If the queue exceeds `max_batch_size`; nothing is written
    /// * `Err(OdmError::ConstraintViolation)` - If an identifier value is already taken
    /// * `Err(OdmError::OperationFailed)` - If the engine rejects an insert or a schema creation
    #[instrument(skip_all, fields(
        entity = self.descriptor().entity(),
        batch_id = %self.batch_id,
        queued = self.queue.len()
    ))]
    pub async fn execute_inserts(&mut self) -> Result<Vec<(InsertTicket, E)>, OdmError> {
        if self.queue.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(max) = self.config.max_batch_size {
            if self.queue.len() > max {
                return Err(OdmError::batch_size_exceeded(self.queue.len(), max));
            }
        }

        let mut pending = std::mem::take(&mut self.queue).into_iter();
        let mut inserted = Vec::with_capacity(pending.len());

        while let Some((ticket, mut entity)) = pending.next() {
            if let Err(e) = self.insert_one(&mut entity).await {
                warn!(
                    written = inserted.len(),
                    ticket = ticket.sequence,
                    error = %e,
                    "Queued insert failed"
                );
                self.completed.extend(inserted);
                self.queue.push((ticket, entity));
                self.queue.extend(pending);
                return Err(e);
            }
            inserted.push((ticket, entity));
        }

        info!(inserted = inserted.len(), "Executed queued inserts");

        self.batch_id = Uuid::new_v4();
        self.next_sequence = 0;
        Ok(inserted)
    }

    async fn insert_one(&self, entity: &mut E) -> Result<(), OdmError> {
        let mut working = entity.clone();
        self.notify(LifecycleEvent::BeforeInsert, &mut working);

        let fields = self.hydrator.extract(&working, FieldKind::Field)?;
        let meta_fields = self.hydrator.extract(&working, FieldKind::MetaField)?;

        self.ensure_schema().await?;
        self.check_identity_constraints(&working).await?;

        let params = InsertParams {
            id: meta_fields.get(ID_META_FIELD).and_then(value_as_id),
            ..InsertParams::default()
        };

        let descriptor = self.descriptor();
        let response = self
            .connection
            .insert(descriptor.index_name(), descriptor.type_name(), &fields, &params)
            .await?;
        let response = Self::require_success("insert", response)?;

        self.hydrate_from_response(&mut working, response)?;
        *entity = working;
        self.notify(LifecycleEvent::PostInsert, entity);
        Ok(())
    }

    /// Create the index with the type mapping, or only the type when the
    /// index already exists.
    async fn ensure_schema(&self) -> Result<(), OdmError> {
        let descriptor = self.descriptor();
        let index = descriptor.index_name();
        let type_name = descriptor.type_name();

        let mappings = descriptor.type_mappings();
        let (operation, acknowledged) = if !self.connection.index_exists(index).await? {
            let acknowledged = self
                .connection
                .create_index(index, Some(&mappings), None)
                .await?;
            ("create_index", acknowledged)
        } else if !self.connection.type_exists(index, type_name).await? {
            let acknowledged = self
                .connection
                .create_type(index, type_name, &mappings)
                .await?;
            ("create_type", acknowledged)
        } else {
            return Ok(());
        };

        if !acknowledged {
            return Err(OdmError::operation_failed(
                operation,
                json!({ "acknowledged": false, "index": index, "type": type_name }),
            ));
        }

        info!(index = %index, type_name = %type_name, operation, "Created entity schema");
        Ok(())
    }

    /// Fail if another document already holds one of the entity's identifier
    /// values. Absent and null identifiers are not checked.
    pub async fn check_identity_constraints(&self, entity: &E) -> Result<(), OdmError> {
        for property in self.descriptor().identifiers() {
            let Some(value) = self.hydrator.property_value(entity, property)? else {
                continue;
            };

            let criteria = SearchCriteria::by(property.as_str(), value.clone());
            if self.load(&criteria, None).await?.is_some() {
                return Err(OdmError::constraint_violation(property.as_str(), &value));
            }
        }

        Ok(())
    }

    /// Write the entity's field values onto its existing document and
    /// rehydrate it from the response.
    pub async fn update(&self, entity: &mut E) -> Result<(), OdmError> {
        let id = self.require_document_id(entity)?;
        let fields = self.hydrator.extract(entity, FieldKind::Field)?;

        let descriptor = self.descriptor();
        let response = self
            .connection
            .update(
                descriptor.index_name(),
                descriptor.type_name(),
                &id,
                &fields,
                &UpdateParams::default(),
            )
            .await?;
        let response = Self::require_success("update", response)?;

        self.hydrate_from_response(entity, response)
    }

    pub async fn delete(&self, entity: &E) -> Result<(), OdmError> {
        let id = self.require_document_id(entity)?;

        let descriptor = self.descriptor();
        let response = self
            .connection
            .delete(
                descriptor.index_name(),
                descriptor.type_name(),
                &id,
                &DeleteParams::default(),
            )
            .await?;
        Self::require_success("delete", response)?;

        debug!(index = descriptor.index_name(), id = %id, "Deleted entity");
        Ok(())
    }

    /// Fetch a document by id and hydrate it into `entity`, or into a new
    /// entity when none is given.
    ///
    /// The id is read from the `_id` criteria key, then from the property
    /// bound to `_id`, then from the first criteria value.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(E))` - If the document exists
    /// * `Ok(None)` - If it does not
    /// * `Err(OdmError::InvalidArgument)` - If the criteria carry no usable id
    pub async fn load_by_id(
        &self,
        criteria: &SearchCriteria,
        entity: Option<E>,
    ) -> Result<Option<E>, OdmError> {
        let descriptor = self.descriptor();
        let id = criteria
            .get(ID_META_FIELD)
            .or_else(|| {
                descriptor
                    .id_binding()
                    .and_then(|binding| criteria.get(&binding.property))
            })
            .or_else(|| criteria.first())
            .and_then(value_as_id)
            .ok_or_else(|| {
                OdmError::invalid_argument(format!(
                    "no document id given to load {} entity",
                    descriptor.entity()
                ))
            })?;

        let envelope = self
            .connection
            .get(
                descriptor.index_name(),
                descriptor.type_name(),
                &id,
                &GetParams::default(),
            )
            .await?;

        let Some(result) = envelope.and_then(SearchResult::from_value) else {
            return Ok(None);
        };

        let mut entity = entity.unwrap_or_default();
        self.hydrator.hydrate(&mut entity, &result)?;
        Ok(Some(entity))
    }

    fn notify(&self, event: LifecycleEvent, entity: &mut E) {
        for listener in &self.listeners {
            listener.notify(event, entity);
        }
    }

    fn require_document_id(&self, entity: &E) -> Result<String, OdmError> {
        self.hydrator.document_id(entity)?.ok_or_else(|| {
            OdmError::invalid_argument(format!(
                "{} entity has no document id",
                self.descriptor().entity()
            ))
        })
    }

    fn require_success(operation: &str, response: WriteResponse) -> Result<Value, OdmError> {
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(OdmError::operation_failed(operation, response.body))
        }
    }

    fn hydrate_from_response(&self, entity: &mut E, response: Value) -> Result<(), OdmError> {
        match SearchResult::from_value(response) {
            Some(result) => self.hydrator.hydrate(entity, &result),
            None => Ok(()),
        }
    }

    /// `{"query": {"bool": {"must": [{"match": {field: value}}, ...]}}}`
    /// plus a `sort` clause when order keys are given.
    fn search_body(
        &self,
        criteria: &SearchCriteria,
        order_by: Option<&OrderBy>,
    ) -> Result<Value, OdmError> {
        let descriptor = self.descriptor();

        let must = criteria
            .iter()
            .map(|(property, value)| {
                let mut clause = Map::new();
                clause.insert(
                    descriptor.field_name_for(property)?.to_string(),
                    value.clone(),
                );
                Ok(json!({ "match": Value::Object(clause) }))
            })
            .collect::<Result<Vec<_>, OdmError>>()?;

        let mut body = json!({ "query": { "bool": { "must": must } } });

        if let Some(order_by) = order_by.filter(|o| !o.is_empty()) {
            let sort = order_by
                .iter()
                .map(|(property, order)| {
                    let mut clause = Map::new();
                    clause.insert(
                        descriptor.field_name_for(property)?.to_string(),
                        json!({ "order": order.as_str() }),
                    );
                    Ok(Value::Object(clause))
                })
                .collect::<Result<Vec<_>, OdmError>>()?;
            body["sort"] = Value::Array(sort);
        }

        Ok(body)
    }
}
