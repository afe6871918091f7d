//! Generic CRUD operations over entities.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use query_engine_execution::Connection;
use query_engine_metadata::metadata::{DescriptorCache, EntityDescriptor, ScalarType};
use query_engine_sql::sql::string::SQL;
use query_engine_sql::sql::{Dialect, Value};
use query_engine_translation::translation::expression::Expr;
use query_engine_translation::translation::options::TranslationOptions;
use query_engine_translation::translation::query::{Assignments, QueryBuilder};
use query_engine_translation::translation::statements::{self, StatementContext};

use crate::entity::Entity;
use crate::error::Error;
use crate::mapping;

/// Whether `insert` should read back the key the database generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnIdentity {
    Skip,
    Fetch,
}

/// What `save` did.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The entity was new. `id` is its key, as written back onto it.
    Inserted { id: Value },
    /// The entity was stored already.
    Updated { rows: u64 },
}

/// What `create_table_if_not_exists` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCreation {
    Created,
    AlreadyExisted,
}

/// Typed access to one database.
///
/// Cheap to clone; clones share the connection pool and the descriptor cache.
#[derive(Clone)]
pub struct Database {
    connection: Arc<dyn Connection>,
    context: StatementContext,
    descriptors: Arc<DescriptorCache>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("context", &self.context)
            .field("descriptors", &self.descriptors)
            .finish_non_exhaustive()
    }
}

impl Database {
    pub fn new(connection: Arc<dyn Connection>, options: TranslationOptions) -> Self {
        let context = StatementContext::new(connection.dialect(), options);
        Database {
            connection,
            context,
            descriptors: Arc::new(DescriptorCache::new()),
        }
    }

    /// Share a descriptor cache with other databases.
    #[must_use]
    pub fn with_descriptor_cache(mut self, descriptors: Arc<DescriptorCache>) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.context.dialect
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn descriptor<T: Entity>(&self) -> Arc<EntityDescriptor> {
        self.descriptors.get_or_compute::<T>(T::describe)
    }

    /// A builder over the entity's table, for this database's dialect.
    pub fn query_builder<T: Entity>(&self) -> QueryBuilder {
        QueryBuilder::with_options(
            self.descriptor::<T>().table_name.clone(),
            self.context.dialect,
            self.context.options,
        )
    }

    async fn fetch<T: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        statement: &SQL,
    ) -> Result<Vec<T>, Error> {
        let rows = self.connection.query(statement).await?;
        async {
            rows.into_iter()
                .map(|row| mapping::from_row(row, descriptor, self.connection.type_handlers()))
                .collect::<Result<Vec<T>, Error>>()
        }
        .instrument(info_span!("Map rows", table = %descriptor.table_name))
        .await
    }

    async fn fetch_count(&self, statement: &SQL) -> Result<i64, Error> {
        match self.connection.execute_scalar(statement).await? {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Int(count)) => Ok(count),
            Some(other) => Err(Error::UnexpectedScalar(other)),
        }
    }

    // SELECTs //

    pub async fn select_all<T: Entity>(&self) -> Result<Vec<T>, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::select_all(&self.context, &descriptor);
        self.fetch(&descriptor, &statement).await
    }

    pub async fn select_where<T: Entity>(&self, predicate: &Expr) -> Result<Vec<T>, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::select_where(&self.context, &descriptor, predicate, None)?;
        self.fetch(&descriptor, &statement).await
    }

    /// Run a builder made with [`Database::query_builder`].
    pub async fn select_query<T: Entity>(&self, query: &QueryBuilder) -> Result<Vec<T>, Error> {
        let descriptor = self.descriptor::<T>();
        self.fetch(&descriptor, &query.to_select_statement()).await
    }

    pub async fn single_by_id<T: Entity>(
        &self,
        id: impl Into<Value> + Send,
    ) -> Result<Option<T>, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::select_by_key(&self.context, &descriptor, id.into())?;
        Ok(self.fetch(&descriptor, &statement).await?.into_iter().next())
    }

    /// The row matching the predicate. When several match, the first one returned.
    pub async fn single_where<T: Entity>(&self, predicate: &Expr) -> Result<Option<T>, Error> {
        Ok(self.select_where(predicate).await?.into_iter().next())
    }

    /// The first matching row, or `NoMatchingRow`.
    pub async fn first<T: Entity>(&self, predicate: &Expr) -> Result<T, Error> {
        self.first_or_default(predicate)
            .await?
            .ok_or_else(|| Error::NoMatchingRow(self.descriptor::<T>().table_name.clone()))
    }

    pub async fn first_or_default<T: Entity>(&self, predicate: &Expr) -> Result<Option<T>, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::select_where(&self.context, &descriptor, predicate, Some(1))?;
        Ok(self.fetch(&descriptor, &statement).await?.into_iter().next())
    }

    pub async fn count<T: Entity>(&self, predicate: Option<&Expr>) -> Result<i64, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::count(&self.context, &descriptor, predicate)?;
        self.fetch_count(&statement).await
    }

    /// Count the rows of a builder made with [`Database::query_builder`].
    pub async fn count_query(&self, query: &QueryBuilder) -> Result<i64, Error> {
        self.fetch_count(&query.to_count_statement()).await
    }

    pub async fn exists<T: Entity>(&self, predicate: &Expr) -> Result<bool, Error> {
        Ok(self.count::<T>(Some(predicate)).await? > 0)
    }

    // INSERTs //

    /// Insert one entity. Returns the generated key when asked to, and 0 otherwise.
    pub async fn insert<T: Entity>(
        &self,
        entity: &T,
        identity: ReturnIdentity,
    ) -> Result<i64, Error> {
        let descriptor = self.descriptor::<T>();
        let values = mapping::to_column_values(entity, &descriptor)?;
        let statement = statements::insert(
            &self.context,
            &descriptor,
            &[values],
            identity == ReturnIdentity::Fetch,
        );
        match identity {
            ReturnIdentity::Skip => {
                self.connection.execute(&statement).await?;
                Ok(0)
            }
            ReturnIdentity::Fetch => self.fetch_count(&statement).await,
        }
    }

    /// Insert every entity with one multi-row statement.
    pub async fn insert_all<T: Entity>(&self, entities: &[T]) -> Result<u64, Error> {
        if entities.is_empty() {
            return Ok(0);
        }
        let descriptor = self.descriptor::<T>();
        let rows = entities
            .iter()
            .map(|entity| mapping::to_column_values(entity, &descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        let statement = statements::insert(&self.context, &descriptor, &rows, false);
        Ok(self.connection.execute(&statement).await?)
    }

    // UPDATEs //

    /// Update every writable column of a stored entity, found by its key.
    pub async fn update<T: Entity>(&self, entity: &T) -> Result<u64, Error> {
        let descriptor = self.descriptor::<T>();
        statements::key_column(&descriptor)?;
        let values = mapping::to_column_values(entity, &descriptor)?;
        let statement = statements::update(&self.context, &descriptor, &values)?;
        Ok(self.connection.execute(&statement).await?)
    }

    /// Apply the assignments to every row matching the predicate.
    pub async fn update_only<T: Entity>(
        &self,
        assignments: &Assignments,
        predicate: &Expr,
    ) -> Result<u64, Error> {
        let descriptor = self.descriptor::<T>();
        let statement =
            statements::update_where(&self.context, &descriptor, assignments, predicate)?;
        Ok(self.connection.execute(&statement).await?)
    }

    /// Update each entity in turn. Stops at the first failure.
    pub async fn update_all<T: Entity>(&self, entities: &[T]) -> Result<u64, Error> {
        let mut rows_affected = 0;
        for entity in entities {
            rows_affected += self.update(entity).await?;
        }
        Ok(rows_affected)
    }

    // DELETEs //

    pub async fn delete<T: Entity>(&self, entity: &T) -> Result<u64, Error> {
        let descriptor = self.descriptor::<T>();
        let key_column = statements::key_column(&descriptor)?;
        let key = mapping::column_value(entity, &descriptor, key_column)?;
        let statement = statements::delete_by_key(&self.context, &descriptor, key)?;
        Ok(self.connection.execute(&statement).await?)
    }

    pub async fn delete_by_id<T: Entity>(&self, id: impl Into<Value> + Send) -> Result<u64, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::delete_by_key(&self.context, &descriptor, id.into())?;
        Ok(self.connection.execute(&statement).await?)
    }

    pub async fn delete_where<T: Entity>(&self, predicate: &Expr) -> Result<u64, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::delete_where(&self.context, &descriptor, predicate)?;
        Ok(self.connection.execute(&statement).await?)
    }

    /// Delete every entity with one statement over their keys.
    pub async fn delete_all<T: Entity>(&self, entities: &[T]) -> Result<u64, Error> {
        if entities.is_empty() {
            return Ok(0);
        }
        let descriptor = self.descriptor::<T>();
        let key_column = statements::key_column(&descriptor)?;
        let keys = entities
            .iter()
            .map(|entity| mapping::column_value(entity, &descriptor, key_column))
            .collect::<Result<Vec<_>, _>>()?;
        let statement = statements::delete_by_keys(&self.context, &descriptor, keys)?;
        Ok(self.connection.execute(&statement).await?)
    }

    // Upsert //

    /// Insert the entity if its key is unset, update it otherwise.
    ///
    /// A new entity gets its key written back: the generated identity for an
    /// auto-increment key, a fresh v4 UUID for a nil UUID key.
    pub async fn save<T: Entity>(&self, entity: &mut T) -> Result<SaveOutcome, Error> {
        let descriptor = self.descriptor::<T>();
        let key_column = statements::key_column(&descriptor)?.clone();
        let key = mapping::column_value(entity, &descriptor, &key_column)?;

        if !mapping::is_unsaved_key(&key) {
            let rows = self.update(entity).await?;
            return Ok(SaveOutcome::Updated { rows });
        }

        let id = if key_column.is_auto_increment && key_column.scalar_type.is_integral() {
            let id = Value::Int(self.insert(entity, ReturnIdentity::Fetch).await?);
            mapping::set_column(entity, &descriptor, &key_column, id.clone())?;
            id
        } else if key_column.scalar_type == ScalarType::Uuid {
            // the key has to be in place before the row is written
            let id = Value::Uuid(uuid::Uuid::new_v4());
            mapping::set_column(entity, &descriptor, &key_column, id.clone())?;
            self.insert(entity, ReturnIdentity::Skip).await?;
            id
        } else {
            self.insert(entity, ReturnIdentity::Skip).await?;
            key
        };
        tracing::debug!(table = %descriptor.table_name, id = ?id, "saved new entity");
        Ok(SaveOutcome::Inserted { id })
    }

    // DDL //

    pub async fn table_exists<T: Entity>(&self) -> Result<bool, Error> {
        let descriptor = self.descriptor::<T>();
        let statement = statements::table_exists(&descriptor, self.context.dialect);
        Ok(self.fetch_count(&statement).await? > 0)
    }

    /// Create the entity's table and its indexes unless the table exists.
    pub async fn create_table_if_not_exists<T: Entity>(&self) -> Result<TableCreation, Error> {
        if self.table_exists::<T>().await? {
            return Ok(TableCreation::AlreadyExisted);
        }
        let descriptor = self.descriptor::<T>();
        let dialect = self.context.dialect;
        self.connection
            .execute_ddl(&statements::create_table(&descriptor, dialect))
            .await?;
        for index in statements::create_indexes(&descriptor, dialect) {
            match self.connection.execute_ddl(&index).await {
                Ok(_) => {}
                // no IF NOT EXISTS for indexes on the client-server backend
                Err(error) if dialect == Dialect::ClientServer && error.is_duplicate_index() => {
                    tracing::debug!(table = %descriptor.table_name, "index exists already");
                }
                Err(error) => return Err(error.into()),
            }
        }
        tracing::info!(table = %descriptor.table_name, "created table");
        Ok(TableCreation::Created)
    }
}
