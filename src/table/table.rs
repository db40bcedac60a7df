//! Table: a named collection of documents over a shared storage.
//!
//! Every mutation is one read-modify-write cycle on the whole database
//! snapshot. Search results are memoized per structural query key and the
//! memo is dropped after every mutation, so a cached result never outlives the
//! data it was computed from.
//!
//! The id counter is computed once from storage and then advanced locally.
//! Another writer inserting into the same table through a different handle is
//! not observed; such an insert surfaces as `DuplicateId` on the next collision.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::cache::{CacheStats, LruCache};
use crate::document::{DocId, Document, Fields};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{Frozen, QueryLike};
use crate::storage::{Storage, TableSnapshot};

use super::errors::{TableError, TableResult};
use super::operations::Update;

/// Default number of search results memoized per table.
pub const DEFAULT_QUERY_CACHE_SIZE: usize = 10;

/// A named collection of documents.
pub struct Table<S: Storage> {
    storage: Rc<RefCell<S>>,
    name: String,
    query_cache: LruCache<Frozen, Vec<Document>>,
    next_id: Option<DocId>,
}

impl<S: Storage> Table<S> {
    /// Open table `name` with the default query cache size.
    pub fn new(storage: Rc<RefCell<S>>, name: impl Into<String>) -> Self {
        Self::with_cache_size(storage, name, Some(DEFAULT_QUERY_CACHE_SIZE))
    }

    /// Open table `name`; `None` means an unbounded query cache.
    pub fn with_cache_size(
        storage: Rc<RefCell<S>>,
        name: impl Into<String>,
        cache_size: Option<usize>,
    ) -> Self {
        Self {
            storage,
            name: name.into(),
            query_cache: LruCache::new(cache_size),
            next_id: None,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared storage handle
    pub fn storage(&self) -> &Rc<RefCell<S>> {
        &self.storage
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every document, ids ascending. Never cached.
    pub fn all(&self) -> TableResult<Vec<Document>> {
        Ok(self.iter()?.collect())
    }

    /// Iterate over a snapshot of the table, ids ascending.
    pub fn iter(&self) -> TableResult<impl Iterator<Item = Document>> {
        Ok(self
            .read_table()?
            .into_iter()
            .map(|(id, fields)| Document::new(id, fields)))
    }

    /// All documents matching `cond`.
    ///
    /// Results for cacheable queries are memoized until the next mutation.
    pub fn search(&mut self, cond: &dyn QueryLike) -> TableResult<Vec<Document>> {
        let key = cond.structural_key();

        if let Some(key) = &key {
            if let Some(cached) = self.query_cache.get(key) {
                log_event_with_fields(Event::QueryCacheHit, &[("table", &self.name)]);
                return Ok(cached.clone());
            }
            log_event_with_fields(Event::QueryCacheMiss, &[("table", &self.name)]);
        }

        let docs: Vec<Document> = self
            .iter()?
            .filter(|doc| cond.evaluate(&doc.fields))
            .collect();

        if let Some(key) = key {
            self.query_cache.set(key, docs.clone());
        }
        Ok(docs)
    }

    /// First document matching `cond`, ids ascending.
    pub fn get(&mut self, cond: &dyn QueryLike) -> TableResult<Option<Document>> {
        Ok(self.search(cond)?.into_iter().next())
    }

    /// Document with id `doc_id`.
    pub fn get_by_id(&self, doc_id: DocId) -> TableResult<Option<Document>> {
        let mut table = self.read_table()?;
        Ok(table
            .remove(&doc_id)
            .map(|fields| Document::new(doc_id, fields)))
    }

    /// Documents with the given ids, ids ascending, each at most once.
    ///
    /// Unknown ids are skipped; `None` when no id was found.
    pub fn get_by_ids(&self, doc_ids: &[DocId]) -> TableResult<Option<Vec<Document>>> {
        let wanted: BTreeSet<DocId> = doc_ids.iter().copied().collect();
        let docs: Vec<Document> = self
            .iter()?
            .filter(|doc| wanted.contains(&doc.id))
            .collect();

        Ok(if docs.is_empty() { None } else { Some(docs) })
    }

    /// Whether any document matches `cond`
    pub fn contains(&mut self, cond: &dyn QueryLike) -> TableResult<bool> {
        Ok(self.get(cond)?.is_some())
    }

    /// Whether a document with `doc_id` exists
    pub fn contains_id(&self, doc_id: DocId) -> TableResult<bool> {
        Ok(self.read_table()?.contains_key(&doc_id))
    }

    /// Number of documents matching `cond`
    pub fn count(&mut self, cond: &dyn QueryLike) -> TableResult<usize> {
        Ok(self.search(cond)?.len())
    }

    /// Number of documents in the table
    pub fn len(&self) -> TableResult<usize> {
        Ok(self.read_table()?.len())
    }

    /// Whether the table holds no documents
    pub fn is_empty(&self) -> TableResult<bool> {
        Ok(self.read_table()?.is_empty())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a document, returning its new id.
    pub fn insert(&mut self, fields: Fields) -> TableResult<DocId> {
        let doc_id = self.get_next_id()?;

        self.update_table(|table| {
            if table.contains_key(&doc_id) {
                return Err(TableError::DuplicateId(doc_id));
            }
            table.insert(doc_id, fields);
            Ok(())
        })?;

        self.log_mutation(Event::TableInsert, 1);
        Ok(doc_id)
    }

    /// Insert a document under its own id.
    ///
    /// Fails with `DuplicateId` if the id is taken. The id counter is
    /// recomputed on the next insert.
    pub fn insert_document(&mut self, document: Document) -> TableResult<DocId> {
        let Document { id, fields } = document;
        self.next_id = None;

        self.update_table(|table| {
            if table.contains_key(&id) {
                return Err(TableError::DuplicateId(id));
            }
            table.insert(id, fields);
            Ok(())
        })?;

        self.log_mutation(Event::TableInsert, 1);
        Ok(id)
    }

    /// Insert several documents in one write, returning their ids in order.
    pub fn insert_multiple<I>(&mut self, documents: I) -> TableResult<Vec<DocId>>
    where
        I: IntoIterator<Item = Fields>,
    {
        let mut batch = Vec::new();
        for fields in documents {
            batch.push((self.get_next_id()?, fields));
        }

        let doc_ids = self.update_table(|table| {
            let mut doc_ids = Vec::with_capacity(batch.len());
            for (doc_id, fields) in batch {
                if table.contains_key(&doc_id) {
                    return Err(TableError::DuplicateId(doc_id));
                }
                table.insert(doc_id, fields);
                doc_ids.push(doc_id);
            }
            Ok(doc_ids)
        })?;

        self.log_mutation(Event::TableInsert, doc_ids.len());
        Ok(doc_ids)
    }

    /// Apply `update` to every matching document.
    ///
    /// A document matches when its id is in `doc_ids` (if given) and it
    /// satisfies `cond` (if given). With neither, every document matches.
    /// Returns the ids of updated documents, ascending.
    pub fn update(
        &mut self,
        update: impl Into<Update>,
        cond: Option<&dyn QueryLike>,
        doc_ids: Option<&[DocId]>,
    ) -> TableResult<Vec<DocId>> {
        let update = update.into();

        let updated = self.update_table(|table| {
            let mut updated = Vec::new();
            for (id, fields) in table.iter_mut() {
                if is_selected(*id, fields, cond, doc_ids) {
                    update.apply(fields);
                    updated.push(*id);
                }
            }
            Ok(updated)
        })?;

        self.log_mutation(Event::TableUpdate, updated.len());
        Ok(updated)
    }

    /// Apply several `(update, cond)` pairs in one write.
    ///
    /// Pairs run in order per document, so later conditions see the changes
    /// made by earlier updates. Returns every updated id once, ascending.
    pub fn update_multiple(
        &mut self,
        updates: &[(Update, &dyn QueryLike)],
    ) -> TableResult<Vec<DocId>> {
        let updated = self.update_table(|table| {
            let mut updated = Vec::new();
            for (id, fields) in table.iter_mut() {
                let mut hit = false;
                for (update, cond) in updates {
                    if cond.evaluate(fields) {
                        update.apply(fields);
                        hit = true;
                    }
                }
                if hit {
                    updated.push(*id);
                }
            }
            Ok(updated)
        })?;

        self.log_mutation(Event::TableUpdate, updated.len());
        Ok(updated)
    }

    /// Update documents matching `cond` with `fields`, or insert `fields`
    /// as a new document when nothing matches.
    pub fn upsert(&mut self, fields: Fields, cond: &dyn QueryLike) -> TableResult<Vec<DocId>> {
        let updated = self.update(Update::Fields(fields.clone()), Some(cond), None)?;
        if !updated.is_empty() {
            return Ok(updated);
        }
        Ok(vec![self.insert(fields)?])
    }

    /// Update the document with the same id, or insert it under that id.
    pub fn upsert_document(&mut self, document: Document) -> TableResult<Vec<DocId>> {
        let ids = [document.id];
        let updated = self.update(Update::Fields(document.fields.clone()), None, Some(&ids))?;
        if !updated.is_empty() {
            return Ok(updated);
        }
        Ok(vec![self.insert_document(document)?])
    }

    /// Remove matching documents, returning their ids.
    ///
    /// Uses the same matching rule as `update`, but refuses to run with
    /// neither a condition nor ids. Use `truncate` to empty the table.
    pub fn remove(
        &mut self,
        cond: Option<&dyn QueryLike>,
        doc_ids: Option<&[DocId]>,
    ) -> TableResult<Vec<DocId>> {
        if cond.is_none() && doc_ids.is_none() {
            return Err(TableError::MissingSelector);
        }

        let removed = self.update_table(|table| {
            let mut removed = Vec::new();
            table.retain(|id, fields| {
                let selected = is_selected(*id, fields, cond, doc_ids);
                if selected {
                    removed.push(*id);
                }
                !selected
            });
            Ok(removed)
        })?;

        self.log_mutation(Event::TableRemove, removed.len());
        Ok(removed)
    }

    /// Remove every document and reset the id counter.
    pub fn truncate(&mut self) -> TableResult<()> {
        self.update_table(|table| {
            table.clear();
            Ok(())
        })?;
        self.next_id = None;

        log_event_with_fields(Event::TableTruncate, &[("table", &self.name)]);
        Ok(())
    }

    // ========================================================================
    // Query cache
    // ========================================================================

    /// Drop every memoized search result
    pub fn clear_cache(&mut self) {
        self.query_cache.clear();
    }

    /// Hit/miss counters of the query cache
    pub fn cache_stats(&self) -> &CacheStats {
        self.query_cache.stats()
    }

    /// The query cache, for inspection
    pub fn query_cache(&self) -> &LruCache<Frozen, Vec<Document>> {
        &self.query_cache
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn get_next_id(&mut self) -> TableResult<DocId> {
        if let Some(next) = self.next_id {
            self.next_id = Some(next + 1);
            return Ok(next);
        }

        let table = self.read_table()?;
        let next = table.keys().next_back().map_or(1, |max| max + 1);
        self.next_id = Some(next + 1);
        Ok(next)
    }

    /// This table's snapshot; empty when the table or database is absent.
    pub fn read_table(&self) -> TableResult<TableSnapshot> {
        let tables = self.storage.borrow_mut().read()?;
        Ok(tables
            .and_then(|mut tables| tables.remove(&self.name))
            .unwrap_or_default())
    }

    /// Run one read-modify-write cycle on this table's snapshot.
    ///
    /// Other tables in the database are written back untouched. When
    /// `updater` fails nothing is written. Once a write is attempted the
    /// query cache is cleared even if the write fails, since the storage may
    /// already hold part or all of the new state.
    fn update_table<F, R>(&mut self, updater: F) -> TableResult<R>
    where
        F: FnOnce(&mut TableSnapshot) -> TableResult<R>,
    {
        let mut storage = self.storage.borrow_mut();
        let mut tables = storage.read()?.unwrap_or_default();
        let mut table = tables.remove(&self.name).unwrap_or_default();

        let result = updater(&mut table)?;

        tables.insert(self.name.clone(), table);
        let written = storage.write(&tables);
        drop(storage);

        self.clear_cache();
        written?;
        Ok(result)
    }

    fn log_mutation(&self, event: Event, count: usize) {
        log_event_with_fields(
            event,
            &[("table", &self.name), ("count", &count.to_string())],
        );
    }
}

fn is_selected(
    doc_id: DocId,
    fields: &Fields,
    cond: Option<&dyn QueryLike>,
    doc_ids: Option<&[DocId]>,
) -> bool {
    doc_ids.map_or(true, |ids| ids.contains(&doc_id)) && cond.map_or(true, |c| c.evaluate(fields))
}

impl<S: Storage> fmt::Debug for Table<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("cached_queries", &self.query_cache.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
