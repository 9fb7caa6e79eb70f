//! Lexically nested symbol tables.
//!
//! Records are allocated from a chunked arena (2048 records per chunk) and
//! referenced by stable `RecordId` indices; tables map names to record ids
//! and chain to their lexical parent. Lookup walks the chain to the first
//! match.

use std::fmt;

use rustc_hash::FxHashMap;

use refu_ir::{StrId, TypeRef};

/// Records per arena chunk.
const RECORDS_CHUNK_SIZE: usize = 2048;

/// Opaque link from a name to the RIR object realizing it in the current
/// function (an alloca's value index during lowering).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct BackendHandle(pub u32);

/// One symbol table entry.
#[derive(Debug)]
pub struct Record {
    pub name: StrId,
    /// The semantic type. Unannotated `let` bindings get this filled
    /// during typecheck rather than the first pass.
    pub ty: Option<TypeRef>,
    /// Filled by the RIR builder.
    pub backend: Option<BackendHandle>,
}

/// Stable index of a record in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct RecordId(u32);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

/// Chunked record storage. A chunk is never reallocated once created, so
/// record indices stay stable for the analyzer's lifetime; the whole
/// arena is dropped in one operation at teardown.
#[derive(Default)]
struct RecordArena {
    chunks: Vec<Vec<Record>>,
}

impl RecordArena {
    fn alloc(&mut self, record: Record) -> RecordId {
        if self
            .chunks
            .last()
            .map_or(true, |c| c.len() >= RECORDS_CHUNK_SIZE)
        {
            self.chunks.push(Vec::with_capacity(RECORDS_CHUNK_SIZE));
        }
        let chunk_idx = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_idx];
        let id = RecordId((chunk_idx * RECORDS_CHUNK_SIZE + chunk.len()) as u32);
        chunk.push(record);
        id
    }

    fn get(&self, id: RecordId) -> &Record {
        let idx = id.0 as usize;
        &self.chunks[idx / RECORDS_CHUNK_SIZE][idx % RECORDS_CHUNK_SIZE]
    }

    fn get_mut(&mut self, id: RecordId) -> &mut Record {
        let idx = id.0 as usize;
        &mut self.chunks[idx / RECORDS_CHUNK_SIZE][idx % RECORDS_CHUNK_SIZE]
    }
}

/// Index of one table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct TableId(u32);

struct TableData {
    parent: Option<TableId>,
    map: FxHashMap<StrId, RecordId>,
    /// Insertion order, for deterministic iteration.
    order: Vec<RecordId>,
}

/// A record with this name already exists in the same scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSymbol {
    pub name: StrId,
    pub existing: RecordId,
}

/// All symbol tables of one module, plus the shared record arena.
#[derive(Default)]
pub struct SymbolTables {
    tables: Vec<TableData>,
    records: RecordArena,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_table(&mut self, parent: Option<TableId>) -> TableId {
        let id = TableId(self.tables.len() as u32);
        self.tables.push(TableData {
            parent,
            map: FxHashMap::default(),
            order: Vec::new(),
        });
        id
    }

    pub fn parent(&self, table: TableId) -> Option<TableId> {
        self.tables[table.0 as usize].parent
    }

    /// Add a record to `table`.
    ///
    /// Fails if the name already exists in this scope; shadowing an outer
    /// scope is fine.
    pub fn add(
        &mut self,
        table: TableId,
        name: StrId,
        ty: Option<TypeRef>,
    ) -> Result<RecordId, DuplicateSymbol> {
        let data = &self.tables[table.0 as usize];
        if let Some(&existing) = data.map.get(&name) {
            return Err(DuplicateSymbol { name, existing });
        }
        let id = self.records.alloc(Record {
            name,
            ty,
            backend: None,
        });
        let data = &mut self.tables[table.0 as usize];
        data.map.insert(name, id);
        data.order.push(id);
        Ok(id)
    }

    /// Find a record in `table` or any lexical ancestor.
    pub fn lookup(&self, table: TableId, name: StrId) -> Option<RecordId> {
        let mut current = Some(table);
        while let Some(t) = current {
            let data = &self.tables[t.0 as usize];
            if let Some(&id) = data.map.get(&name) {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    /// Find a record in `table` only.
    pub fn lookup_local(&self, table: TableId, name: StrId) -> Option<RecordId> {
        self.tables[table.0 as usize].map.get(&name).copied()
    }

    /// Visit this scope's records exactly once, in insertion order.
    pub fn iterate(&self, table: TableId) -> impl Iterator<Item = RecordId> + '_ {
        self.tables[table.0 as usize].order.iter().copied()
    }

    pub fn record(&self, id: RecordId) -> &Record {
        self.records.get(id)
    }

    pub fn record_mut(&mut self, id: RecordId) -> &mut Record {
        self.records.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use refu_types::TypeSet;

    fn name(s: &str) -> StrId {
        StrId::of(s)
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut st = SymbolTables::new();
        let outer = st.new_table(None);
        let inner = st.new_table(Some(outer));

        let a = st.add(outer, name("a"), Some(TypeSet::nil())).unwrap();
        assert_eq!(st.lookup(inner, name("a")), Some(a));
        assert_eq!(st.lookup_local(inner, name("a")), None);
    }

    #[test]
    fn duplicate_in_same_scope_fails() {
        let mut st = SymbolTables::new();
        let t = st.new_table(None);
        st.add(t, name("x"), None).unwrap();
        let err = st.add(t, name("x"), None).unwrap_err();
        assert_eq!(err.name, name("x"));
    }

    #[test]
    fn shadowing_outer_scope_is_allowed() {
        let mut st = SymbolTables::new();
        let outer = st.new_table(None);
        let inner = st.new_table(Some(outer));
        let o = st.add(outer, name("x"), None).unwrap();
        let i = st.add(inner, name("x"), None).unwrap();
        assert_ne!(o, i);
        assert_eq!(st.lookup(inner, name("x")), Some(i));
        assert_eq!(st.lookup(outer, name("x")), Some(o));
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut st = SymbolTables::new();
        let t = st.new_table(None);
        let ids: Vec<RecordId> = ["c", "a", "b"]
            .iter()
            .map(|s| st.add(t, name(s), None).unwrap())
            .collect();
        let seen: Vec<RecordId> = st.iterate(t).collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn arena_ids_stay_stable_across_chunks() {
        let mut st = SymbolTables::new();
        let t = st.new_table(None);
        let mut first = None;
        for i in 0..(RECORDS_CHUNK_SIZE + 10) {
            let id = st.add(t, name(&format!("sym{i}")), None).unwrap();
            if i == 0 {
                first = Some(id);
            }
        }
        let first = first.unwrap();
        assert_eq!(st.record(first).name, name("sym0"));
    }
}
