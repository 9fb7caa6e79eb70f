//! The RIR type list.
//!
//! A denormalized, flat enumeration of every value-carrying type of one
//! module, built once from the module's (already merged) type set. Each
//! entry gets a unique integer UID: elementary types share their UIDs
//! across modules, composites count up per module. Sum-variant payload
//! records are their own entries, mangled `internal_struct{uid}`.
//!
//! The list is append-only after construction.

use rustc_hash::FxHashMap;
use tracing::trace;

use refu_ir::{StrId, StringTable, TypeOpKind, TypeRef};
use refu_types::{ElementaryKind, TypeData, TypeSet};

/// First UID handed to a composite entry. Elementary UIDs are below it.
const FIRST_COMPOSITE_UID: u32 = 16;

/// Index into a [`RirTypeList`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct RirTypeId(u32);

impl RirTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Category of a RIR type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RirTypeKind {
    Elementary(ElementaryKind),
    /// An ordered record of fields. `internal` marks sum-variant payload
    /// records, which are emitted as `internal_struct{uid}` typedefs.
    Product { internal: bool },
    /// A named user record.
    Defined,
    /// A discriminated union: payload record plus selector.
    Sum,
    /// A function signature: `[argument, return]` subtypes.
    Implication,
    /// Array marker; no surface syntax constructs these yet.
    Array,
}

/// One entry of the list.
#[derive(Debug)]
pub struct RirType {
    pub uid: u32,
    pub kind: RirTypeKind,
    /// Defined/sum name, resolved to owned text.
    pub name: Option<String>,
    pub subtypes: Vec<RirTypeId>,
    /// Field labels, parallel to `subtypes`.
    pub member_names: Vec<Option<String>>,
    /// The canonical type this entry was built from.
    pub source: Option<TypeRef>,
}

impl RirType {
    pub fn is_elementary(&self) -> bool {
        matches!(self.kind, RirTypeKind::Elementary(_))
    }

    pub fn is_sum(&self) -> bool {
        self.kind == RirTypeKind::Sum
    }
}

/// The per-module flat type enumeration.
#[derive(Debug)]
pub struct RirTypeList {
    types: Vec<RirType>,
    by_source: FxHashMap<TypeRef, RirTypeId>,
    by_name: FxHashMap<String, RirTypeId>,
    next_uid: u32,
}

impl RirTypeList {
    /// Build the list from a module's merged type set.
    ///
    /// Defined types convert first so that a defined sum and the
    /// anonymous sum operator that is its body share one entry; remaining
    /// anonymous operators (function argument products, signatures)
    /// convert afterwards. Generic entries carry no values and are
    /// skipped.
    pub fn from_type_set(set: &TypeSet, strings: &StringTable) -> Self {
        let mut list = Self {
            types: Vec::with_capacity(set.len()),
            by_source: FxHashMap::default(),
            by_name: FxHashMap::default(),
            next_uid: FIRST_COMPOSITE_UID,
        };

        for kind in ElementaryKind::ALL {
            let id = RirTypeId(list.types.len() as u32);
            list.types.push(RirType {
                uid: kind as u32,
                kind: RirTypeKind::Elementary(kind),
                name: None,
                subtypes: Vec::new(),
                member_names: Vec::new(),
                source: Some(TypeSet::elem(kind)),
            });
            list.by_source.insert(TypeSet::elem(kind), id);
        }

        // defined types first: their bodies claim the shared entries
        for (r, data) in set.iter_dynamic() {
            if matches!(data, TypeData::Defined { .. }) {
                list.convert(set, strings, r);
            }
        }
        for (r, _) in set.iter_dynamic() {
            list.convert(set, strings, r);
        }

        trace!(entries = list.types.len(), "rir type list built");
        list
    }

    pub fn get(&self, id: RirTypeId) -> &RirType {
        &self.types[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (RirTypeId, &RirType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (RirTypeId(i as u32), t))
    }

    /// The entry built from a canonical type, if it carries values.
    pub fn lookup_source(&self, source: TypeRef) -> Option<RirTypeId> {
        self.by_source.get(&source).copied()
    }

    /// Look up a defined type by name.
    pub fn lookup_defined(&self, name: &str) -> Option<RirTypeId> {
        self.by_name.get(name).copied()
    }

    /// All entries of one category.
    pub fn of_kind(&self, want: RirTypeKind) -> impl Iterator<Item = (RirTypeId, &RirType)> {
        self.iter().filter(move |(_, t)| t.kind == want)
    }

    /// Resolve an AST type expression that typecheck already stamped.
    pub fn get_type(&self, ast: &refu_ir::Ast, node: refu_ir::NodeId) -> Option<RirTypeId> {
        ast.resolved_type(node).and_then(|r| self.lookup_source(r))
    }

    /// The printable name of an entry, as it appears in `alloca` and
    /// typedef lines.
    pub fn type_name(&self, id: RirTypeId) -> String {
        let t = self.get(id);
        match t.kind {
            RirTypeKind::Elementary(kind) => kind.name().to_string(),
            RirTypeKind::Product { internal: true } => format!("internal_struct{}", t.uid),
            _ => t
                .name
                .clone()
                .unwrap_or_else(|| format!("internal_struct{}", t.uid)),
        }
    }

    fn push(&mut self, mut t: RirType) -> RirTypeId {
        t.uid = self.next_uid;
        self.next_uid += 1;
        let id = RirTypeId(self.types.len() as u32);
        if let Some(name) = &t.name {
            self.by_name.insert(name.clone(), id);
        }
        if let Some(source) = t.source {
            self.by_source.insert(source, id);
        }
        self.types.push(t);
        id
    }

    fn convert(&mut self, set: &TypeSet, strings: &StringTable, r: TypeRef) -> Option<RirTypeId> {
        if let Some(id) = self.by_source.get(&r) {
            return Some(*id);
        }
        match set.data(r) {
            TypeData::Elementary(kind) => Some(self.by_source[&TypeSet::elem(kind)]),
            TypeData::Generic { .. } => None,
            TypeData::Defined { name, body } => {
                let name_text = strings.get(name).unwrap_or("<unknown>").to_string();
                if set.data(body).is_sum() {
                    let variants = set.sum_operands(body);
                    let variant_ids: Vec<RirTypeId> = variants
                        .iter()
                        .filter_map(|&v| self.convert_variant(set, strings, v))
                        .collect();
                    if variant_ids.len() != variants.len() {
                        return None; // a generic variant: not lowerable
                    }
                    let member_names = vec![None; variant_ids.len()];
                    let id = self.push(RirType {
                        uid: 0,
                        kind: RirTypeKind::Sum,
                        name: Some(name_text),
                        subtypes: variant_ids,
                        member_names,
                        source: Some(r),
                    });
                    // the anonymous sum body is this same entry; mapping it
                    // here is what deduplicates defined sums
                    self.by_source.insert(body, id);
                    Some(id)
                } else {
                    let (subtypes, member_names) = self.convert_fields(set, strings, body)?;
                    Some(self.push(RirType {
                        uid: 0,
                        kind: RirTypeKind::Defined,
                        name: Some(name_text),
                        subtypes,
                        member_names,
                        source: Some(r),
                    }))
                }
            }
            TypeData::Operator { op, left, right } => match op {
                TypeOpKind::Implication => {
                    let arg = self.convert(set, strings, left)?;
                    let ret = self.convert(set, strings, right)?;
                    Some(self.push(RirType {
                        uid: 0,
                        kind: RirTypeKind::Implication,
                        name: None,
                        subtypes: vec![arg, ret],
                        member_names: vec![None, None],
                        source: Some(r),
                    }))
                }
                TypeOpKind::Sum => {
                    let variants = set.sum_operands(r);
                    let variant_ids: Vec<RirTypeId> = variants
                        .iter()
                        .filter_map(|&v| self.convert_variant(set, strings, v))
                        .collect();
                    if variant_ids.len() != variants.len() {
                        return None;
                    }
                    let member_names = vec![None; variant_ids.len()];
                    Some(self.push(RirType {
                        uid: 0,
                        kind: RirTypeKind::Sum,
                        name: None,
                        subtypes: variant_ids,
                        member_names,
                        source: Some(r),
                    }))
                }
                TypeOpKind::Product => {
                    let (subtypes, member_names) = self.convert_fields(set, strings, r)?;
                    Some(self.push(RirType {
                        uid: 0,
                        kind: RirTypeKind::Product { internal: false },
                        name: None,
                        subtypes,
                        member_names,
                        source: Some(r),
                    }))
                }
            },
            TypeData::Leaf { .. } => {
                let (subtypes, member_names) = self.convert_fields(set, strings, r)?;
                Some(self.push(RirType {
                    uid: 0,
                    kind: RirTypeKind::Product { internal: false },
                    name: None,
                    subtypes,
                    member_names,
                    source: Some(r),
                }))
            }
        }
    }

    /// Convert one sum operand into its payload record entry.
    fn convert_variant(
        &mut self,
        set: &TypeSet,
        strings: &StringTable,
        variant: TypeRef,
    ) -> Option<RirTypeId> {
        if let Some(id) = self.by_source.get(&variant) {
            return Some(*id);
        }
        let (subtypes, member_names) = self.convert_fields(set, strings, variant)?;
        Some(self.push(RirType {
            uid: 0,
            kind: RirTypeKind::Product { internal: true },
            name: None,
            subtypes,
            member_names,
            source: Some(variant),
        }))
    }

    /// Flatten a product/leaf body into (field types, field labels).
    #[allow(clippy::type_complexity)]
    fn convert_fields(
        &mut self,
        set: &TypeSet,
        strings: &StringTable,
        body: TypeRef,
    ) -> Option<(Vec<RirTypeId>, Vec<Option<String>>)> {
        let fields = set.product_fields(body);
        let mut subtypes = Vec::with_capacity(fields.len());
        let mut member_names = Vec::with_capacity(fields.len());
        for field in fields {
            let (label, inner) = set.leaf_parts(field);
            subtypes.push(self.convert(set, strings, inner)?);
            member_names.push(label.map(|l: StrId| {
                strings.get(l).unwrap_or("<unknown>").to_string()
            }));
        }
        Some((subtypes, member_names))
    }
}
