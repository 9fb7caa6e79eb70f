//! The RIR module and typedef emission.

use crate::{RirFunction, RirTypeKind, RirTypeList};

/// One emitted type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RirTypedef {
    pub name: String,
    /// `(field name, field type name)` pairs, in declaration order.
    pub fields: Vec<(String, String)>,
}

/// A fully lowered module.
#[derive(Debug)]
pub struct RirModule {
    pub name: String,
    pub types: RirTypeList,
    pub typedefs: Vec<RirTypedef>,
    pub functions: Vec<RirFunction>,
    /// Global string literals in first-use order; values reference them
    /// as `@strN`.
    pub global_literals: Vec<String>,
    /// Names of the modules this one depends on.
    pub deps: Vec<String>,
    rendered: Option<String>,
}

impl RirModule {
    pub(crate) fn new(name: String, types: RirTypeList, deps: Vec<String>) -> Self {
        let typedefs = emit_typedefs(&types);
        Self {
            name,
            types,
            typedefs,
            functions: Vec::new(),
            global_literals: Vec::new(),
            deps,
            rendered: None,
        }
    }

    /// The byte-stable textual form. Rendered once and cached.
    pub fn to_text(&mut self) -> &str {
        if self.rendered.is_none() {
            self.rendered = Some(crate::fmt::render(self));
        }
        self.rendered.as_deref().unwrap_or_default()
    }

    /// Render without caching.
    pub fn render(&self) -> String {
        crate::fmt::render(self)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&RirFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn typedef_by_name(&self, name: &str) -> Option<&RirTypedef> {
        self.typedefs.iter().find(|t| t.name == name)
    }
}

/// Emit typedefs for every composite, non-elementary, non-implication
/// entry: defined records, sum-variant payload records (as
/// `internal_struct{uid}`), and defined sums (payload slot plus the
/// trailing `selector:i32`). List order keeps payload records ahead of
/// the sums that use them. Anonymous argument products emit nothing.
fn emit_typedefs(types: &RirTypeList) -> Vec<RirTypedef> {
    let mut out = Vec::new();
    for (id, t) in types.iter() {
        match t.kind {
            RirTypeKind::Defined => {
                let fields = t
                    .subtypes
                    .iter()
                    .enumerate()
                    .map(|(i, &sub)| {
                        let fname = t.member_names[i]
                            .clone()
                            .unwrap_or_else(|| format!("m{i}"));
                        (fname, types.type_name(sub))
                    })
                    .collect();
                out.push(RirTypedef {
                    name: types.type_name(id),
                    fields,
                });
            }
            RirTypeKind::Product { internal: true } => {
                let fields = t
                    .subtypes
                    .iter()
                    .enumerate()
                    .map(|(i, &sub)| {
                        let fname = t.member_names[i]
                            .clone()
                            .unwrap_or_else(|| format!("m{i}"));
                        (fname, types.type_name(sub))
                    })
                    .collect();
                out.push(RirTypedef {
                    name: types.type_name(id),
                    fields,
                });
            }
            RirTypeKind::Sum if t.name.is_some() => {
                // payload slot is sized by the largest variant
                let payload = largest_variant(types, &t.subtypes);
                let mut fields = Vec::with_capacity(2);
                if let Some(payload) = payload {
                    fields.push(("contents".to_string(), types.type_name(payload)));
                }
                fields.push(("selector".to_string(), "i32".to_string()));
                out.push(RirTypedef {
                    name: types.type_name(id),
                    fields,
                });
            }
            _ => {}
        }
    }
    out
}

/// Pick the variant with the largest payload; ties go to the first.
fn largest_variant(
    types: &RirTypeList,
    variants: &[crate::RirTypeId],
) -> Option<crate::RirTypeId> {
    // max_by_key keeps the last maximum; reversing makes ties land on
    // the first variant
    variants
        .iter()
        .copied()
        .rev()
        .max_by_key(|&v| payload_size(types, v))
}

fn payload_size(types: &RirTypeList, id: crate::RirTypeId) -> u32 {
    let t = types.get(id);
    match t.kind {
        RirTypeKind::Elementary(kind) => kind.byte_size(),
        _ => t.subtypes.iter().map(|&s| payload_size(types, s)).sum(),
    }
}
