use super::ir::*;
use super::naming::{decode_name, encode_name};
use crate::model::registry::SupportedTypeRegistry;
use codec_types::TypeRef;
use std::collections::BTreeMap;

pub const DISPATCH_ROUTINE: &str = "lookup_codec";

/// Builds the lookup routine mapping every supported type (generated here or
/// known from earlier runs) to its routines. Entries are sorted by canonical
/// name; unlisted types go to the generic codec.
pub fn build_dispatch(namespace: &str, registry: &SupportedTypeRegistry) -> GeneratedRoutine {
    let mut entries: BTreeMap<String, DispatchEntry> = BTreeMap::new();

    for annotated in registry.all_concrete() {
        insert_entry(&mut entries, &annotated.type_ref, true);
    }
    for type_ref in registry.known_types() {
        insert_entry(&mut entries, type_ref, false);
    }

    GeneratedRoutine {
        name: DISPATCH_ROUTINE.to_string(),
        kind: RoutineKind::Dispatch,
        owner: TypeRef::named(format!("{}.CodecTable", namespace)),
        params: vec![Param::type_id()],
        body: vec![Instr::Dispatch { entries: entries.into_values().collect() }],
    }
}

fn insert_entry(entries: &mut BTreeMap<String, DispatchEntry>, type_ref: &TypeRef, generated: bool) {
    entries.entry(type_ref.to_string()).or_insert_with(|| DispatchEntry {
        type_ref: type_ref.clone(),
        decode: decode_name(type_ref),
        encode: encode_name(type_ref),
        generated,
    });
}
