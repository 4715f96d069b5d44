use super::ir::*;
use super::naming::{decode_name, encode_name};
use crate::model::classify::{Classifier, TypeClass};
use crate::model::registry::{AnnotatedType, SupportedTypeRegistry};
use crate::model::universe::TypeUniverse;
use codec_types::TypeRef;
use std::collections::BTreeMap;

/* How one value of a given type is read and written from inside another routine */
#[derive(Debug, Clone)]
struct ValuePlan {
    strategy: Strategy,
    expect: Option<TokenKind>,
    boundary: bool,
    default: DefaultValue,
    presence: Presence,
}

/// Builds decode/encode routines for registered types.
///
/// List and text-keyed map helpers are created on first use and shared by
/// every field with the same element type.
pub struct CodecSynthesizer<'a> {
    classifier: Classifier<'a>,
    registry: &'a SupportedTypeRegistry,
    helpers: BTreeMap<String, GeneratedRoutine>,
}

impl<'a> CodecSynthesizer<'a> {
    pub fn new(universe: &'a TypeUniverse, registry: &'a SupportedTypeRegistry) -> Self {
        Self {
            classifier: Classifier::new(universe),
            registry,
            helpers: BTreeMap::new(),
        }
    }

    /// Routines for every generated type in registry order, followed by the
    /// helpers they use in name order.
    pub fn synthesize_all(mut self) -> Vec<GeneratedRoutine> {
        let mut routines = Vec::new();
        for annotated in self.registry.all_concrete() {
            routines.push(self.synthesize_decode(annotated));
            routines.push(self.synthesize_encode(annotated));
        }
        routines.extend(self.helpers.into_values());
        routines
    }

    pub fn synthesize_decode(&mut self, annotated: &AnnotatedType) -> GeneratedRoutine {
        let owner = annotated.type_ref.to_string();
        let mut slots = Vec::with_capacity(annotated.fields.len());
        let mut cases = Vec::with_capacity(annotated.fields.len());

        for field in &annotated.fields {
            let plan = self.plan(&field.field_type);
            slots.push(FieldSlot { field: field.binding.clone(), default: plan.default });
            cases.push(FieldCase {
                wire_name: field.wire_name.clone(),
                field: field.binding.clone(),
                expect: plan.expect,
                strategy: plan.strategy,
                boundary: plan.boundary,
                optional: field.is_parameterized(),
            });
        }

        GeneratedRoutine {
            name: decode_name(&annotated.type_ref),
            kind: RoutineKind::Decode,
            owner: annotated.type_ref.clone(),
            params: vec![Param::reader()],
            body: vec![
                Instr::ReadNullAsAbsent,
                Instr::SkipUnless { token: TokenKind::BeginObject },
                Instr::ReadBeginObject,
                Instr::NewObject { type_ref: annotated.type_ref.clone(), slots },
                Instr::ReadFields { owner, cases },
                Instr::ReadEndObject,
                Instr::ReturnValue,
            ],
        }
    }

    pub fn synthesize_encode(&mut self, annotated: &AnnotatedType) -> GeneratedRoutine {
        let fields = annotated
            .fields
            .iter()
            .map(|field| {
                let plan = self.plan(&field.field_type);
                FieldWrite {
                    wire_name: field.wire_name.clone(),
                    field: field.binding.clone(),
                    strategy: plan.strategy,
                    presence: plan.presence,
                    optional: field.is_parameterized(),
                }
            })
            .collect();

        GeneratedRoutine {
            name: encode_name(&annotated.type_ref),
            kind: RoutineKind::Encode,
            owner: annotated.type_ref.clone(),
            params: vec![Param::writer(), Param::value(annotated.type_ref.clone())],
            body: vec![
                Instr::WriteBeginObject,
                Instr::CloseObjectIfAbsent,
                Instr::WriteFields { fields },
                Instr::WriteEndObject,
            ],
        }
    }

    fn plan(&mut self, type_ref: &TypeRef) -> ValuePlan {
        match self.classifier.classify(type_ref) {
            TypeClass::Primitive(kind) => ValuePlan {
                strategy: Strategy::Primitive { kind },
                expect: Some(kind.token()),
                boundary: false,
                default: if kind.has_zero() { DefaultValue::Zero { kind } } else { DefaultValue::Absent },
                presence: if kind.has_zero() { Presence::Always } else { Presence::IfPresent },
            },
            TypeClass::Collection { element } => {
                let strategy = self.list_helper(element);
                composite(strategy, Some(TokenKind::BeginArray))
            }
            TypeClass::Map { key, value } if self.classifier.has_text_keys(key) => {
                let strategy = self.map_helper(value);
                composite(strategy, Some(TokenKind::BeginObject))
            }
            TypeClass::Declared { .. } if self.registry.contains(type_ref) => composite(
                Strategy::Routine { decode: decode_name(type_ref), encode: encode_name(type_ref) },
                None,
            ),
            _ => composite(Strategy::External { type_ref: type_ref.clone() }, None),
        }
    }

    fn list_helper(&mut self, element: &TypeRef) -> Strategy {
        let list_type = TypeRef::generic("List", vec![element.clone()]);
        let decode = decode_name(&list_type);
        let encode = encode_name(&list_type);

        if !self.helpers.contains_key(&decode) {
            let element_plan = self.plan(element);
            self.helpers.insert(
                decode.clone(),
                GeneratedRoutine {
                    name: decode.clone(),
                    kind: RoutineKind::DecodeList,
                    owner: list_type.clone(),
                    params: vec![Param::reader()],
                    body: vec![
                        Instr::ReadNullAsAbsent,
                        Instr::SkipUnless { token: TokenKind::BeginArray },
                        Instr::ReadBeginArray,
                        Instr::NewList,
                        Instr::ReadElements { expect: element_plan.expect, strategy: element_plan.strategy.clone() },
                        Instr::ReadEndArray,
                        Instr::ReturnValue,
                    ],
                },
            );
            self.helpers.insert(
                encode.clone(),
                GeneratedRoutine {
                    name: encode.clone(),
                    kind: RoutineKind::EncodeList,
                    owner: list_type.clone(),
                    params: vec![Param::writer(), Param::value(list_type)],
                    body: vec![
                        Instr::WriteNullIfAbsent,
                        Instr::WriteBeginArray,
                        Instr::WriteElements { strategy: element_plan.strategy },
                        Instr::WriteEndArray,
                    ],
                },
            );
        }
        Strategy::Routine { decode, encode }
    }

    fn map_helper(&mut self, value: &TypeRef) -> Strategy {
        let map_type = TypeRef::generic("Map", vec![TypeRef::named("string"), value.clone()]);
        let decode = decode_name(&map_type);
        let encode = encode_name(&map_type);

        if !self.helpers.contains_key(&decode) {
            let value_plan = self.plan(value);
            self.helpers.insert(
                decode.clone(),
                GeneratedRoutine {
                    name: decode.clone(),
                    kind: RoutineKind::DecodeMap,
                    owner: map_type.clone(),
                    params: vec![Param::reader()],
                    body: vec![
                        Instr::ReadNullAsAbsent,
                        Instr::SkipUnless { token: TokenKind::BeginObject },
                        Instr::ReadBeginObject,
                        Instr::NewMap,
                        Instr::ReadEntries { expect: value_plan.expect, strategy: value_plan.strategy.clone() },
                        Instr::ReadEndObject,
                        Instr::ReturnValue,
                    ],
                },
            );
            self.helpers.insert(
                encode.clone(),
                GeneratedRoutine {
                    name: encode.clone(),
                    kind: RoutineKind::EncodeMap,
                    owner: map_type.clone(),
                    params: vec![Param::writer(), Param::value(map_type)],
                    body: vec![
                        Instr::WriteNullIfAbsent,
                        Instr::WriteBeginObject,
                        Instr::WriteEntries { strategy: value_plan.strategy },
                        Instr::WriteEndObject,
                    ],
                },
            );
        }
        Strategy::Routine { decode, encode }
    }
}

fn composite(strategy: Strategy, expect: Option<TokenKind>) -> ValuePlan {
    ValuePlan {
        strategy,
        expect,
        boundary: true,
        default: DefaultValue::Absent,
        presence: Presence::IfPresent,
    }
}
