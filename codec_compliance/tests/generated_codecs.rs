/* Generated codec tests
 *
 * The codecs under test are produced by the build script from
 * declarations/model.codec.yaml and compiled against the host types in
 * src/lib.rs, so this file only builds when the emitted source does.
 */

use codec_compliance::codecs::{lookup_codec, SUPPORTED_TYPES};
use codec_compliance::{Boxed, Holder, Point};
use codec_reflect::stream::{JsonReader, JsonWriter};
use codec_reflect::{from_json_str, to_json_string, Codec, IndexMap};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};
use std::any::Any;

fn as_json(text: &str) -> Json {
    serde_json::from_str(text).unwrap()
}

#[test]
fn one_generic_host_serves_every_instantiation() {
    let number: Boxed<i32> = from_json_str(r#"{"value": 4, "label": "four"}"#).unwrap().unwrap();
    assert_eq!(number, Boxed { value: Some(4), label: Some("four".into()) });

    let text: Boxed<String> = from_json_str(r#"{"value": "s"}"#).unwrap().unwrap();
    assert_eq!(text, Boxed { value: Some("s".into()), label: None });

    assert_eq!(as_json(&to_json_string(&number).unwrap()), json!({"value": 4, "label": "four"}));
    assert_eq!(as_json(&to_json_string(&text).unwrap()), json!({"value": "s"}));
    assert_eq!(<Boxed<i32>>::TYPE_ID, "app.Boxed<int>");
    assert_eq!(<Boxed<String>>::TYPE_ID, "app.Boxed<string>");
}

#[test]
fn unset_scalar_slots_are_written_as_zero() {
    let empty = Boxed::<i32>::default();
    assert_eq!(as_json(&to_json_string(&empty).unwrap()), json!({"value": 0}));
}

#[test]
fn holder_decodes_every_field_shape() {
    let document = r#"{
        "count": 2,
        "ratio": 0.5,
        "kind": "k",
        "tags": ["a", 5, "b"],
        "scores": {"x": 7},
        "boxed": {"value": 4},
        "history": [{"value": "s"}],
        "origin": {"x": 1.0, "y": 2.0},
        "ignored": [true]
    }"#;
    let holder: Holder = from_json_str(document).unwrap().unwrap();

    let mut scores = IndexMap::new();
    scores.insert("x".to_string(), Some(7));
    let expected = Holder {
        count: 2,
        ratio: 0.5,
        r#type: Some("k".into()),
        tags: Some(vec![Some("a".into()), Some("b".into())]),
        scores: Some(scores),
        boxed: Some(Boxed { value: Some(4), label: None }),
        history: Some(vec![Some(Boxed { value: Some("s".into()), label: None })]),
        origin: Some(Point { x: 1.0, y: 2.0 }),
    };
    assert_eq!(holder, expected);

    let written = as_json(&to_json_string(&holder).unwrap());
    assert_eq!(
        written,
        json!({
            "count": 2,
            "ratio": 0.5,
            "kind": "k",
            "tags": ["a", "b"],
            "scores": {"x": 7},
            "boxed": {"value": 4},
            "history": [{"value": "s"}],
            "origin": {"x": 1.0, "y": 2.0}
        })
    );
}

#[test]
fn mistyped_fields_are_skipped() {
    let holder: Holder = from_json_str(r#"{"count": "two", "kind": 3, "boxed": [1]}"#).unwrap().unwrap();
    assert_eq!(holder, Holder::default());
}

#[test]
fn dispatch_lists_every_generated_type() {
    assert_eq!(SUPPORTED_TYPES, &["app.Boxed<int>", "app.Boxed<string>", "app.Holder"]);
    assert!(lookup_codec("app.Holder").generated);
}

#[test]
fn listed_types_decode_through_their_routines() {
    let entry = lookup_codec("app.Boxed<int>");
    let mut reader = JsonReader::parse(r#"{"value": 3}"#).unwrap();
    let decoded = (entry.decode)(&mut reader).unwrap().unwrap();
    assert_eq!(decoded.downcast_ref::<Boxed<i32>>(), Some(&Boxed { value: Some(3), label: None }));

    let mut writer = JsonWriter::new();
    (entry.encode)(&mut writer, decoded.as_ref()).unwrap();
    assert_eq!(writer.into_json().unwrap(), json!({"value": 3}));

    let other = Boxed { value: Some("s".to_string()), label: None };
    let mut writer = JsonWriter::new();
    assert!((entry.encode)(&mut writer, &other as &dyn Any).is_err());
}

#[test]
fn unlisted_types_reach_the_fallback() {
    let entry = lookup_codec("unlisted.Type");
    assert!(!entry.generated);

    let mut reader = JsonReader::parse(r#"{"a": [1, {"b": null}]}"#).unwrap();
    let decoded = (entry.decode)(&mut reader).unwrap().unwrap();
    assert_eq!(decoded.downcast_ref::<Json>(), Some(&json!({"a": [1, {"b": null}]})));

    let mut writer = JsonWriter::new();
    (entry.encode)(&mut writer, decoded.as_ref()).unwrap();
    assert_eq!(writer.into_json().unwrap(), json!({"a": [1, {"b": null}]}));
}
