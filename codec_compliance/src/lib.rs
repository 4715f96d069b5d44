//! Host types for `declarations/model.codec.yaml`, with the codecs generated
//! for them by the build script compiled in as [`codecs`].

use codec_reflect::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Boxed<T> {
    pub value: Option<T>,
    pub label: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Holder {
    pub count: i32,
    pub ratio: f64,
    pub r#type: Option<String>,
    pub tags: Option<Vec<Option<String>>>,
    pub scores: Option<IndexMap<String, Option<i64>>>,
    pub boxed: Option<Boxed<i32>>,
    pub history: Option<Vec<Option<Boxed<String>>>>,
    pub origin: Option<Point>,
}

/// Declared outside the fixture, so it travels through the serde fallback.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub mod codecs {
    include!(concat!(env!("OUT_DIR"), "/codecs.rs"));
}
