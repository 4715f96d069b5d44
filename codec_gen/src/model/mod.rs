//! Semantic model of the declarations a generator run works from.

pub mod classify;
pub mod members;
pub mod registry;
pub mod universe;

pub use classify::{Classifier, PrimitiveKind, TypeClass};
pub use members::{FieldDescriptor, MemberResolver};
pub use registry::{discover, AnnotatedType, SupportedTypeRegistry, TypeOrigin};
pub use universe::TypeUniverse;
