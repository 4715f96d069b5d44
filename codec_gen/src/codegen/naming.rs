/* Routine naming. Names must be valid identifiers in every backend and
unique per concrete type, so each carries a short digest of the canonical
type string. */

use codec_types::TypeRef;
use sha2::{Digest, Sha256};

pub fn decode_name(type_ref: &TypeRef) -> String {
  format!("decode_{}_{}", type_slug(type_ref), type_digest(type_ref))
}

pub fn encode_name(type_ref: &TypeRef) -> String {
  format!("encode_{}_{}", type_slug(type_ref), type_digest(type_ref))
}

/* Lowercase simple names of every component, joined with underscores */
pub fn type_slug(type_ref: &TypeRef) -> String {
  let mut parts = Vec::new();
  collect_slug(type_ref, &mut parts);
  parts.join("_")
}

fn collect_slug(type_ref: &TypeRef, parts: &mut Vec<String>) {
  parts.push(snake_case(type_ref.simple_name()));
  for arg in type_ref.args() {
    collect_slug(arg, parts);
  }
}

/* First 8 hex digits of the SHA-256 of the canonical type string */
pub fn type_digest(type_ref: &TypeRef) -> String {
  let digest = Sha256::digest(type_ref.to_string().as_bytes());
  digest.iter().take(4).map(|byte| format!("{:02x}", byte)).collect()
}

pub fn snake_case(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  let mut prev_lower = false;
  for c in name.chars() {
    if c.is_uppercase() {
      if prev_lower {
        out.push('_');
      }
      out.extend(c.to_lowercase());
      prev_lower = false;
    } else if c.is_alphanumeric() {
      out.push(c);
      prev_lower = true;
    } else {
      if !out.ends_with('_') {
        out.push('_');
      }
      prev_lower = false;
    }
  }
  out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_stable_and_distinct() {
    let a: TypeRef = "com.example.Pair<int, string>".parse().unwrap();
    let b: TypeRef = "other.Pair<int, string>".parse().unwrap();
    assert!(decode_name(&a).starts_with("decode_pair_int_string_"));
    assert_eq!(decode_name(&a), decode_name(&a));
    assert_ne!(decode_name(&a), decode_name(&b));
    assert_eq!(type_digest(&a).len(), 8);
  }

  #[test]
  fn snake_cases_simple_names() {
    assert_eq!(snake_case("UserProfile"), "user_profile");
    assert_eq!(snake_case("URL"), "url");
    assert_eq!(snake_case("Outer$Inner"), "outer_inner");
  }
}
