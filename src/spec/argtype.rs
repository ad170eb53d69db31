//! The type notation used inside signatures.
//!
//! Types are kept as their textual form (`[]map[string]*Point`) and analysed
//! on demand. The notation is deliberately small: primitives, slices,
//! optionals, string-keyed maps and named (complex) types, optionally
//! qualified by a package (`geo.Point`).

use crate::naming::{is_lower_case_identifier, is_upper_case_identifier};

/// Package alias that prefixes local complex types outside the API boundary.
pub const API_PACKAGE: &str = "api";

const PRIMITIVES: &[&str] = &[
    "string", "bool", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "byte", "float", "float32", "float64", "duration", "time", "any",
];

const INTEGERS: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "byte",
];

const FLOATS: &[&str] = &["float", "float32", "float64"];

/// Split off the compound prefix of a type, returning `(prefix, end type)`.
///
/// `[]map[string]*geo.Point` → (`[]map[string]*`, `geo.Point`)
pub fn split_end_type(ty: &str) -> (&str, &str) {
    let mut rest = ty;
    loop {
        if let Some(r) = rest.strip_prefix("[]") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('*') {
            rest = r;
        } else if rest.starts_with("map[") {
            match rest.find(']') {
                Some(close) => rest = &rest[close + 1..],
                None => break,
            }
        } else {
            break;
        }
    }
    let prefix_len = ty.len() - rest.len();
    (&ty[..prefix_len], rest)
}

/// The innermost named type of a compound type.
pub fn end_type(ty: &str) -> &str {
    split_end_type(ty).1
}

pub fn is_primitive(ty: &str) -> bool {
    PRIMITIVES.contains(&ty)
}

pub fn is_integer(ty: &str) -> bool {
    INTEGERS.contains(&ty)
}

pub fn is_float(ty: &str) -> bool {
    FLOATS.contains(&ty)
}

/// Integers, floats and durations can be recorded by a metric.
pub fn is_numeric_like(ty: &str) -> bool {
    is_integer(ty) || is_float(ty) || ty == "duration"
}

/// A type defined locally in the service's API package: an undotted
/// upper-initial name at the end of the type.
pub fn is_local_complex(ty: &str) -> bool {
    let end = end_type(ty);
    !end.contains('.') && is_upper_case_identifier(end)
}

/// Validate a type expression, returning a human-readable reason on failure.
pub fn validate_type(ty: &str) -> Result<(), String> {
    if ty.is_empty() {
        return Err("missing type".to_string());
    }
    if let Some(inner) = ty.strip_prefix("[]") {
        return validate_type(inner);
    }
    if let Some(inner) = ty.strip_prefix('*') {
        return validate_type(inner);
    }
    if let Some(rest) = ty.strip_prefix("map[") {
        let close = rest
            .find(']')
            .ok_or_else(|| format!("missing closing bracket in map type '{ty}'"))?;
        let key = &rest[..close];
        if key != "string" {
            return Err(format!("map keys must be strings in '{ty}'"));
        }
        return validate_type(&rest[close + 1..]);
    }
    if ty == "error" {
        return Err("the error result is implicit and must not be declared".to_string());
    }
    if ty == "context.Context" {
        return Err("the cancellation context is implicit and must not be declared".to_string());
    }
    if ty.contains('.') {
        let segments: Vec<&str> = ty.split('.').collect();
        let (last, pkg) = segments
            .split_last()
            .ok_or_else(|| format!("invalid type '{ty}'"))?;
        if pkg.iter().any(|s| !is_lower_case_identifier(s)) {
            return Err(format!("invalid package in type '{ty}'"));
        }
        if !is_upper_case_identifier(last) {
            return Err(format!(
                "dotted type '{ty}' must refer to an upper-case named type"
            ));
        }
        return Ok(());
    }
    if is_primitive(ty) || is_upper_case_identifier(ty) {
        return Ok(());
    }
    Err(format!("unknown type '{ty}'"))
}

/// Prefix a local complex end type with the API package.
/// `[]Point` → `[]api.Point`. Idempotent.
pub fn qualify(ty: &str) -> String {
    let (prefix, end) = split_end_type(ty);
    if !end.contains('.') && is_upper_case_identifier(end) {
        format!("{prefix}{API_PACKAGE}.{end}")
    } else {
        ty.to_string()
    }
}

/// Strip the API package prefix from the end type. `[]api.Point` → `[]Point`.
/// Idempotent and the inverse of [`qualify`].
pub fn shorthand(ty: &str) -> String {
    let (prefix, end) = split_end_type(ty);
    match end.strip_prefix(API_PACKAGE).and_then(|r| r.strip_prefix('.')) {
        Some(bare) if is_upper_case_identifier(bare) => format!("{prefix}{bare}"),
        _ => ty.to_string(),
    }
}

/// Render a type in Rust. `None` is the untyped marker.
pub fn rust_type(ty: Option<&str>) -> String {
    let Some(ty) = ty else {
        return "serde_json::Value".to_string();
    };
    if let Some(inner) = ty.strip_prefix("[]") {
        return format!("Vec<{}>", rust_type(Some(inner)));
    }
    if let Some(inner) = ty.strip_prefix('*') {
        return format!("Option<{}>", rust_type(Some(inner)));
    }
    if let Some(rest) = ty.strip_prefix("map[") {
        if let Some(close) = rest.find(']') {
            return format!(
                "std::collections::HashMap<String, {}>",
                rust_type(Some(&rest[close + 1..]))
            );
        }
    }
    match ty {
        "string" => "String".to_string(),
        "bool" => "bool".to_string(),
        "int" | "int64" => "i64".to_string(),
        "int8" => "i8".to_string(),
        "int16" => "i16".to_string(),
        "int32" => "i32".to_string(),
        "uint" | "uint64" => "u64".to_string(),
        "uint8" | "byte" => "u8".to_string(),
        "uint16" => "u16".to_string(),
        "uint32" => "u32".to_string(),
        "float" | "float64" => "f64".to_string(),
        "float32" => "f32".to_string(),
        "duration" => "std::time::Duration".to_string(),
        "time" => "std::time::SystemTime".to_string(),
        "any" => "serde_json::Value".to_string(),
        other => other.replace('.', "::"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_end_type() {
        assert_eq!(split_end_type("[]map[string]*geo.Point"), ("[]map[string]*", "geo.Point"));
        assert_eq!(split_end_type("int"), ("", "int"));
        assert_eq!(end_type("[][]Point"), "Point");
    }

    #[test]
    fn test_validate_type() {
        assert!(validate_type("int").is_ok());
        assert!(validate_type("[]*Point").is_ok());
        assert!(validate_type("map[string][]int").is_ok());
        assert!(validate_type("time.Time").is_ok());
        assert!(validate_type("map[int]string")
            .unwrap_err()
            .contains("map keys must be strings"));
        assert!(validate_type("geo.point").unwrap_err().contains("upper-case"));
        assert!(validate_type("integer").unwrap_err().contains("unknown type"));
        assert!(validate_type("error").is_err());
        assert!(validate_type("context.Context").is_err());
        assert!(validate_type("[]").is_err());
    }

    #[test]
    fn test_qualify_and_shorthand_are_inverse() {
        assert_eq!(qualify("[]Point"), "[]api.Point");
        assert_eq!(qualify("[]api.Point"), "[]api.Point");
        assert_eq!(qualify("map[string]*Point"), "map[string]*api.Point");
        assert_eq!(qualify("int"), "int");
        assert_eq!(qualify("geo.Point"), "geo.Point");
        assert_eq!(shorthand("[]api.Point"), "[]Point");
        assert_eq!(shorthand("[]Point"), "[]Point");
        assert_eq!(shorthand("geo.Point"), "geo.Point");
        assert_eq!(shorthand(&qualify("*Point")), "*Point");
    }

    #[test]
    fn test_rust_type() {
        assert_eq!(rust_type(Some("int")), "i64");
        assert_eq!(rust_type(Some("[]byte")), "Vec<u8>");
        assert_eq!(
            rust_type(Some("map[string]*api.Point")),
            "std::collections::HashMap<String, Option<api::Point>>"
        );
        assert_eq!(rust_type(None), "serde_json::Value");
        assert_eq!(rust_type(Some("duration")), "std::time::Duration");
    }

    #[test]
    fn test_numeric_like() {
        assert!(is_numeric_like("int"));
        assert!(is_numeric_like("float32"));
        assert!(is_numeric_like("duration"));
        assert!(!is_numeric_like("string"));
    }
}
