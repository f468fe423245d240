//! Shared utility functions for code generation.

/// Convert a string to PascalCase (e.g., "hello_world" -> "HelloWorld")
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-'])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Convert a string to snake_case (e.g., "HelloWorld" -> "hello_world")
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            result.push('_');
        }
        result.extend(c.to_lowercase());
    }
    result.replace('-', "_")
}

/// Render a TOML value as a Rust literal expression.
///
/// Strings become `String::from("...")`, everything else uses its plain
/// literal form. Arrays and tables have no literal form and yield `None`.
pub fn toml_value_to_literal(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(format!("String::from({:?})", s)),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(format!("{:?}", f)),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
