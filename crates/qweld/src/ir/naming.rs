//! Naming helpers shared by the validator and the emitters

/// Words that cannot be used as member or parameter names because they are
/// reserved in C++ or Rust.
const RESERVED_WORDS: &[&str] = &[
    // C++
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "decltype", "default", "delete", "do",
    "double", "else", "emit", "enum", "explicit", "export", "extern", "false", "float",
    "for", "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
    "noexcept", "not", "nullptr", "operator", "or", "private", "protected", "public",
    "register", "return", "short", "signals", "signed", "sizeof", "slots", "static",
    "struct", "switch", "template", "this", "throw", "true", "try", "typedef", "typeid",
    "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "while", "xor",
    "char8_t", "char16_t", "char32_t", "concept", "consteval", "constinit", "const_cast",
    "co_await", "co_return", "co_yield", "dynamic_cast", "reinterpret_cast", "requires",
    "static_assert", "static_cast", "thread_local", "wchar_t",
    // C++ alternative tokens
    "and_eq", "bitand", "bitor", "compl", "not_eq", "or_eq", "xor_eq",
    // Rust
    "abstract", "as", "async", "await", "become", "box", "crate", "dyn", "final", "fn",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "self", "super", "trait", "type", "typeof", "unsafe", "unsized", "use",
    "where", "yield",
];

/// Names used for locals inside generated trampolines and accessors
const INTERNAL_NAMES: &[&str] = &["ptr", "obj", "guard", "object", "result", "handle", "value"];

/// Check whether a name is a C++ or Rust reserved word
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Check whether a name is used internally by generated code
pub fn is_internal_name(name: &str) -> bool {
    INTERNAL_NAMES.contains(&name)
}

/// Check a member name against the identifier rule
///
/// A name must be non-empty, must not start with a digit, must start with a
/// lowercase letter and may only contain ASCII letters and digits.
pub fn check_identifier(name: &str) -> Result<(), &'static str> {
    let Some(first) = name.chars().next() else {
        return Err("name must not be empty");
    };

    if first.is_ascii_digit() {
        return Err("name must not start with a number");
    }

    if !first.is_ascii_lowercase() {
        return Err("name must start with a lowercase letter");
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("name must only consist of letters and numbers");
    }

    if is_reserved_word(name) {
        return Err("name must not be a reserved word");
    }

    Ok(())
}

/// Uppercase the first character (`count` -> `Count`)
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert a camelCase or PascalCase name to snake_case
///
/// Acronyms are kept together: `parseHTMLDoc` -> `parse_html_doc`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }

    result
}

/// Lowercase form used in generated file names (`MyCounter` -> `mycounter`)
pub fn file_stem(s: &str) -> String {
    s.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("count").is_ok());
        assert!(check_identifier("countChanged2").is_ok());
        assert_eq!(check_identifier(""), Err("name must not be empty"));
        assert_eq!(check_identifier("2count"), Err("name must not start with a number"));
        assert_eq!(check_identifier("Count"), Err("name must start with a lowercase letter"));
        assert_eq!(check_identifier("_count"), Err("name must start with a lowercase letter"));
        assert_eq!(
            check_identifier("new_count"),
            Err("name must only consist of letters and numbers")
        );
        assert_eq!(check_identifier("delete"), Err("name must not be a reserved word"));
        assert_eq!(check_identifier("type"), Err("name must not be a reserved word"));
    }

    #[test]
    fn test_cpp20_keywords_are_reserved() {
        for word in ["requires", "concept", "consteval", "constinit", "bitand", "bitor", "compl"] {
            assert_eq!(check_identifier(word), Err("name must not be a reserved word"), "{}", word);
        }
        for word in ["co_await", "co_return", "co_yield", "char8_t", "thread_local", "static_cast"] {
            assert!(is_reserved_word(word), "{}", word);
        }
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("count"), "count");
        assert_eq!(to_snake_case("countChanged"), "count_changed");
        assert_eq!(to_snake_case("Counter"), "counter");
        assert_eq!(to_snake_case("parseHTMLDoc"), "parse_html_doc");
        assert_eq!(to_snake_case("MyHTTPObj"), "my_http_obj");
        assert_eq!(to_snake_case("value2Set"), "value2_set");
    }

    #[test]
    fn test_upper_first() {
        assert_eq!(upper_first("count"), "Count");
        assert_eq!(upper_first("Count"), "Count");
        assert_eq!(upper_first(""), "");
    }
}
