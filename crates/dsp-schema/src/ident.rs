//! Identifier case normalization (spec §4.2): schema identifiers are
//! `camelCase`/`PascalCase` on the wire but are referenced in `snake_case`
//! from expression text and from diagnostics.

/// Converts `camelCase`/`PascalCase`/`ABCField`-style identifiers to
/// `snake_case`, splitting an acronym run at its last capital so that
/// `ABCField` becomes `abc_field`, not `a_b_c_field`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1);
            let splits_camel_boundary = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let splits_acronym_end =
                prev.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase());
            if splits_camel_boundary || splits_acronym_end {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_camel_case() {
        assert_eq!(to_snake_case("myFieldName"), "my_field_name");
    }

    #[test]
    fn pascal_case() {
        assert_eq!(to_snake_case("PlanetData"), "planet_data");
    }

    #[test]
    fn acronym_splits_at_last_capital() {
        assert_eq!(to_snake_case("ABCField"), "abc_field");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
    }

    #[test]
    fn already_snake_case_is_unchanged() {
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn single_letter_and_empty() {
        assert_eq!(to_snake_case("x"), "x");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn digits_trigger_a_boundary() {
        assert_eq!(to_snake_case("icon0Id"), "icon0_id");
    }
}
