//! Full-text match expression preparation.

/// Turn a raw user query into an FTS match expression.
///
/// Double quotes are doubled and dots become spaces before tokenizing;
/// dotted names split into separate terms on purpose. Tokens prefixed
/// with `-` (at least one character long) become `NOT` terms; the rest
/// are joined with `AND`.
pub fn prepare_match_query(query: &str) -> String {
    let sanitized = query.replace('"', "\"\"").replace('.', " ");

    let mut include: Vec<&str> = Vec::new();
    let mut exclude: Vec<&str> = Vec::new();
    for token in sanitized.split_whitespace() {
        match token.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => exclude.push(rest),
            _ => include.push(token),
        }
    }

    let mut parts: Vec<String> = Vec::new();
    if !include.is_empty() {
        parts.push(include.join(" AND "));
    }
    for token in exclude {
        parts.push(format!("NOT {token}"));
    }
    parts.join(" ")
}
