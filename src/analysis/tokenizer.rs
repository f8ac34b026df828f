use regex::Regex;
use std::sync::LazyLock;

// "HTTPRequest" -> "HTTP Request": a run of uppercase followed by an
// uppercase-lowercase pair splits before the pair.
static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());

// "theOffice" -> "the Office": lowercase or digit followed by uppercase.
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Split text into lowercase alphanumeric tokens, in input order.
///
/// CamelCase and acronym boundaries are broken apart first so that
/// "HTTPRequest" indexes as "http" and "request". An empty token list is
/// a valid result.
pub fn tokenize(text: &str) -> Vec<String> {
    let split = ACRONYM_BOUNDARY.replace_all(text, "$1 $2");
    let split = CAMEL_BOUNDARY.replace_all(&split, "$1 $2");
    let lowered = split.to_lowercase();

    lowered
        .split(|c: char| !c.is_ascii_lowercase() && !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// All prefixes of `token`, shortest first, including the token itself.
/// Tokens are ASCII after `tokenize`, so byte slicing is safe.
pub fn prefix_ngrams(token: &str) -> Vec<String> {
    (1..=token.len()).map(|end| token[..end].to_string()).collect()
}
