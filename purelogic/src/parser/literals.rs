use crate::parser::Rule;
use crate::Value;
use pest::iterators::Pair;

/// Parse a literal pair into a value.
///
/// Returns the error message on failure; the caller attaches the span.
pub fn parse_literal(pair: Pair<Rule>) -> Result<Value, String> {
    match pair.as_rule() {
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("Integer literal '{}' is out of range", pair.as_str())),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| format!("Invalid float literal '{}': {}", pair.as_str(), e)),
        Rule::string => unescape(pair.as_str()).map(Value::String),
        Rule::boolean => Ok(Value::Boolean(pair.as_str().trim() == "true")),
        Rule::null => Ok(Value::Null),
        other => Err(format!("Unexpected literal rule {:?}", other)),
    }
}

/// Strip the surrounding quotes and resolve escapes
pub fn unescape(quoted: &str) -> Result<String, String> {
    let body = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| format!("Malformed string literal {}", quoted))?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let hex: String = chars
                    .by_ref()
                    .skip_while(|c| *c == '{')
                    .take_while(|c| *c != '}')
                    .collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("Invalid unicode escape \\u{{{}}}", hex))?;
                out.push(decoded);
            }
            other => return Err(format!("Unknown escape sequence \\{}", other.unwrap_or(' '))),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_handles_common_escapes() {
        assert_eq!(unescape(r#""a\"b\\c\n""#).unwrap(), "a\"b\\c\n");
        assert_eq!(unescape(r#""\u{e9}t\u{E9}""#).unwrap(), "été");
        assert!(unescape(r#""\q""#).is_err());
    }
}
