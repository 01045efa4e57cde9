use std::fmt::Write as _;

use crate::grammar::QueryGrammar;
use crate::value::SqlValue;

/// Coerce caller bindings into the forms the legacy handle can digest.
///
/// Booleans become integer 0/1 and timestamps are rendered with the
/// grammar's date format; every other value passes through unchanged.
#[must_use]
pub fn prepare_bindings(grammar: &QueryGrammar, bindings: &[SqlValue]) -> Vec<SqlValue> {
    bindings
        .iter()
        .map(|value| match value {
            SqlValue::Bool(b) => SqlValue::Int(i64::from(*b)),
            SqlValue::Timestamp(dt) => {
                SqlValue::Text(dt.format(grammar.date_format()).to_string())
            }
            other => other.clone(),
        })
        .collect()
}

/// Escape LIKE wildcards inside marked spans of a bound value.
///
/// A span bracketed by `{` and `}` flags its content as unsafe user input
/// for a LIKE clause: backslash, `%`, and `_` inside the span get
/// backslash-escaped, the sentinel braces are stripped, and the process
/// repeats until no marked span remains. Text outside any span is left
/// untouched, so deliberate wildcards survive:
///
/// ```rust
/// use sql_conduit::bindings::escape_like_markers;
///
/// assert_eq!(escape_like_markers("{L}_{nd}%"), "L\\_nd%");
/// ```
#[must_use]
pub fn escape_like_markers(value: &str) -> String {
    let mut out = value.to_string();
    loop {
        let Some(open) = out.find('{') else { break };
        let Some(close) = out.rfind('}') else { break };
        if close < open {
            break;
        }

        let inner: String = out[open + 1..close]
            .chars()
            .filter(|&c| c != '{' && c != '}')
            .flat_map(|c| match c {
                '\\' => vec!['\\', '\\'],
                '%' => vec!['\\', '%'],
                '_' => vec!['\\', '_'],
                other => vec![other],
            })
            .collect();

        out = format!("{}{}{}", &out[..open], inner, &out[close + 1..]);
    }
    out
}

/// Render a sanitized binding as a driver-safe SQL literal.
///
/// Strings get LIKE-marker escaping and quoting, `Null` becomes the bare
/// literal `null`, numbers pass through, blobs become hex literals.
#[must_use]
pub fn quote_value(grammar: &QueryGrammar, value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "null".to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Bool(b) => i64::from(*b).to_string(),
        SqlValue::Text(s) => grammar.quote_string(&escape_like_markers(s)),
        SqlValue::Timestamp(dt) => {
            grammar.quote_string(&dt.format(grammar.date_format()).to_string())
        }
        SqlValue::Json(json) => grammar.quote_string(&json.to_string()),
        SqlValue::Blob(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for b in bytes {
                let _ = write!(out, "{b:02X}");
            }
            out.push('\'');
            out
        }
    }
}

/// Rewrite `?` placeholders to `%s` markers, escaping literal `%` to `%%`
/// first so it survives [`format_markers`] unchanged. Placeholders inside
/// quoted string literals are not rewritten.
#[must_use]
pub fn substitute_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut state = State::Normal;

    for ch in sql.chars() {
        match state {
            State::Normal => match ch {
                '%' => {
                    out.push_str("%%");
                    continue;
                }
                '?' => {
                    out.push_str("%s");
                    continue;
                }
                '\'' => state = State::SingleQuoted,
                '"' => state = State::DoubleQuoted,
                _ => {}
            },
            State::SingleQuoted => {
                if ch == '%' {
                    out.push_str("%%");
                    continue;
                }
                if ch == '\'' {
                    state = State::Normal;
                }
            }
            State::DoubleQuoted => {
                if ch == '%' {
                    out.push_str("%%");
                    continue;
                }
                if ch == '"' {
                    state = State::Normal;
                }
            }
        }
        out.push(ch);
    }

    out
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
}

/// Consume `%s` markers positionally with the given literals and collapse
/// `%%` escapes back to `%`. Leftover markers (more `?` than bindings) are
/// left in place; surplus literals are ignored.
#[must_use]
pub fn format_markers(marked: &str, literals: &[String]) -> String {
    let mut out = String::with_capacity(marked.len());
    let mut next = literals.iter();
    let mut chars = marked.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            match chars.peek() {
                Some('%') => {
                    chars.next();
                    out.push('%');
                    continue;
                }
                Some('s') => {
                    if let Some(lit) = next.next() {
                        chars.next();
                        out.push_str(lit);
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push(ch);
    }

    out
}

/// Full interpolation pipeline: sanitize, quote, and splice bindings into
/// the SQL text, producing the literal statement the handle will run.
#[must_use]
pub fn interpolate(grammar: &QueryGrammar, sql: &str, bindings: &[SqlValue]) -> String {
    if bindings.is_empty() {
        return sql.to_string();
    }
    let prepared = prepare_bindings(grammar, bindings);
    let literals: Vec<String> = prepared
        .iter()
        .map(|value| quote_value(grammar, value))
        .collect();
    format_markers(&substitute_placeholders(sql), &literals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn grammar() -> QueryGrammar {
        QueryGrammar::new()
    }

    #[test]
    fn prepare_coerces_bools_and_timestamps() {
        let dt = NaiveDate::from_ymd_opt(2021, 4, 7)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let prepared = prepare_bindings(
            &grammar(),
            &[
                SqlValue::Bool(true),
                SqlValue::Bool(false),
                SqlValue::Text("x".into()),
                SqlValue::Int(10),
                SqlValue::Timestamp(dt),
            ],
        );
        assert_eq!(
            prepared,
            vec![
                SqlValue::Int(1),
                SqlValue::Int(0),
                SqlValue::Text("x".into()),
                SqlValue::Int(10),
                SqlValue::Text("2021-04-07 15:00:00".into()),
            ]
        );
    }

    #[test]
    fn like_markers_escape_only_the_marked_span() {
        assert_eq!(escape_like_markers("{L}_{nd}%"), "L\\_nd%");
        assert_eq!(escape_like_markers("no markers % _"), "no markers % _");
        assert_eq!(escape_like_markers("{100%}"), "100\\%");
    }

    #[test]
    fn placeholders_survive_quoted_literals() {
        let marked = substitute_placeholders("select '?' , \"?\" , ? from t where pct = '50%'");
        assert_eq!(marked, "select '?' , \"?\" , %s from t where pct = '50%%'");
    }

    #[test]
    fn interpolation_preserves_literal_percents() {
        let sql = interpolate(
            &grammar(),
            "update t set note = ? where pct like '10%'",
            &[SqlValue::Text("a'b".into())],
        );
        assert_eq!(sql, "update t set note = 'a''b' where pct like '10%'");
    }

    #[test]
    fn quoting_covers_null_numbers_and_blobs() {
        let g = grammar();
        assert_eq!(quote_value(&g, &SqlValue::Null), "null");
        assert_eq!(quote_value(&g, &SqlValue::Int(10)), "10");
        assert_eq!(quote_value(&g, &SqlValue::Bool(true)), "1");
        assert_eq!(
            quote_value(&g, &SqlValue::Blob(vec![0xDE, 0xAD])),
            "X'DEAD'"
        );
    }

    #[test]
    fn surplus_placeholders_are_left_in_place() {
        let out = format_markers("a = %s and b = %s", &["1".to_string()]);
        assert_eq!(out, "a = 1 and b = %s");
    }
}
