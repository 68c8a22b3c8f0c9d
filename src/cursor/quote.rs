// SQLite rendering of a statement with its parameters substituted, in the style of quote().
// Handles `?`, `?NNN` and `$NNN` placeholders; quoted regions are copied untouched.

use crate::models::Value;

/// SQLite literal for `value`.
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) if v.is_nan() => "NULL".to_string(),
        Value::Real(v) if v.is_infinite() && *v > 0.0 => "9.0e+999".to_string(),
        Value::Real(v) if v.is_infinite() => "-9.0e+999".to_string(),
        Value::Real(v) => format!("{:?}", v),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Blob(v) => format!("X'{}'", hex::encode_upper(v)),
    }
}

/// `sql` with each placeholder replaced by the quoted parameter it binds.
/// Placeholders without a matching parameter are left as written.
pub fn render_sqlite_query(sql: &str, params: &[Value]) -> String {
    if params.is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut chars = sql.chars().peekable();
    let mut in_quote: Option<char> = None;
    // SQLite numbers a bare `?` one past the largest index used so far.
    let mut next_index = 0usize;

    while let Some(c) = chars.next() {
        if let Some(q) = in_quote {
            out.push(c);
            if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                in_quote = Some(c);
                out.push(c);
            }
            '?' | '$' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                let index = if digits.is_empty() {
                    if c == '$' {
                        out.push(c);
                        continue;
                    }
                    next_index += 1;
                    Some(next_index - 1)
                } else {
                    let n: Option<usize> = digits.parse().ok().filter(|n| *n > 0);
                    if let Some(n) = n {
                        next_index = next_index.max(n);
                    }
                    n.map(|n| n - 1)
                };
                match index.and_then(|i| params.get(i)) {
                    Some(value) => out.push_str(&quote_value(value)),
                    None => {
                        out.push(c);
                        out.push_str(&digits);
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}
