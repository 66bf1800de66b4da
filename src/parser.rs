// parser.rs

/// Splits a command line on whitespace. Single and double quotes group
/// words (so paths may contain spaces) and a backslash escapes the next
/// character outside single quotes.
pub fn split_args(line: &str) -> Result<Vec<String>, String> {
    enum State {
        Normal,
        Single,
        Double,
    }
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut state = State::Normal;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            State::Normal => match ch {
                '\'' => {
                    state = State::Single;
                    quoted = true;
                }
                '"' => {
                    state = State::Double;
                    quoted = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        cur.push(next);
                    }
                }
                c if c.is_whitespace() => {
                    if !cur.is_empty() || quoted {
                        tokens.push(std::mem::take(&mut cur));
                        quoted = false;
                    }
                }
                _ => cur.push(ch),
            },
            State::Single => match ch {
                '\'' => state = State::Normal,
                _ => cur.push(ch),
            },
            State::Double => match ch {
                '"' => state = State::Normal,
                '\\' => match chars.peek() {
                    Some(&next) if next == '\\' || next == '"' => {
                        cur.push(next);
                        chars.next();
                    }
                    _ => cur.push('\\'),
                },
                _ => cur.push(ch),
            },
        }
    }
    match state {
        State::Normal => {
            if !cur.is_empty() || quoted {
                tokens.push(cur);
            }
            Ok(tokens)
        }
        State::Single | State::Double => Err("unterminated quote".to_string()),
    }
}

/// Parses an operand. Accepts integer, decimal and scientific notation;
/// rejects `inf` and `nan`.
pub fn parse_number(token: &str) -> Result<f64, String> {
    let token = token.trim();
    match take_number(token) {
        Some((value, "")) => Ok(value),
        _ => Err(format!("'{token}' is not a valid number")),
    }
}

/// Recognises `<number> <op> <number>` with `+ - * / % ^ **`, with or
/// without spaces, and maps the symbol to an operation name.
pub fn parse_infix(line: &str) -> Option<(&'static str, f64, f64)> {
    let (a, rest) = take_number(line.trim())?;
    let rest = rest.trim_start();
    let (operation, rest) = if let Some(rest) = rest.strip_prefix("**") {
        ("power", rest)
    } else {
        let mut chars = rest.chars();
        let op = match chars.next()? {
            '+' => "add",
            '-' => "subtract",
            '*' => "multiply",
            '/' => "divide",
            '%' => "modulus",
            '^' => "power",
            _ => return None,
        };
        (op, chars.as_str())
    };
    let (b, rest) = take_number(rest.trim_start())?;
    if rest.trim().is_empty() {
        Some((operation, a, b))
    } else {
        None
    }
}

/// Longest numeric prefix of `s` and the remainder.
fn take_number(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return None;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    let value: f64 = s[..i].parse().ok()?;
    value.is_finite().then_some((value, &s[i..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_quotes_and_escapes() {
        assert_eq!(split_args("add 1 2").unwrap(), vec!["add", "1", "2"]);
        assert_eq!(
            split_args("save \"my history.csv\" csv").unwrap(),
            vec!["save", "my history.csv", "csv"]
        );
        assert_eq!(split_args("load 'a b.json'").unwrap(), vec!["load", "a b.json"]);
        assert_eq!(split_args(r"load a\ b.json").unwrap(), vec!["load", "a b.json"]);
        assert_eq!(split_args("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_args("x ''").unwrap(), vec!["x", ""]);
        assert!(split_args("save \"open").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("42"), Ok(42.0));
        assert_eq!(parse_number("-3.5"), Ok(-3.5));
        assert_eq!(parse_number(".5"), Ok(0.5));
        assert_eq!(parse_number("1e3"), Ok(1000.0));
        assert_eq!(parse_number("2.5E-1"), Ok(0.25));
        assert!(parse_number("inf").is_err());
        assert!(parse_number("nan").is_err());
        assert!(parse_number("1e999").is_err());
        assert!(parse_number("12abc").is_err());
        assert!(parse_number("").is_err());
        assert!(parse_number("-").is_err());
    }

    #[test]
    fn infix_expressions() {
        assert_eq!(parse_infix("5 + 3"), Some(("add", 5.0, 3.0)));
        assert_eq!(parse_infix("5-3"), Some(("subtract", 5.0, 3.0)));
        assert_eq!(parse_infix("5 - -3"), Some(("subtract", 5.0, -3.0)));
        assert_eq!(parse_infix("2 ** 8"), Some(("power", 2.0, 8.0)));
        assert_eq!(parse_infix("2^8"), Some(("power", 2.0, 8.0)));
        assert_eq!(parse_infix("7 % 2"), Some(("modulus", 7.0, 2.0)));
        assert_eq!(parse_infix("1e2 / 4"), Some(("divide", 100.0, 4.0)));
        assert_eq!(parse_infix("5 & 3"), None);
        assert_eq!(parse_infix("add 5 3"), None);
        assert_eq!(parse_infix("5 + 3 + 1"), None);
    }
}
