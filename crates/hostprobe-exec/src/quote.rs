//! Shell quoting and command template encoding

use crate::error::ExecError;

/// Quote a string for safe use as a single `/bin/sh` word.
///
/// Strings made of unambiguous characters are passed through untouched;
/// everything else is single-quoted, with embedded single quotes escaped
/// using the standard shell idiom: end the quoted string, add an escaped
/// quote, and start a new quoted string (`don't` -> `'don'\''t'`).
#[must_use]
pub fn quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    let safe = s.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
    });
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Encode a command template into a runnable shell string.
///
/// Each `%s` placeholder substitutes exactly one quoted argument, so an
/// argument value can never be read as additional shell syntax. `%%`
/// produces a literal `%`.
pub fn encode(template: &str, args: &[&str]) -> Result<String, ExecError> {
    let mut out = String::with_capacity(template.len());
    let mut next = args.iter();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => {
                let arg = next.next().ok_or_else(|| {
                    ExecError::Template(format!(
                        "not enough arguments for template '{template}'"
                    ))
                })?;
                out.push_str(&quote(arg));
            }
            Some('%') => out.push('%'),
            other => {
                return Err(ExecError::Template(format!(
                    "unsupported placeholder '%{}' in template '{template}'",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }

    if next.next().is_some() {
        return Err(ExecError::Template(format!(
            "too many arguments for template '{template}'"
        )));
    }
    Ok(out)
}
