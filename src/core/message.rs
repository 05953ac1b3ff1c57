// csv2timeline - core/message.rs
//
// Message template rendering: `{column}` placeholders filled from a row.

use crate::core::model::Row;

/// Render `template`, replacing each `{H}` whose `H` is one of `headers`
/// with the row's raw value for `H`.
///
/// The template is scanned once, left to right. Substituted values are
/// never rescanned, and a placeholder is only replaced when its whole
/// bracketed name is a configured header the row actually carries. Anything
/// else, including unknown names and stray braces, is copied verbatim.
pub fn render(template: &str, row: &Row<'_>, headers: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(|c| c == '{' || c == '}') {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                match lookup(name, row, headers) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            // Unterminated, or another `{` opens first: keep this brace as text.
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn lookup<'a>(name: &str, row: &Row<'a>, headers: &[String]) -> Option<&'a str> {
    if headers.iter().any(|h| h == name) {
        row.get(name)
    } else {
        None
    }
}
