//! Dotted-path parsing and rendering shared by sets, groups and the registry.

use crate::error::ParseError;

/// Splits a dotted path into its segments.
///
/// The empty string is the one-element "root" path `[""]`, per the grammar's
/// explicit carve-out; it is not an error.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

pub fn join_path(segments: &[String]) -> String {
    segments.join(".")
}

/// The head and body of a permission line, before a `Permission` is built
/// from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub negating: bool,
    pub path: Vec<String>,
    pub wildcard: bool,
    pub arg: Option<String>,
}

fn validate_segments(path_part: &str) -> Result<Vec<String>, ParseError> {
    let segments = split_path(path_part);
    if segments.len() > 1 && segments.iter().any(String::is_empty) {
        return Err(ParseError::EmptySegment(path_part.to_string()));
    }
    if segments.iter().take(segments.len().saturating_sub(1)).any(|s| s == "*") {
        return Err(ParseError::WildcardNotLast(path_part.to_string()));
    }
    Ok(segments)
}

/// Parses one logical permission line (already reassembled across any
/// continuation lines, joined by `\n`).
pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let negating = line.starts_with('-');
    let rest = if negating { &line[1..] } else { line };
    if rest.starts_with('-') {
        return Err(ParseError::LeadingHyphenMisplaced(line.to_string()));
    }

    let (path_part, arg) = match rest.split_once(':') {
        Some((p, a)) => (p, Some(parse_arg(a))),
        None => (rest, None),
    };

    let mut segments = validate_segments(path_part)?;
    let wildcard = segments.last().map(|s| s == "*").unwrap_or(false);
    if wildcard {
        segments.pop();
    }

    Ok(ParsedLine {
        negating,
        path: segments,
        wildcard,
        arg,
    })
}

/// Strips the one mandatory level of continuation indent (4 spaces) from
/// every continuation line of a multi-line arg, so the stored value is
/// always the logical body with no rendering-level indent baked in.
/// [`apply_to_path`] is the only place that ever adds it back.
fn dedent_continuations(lines: impl Iterator<Item = impl AsRef<str>>) -> String {
    lines.map(|l| l.as_ref().strip_prefix("    ").unwrap_or(l.as_ref()).to_string()).collect::<Vec<_>>().join("\n")
}

fn parse_arg(raw: &str) -> String {
    if let Some(multiline) = raw.strip_prefix('\n') {
        dedent_continuations(multiline.split('\n'))
    } else {
        let inline = raw.strip_prefix(' ').unwrap_or(raw);
        match inline.split_once('\n') {
            Some((first, rest)) => format!("{first}\n{}", dedent_continuations(rest.split('\n'))),
            None => inline.to_string(),
        }
    }
}

/// Renders `path` (with `.*` trailing segment already appended by the
/// caller, if this is a wildcard entry) prefixed with `-` when `permission`
/// negates.
pub fn apply_to_path_without_arg(path: &str, permits: bool) -> String {
    if permits {
        path.to_string()
    } else {
        format!("-{path}")
    }
}

/// As [`apply_to_path_without_arg`], but appends `: arg` (or an indented
/// multi-line body) when an argument is present.
pub fn apply_to_path(path: &str, permits: bool, arg: Option<&str>) -> String {
    let head = apply_to_path_without_arg(path, permits);
    match arg {
        None => head,
        Some(arg) if !arg.contains('\n') => format!("{head}: {arg}"),
        Some(arg) => {
            let mut out = format!("{head}:");
            for line in arg.split('\n') {
                out.push_str("\n    ");
                out.push_str(line);
            }
            out
        }
    }
}

/// Prefixes every line of `s` with `indent`.
pub fn indent_block(s: &str, indent: &str) -> String {
    s.lines().map(|line| format!("{indent}{line}")).collect::<Vec<_>>().join("\n")
}

/// Formats a priority, omitting the decimal point for integer values.
pub fn format_priority(priority: f64) -> String {
    if priority.fract() == 0.0 && priority.is_finite() {
        format!("{}", priority as i64)
    } else {
        format!("{priority}")
    }
}

pub fn parse_priority(s: &str) -> Result<f64, ParseError> {
    s.trim().parse::<f64>().map_err(|_| ParseError::MalformedPriority(s.to_string()))
}
