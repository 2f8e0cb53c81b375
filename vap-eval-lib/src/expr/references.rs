//! Lexical scan for policy variable references in CEL source

use crate::policy::VARIABLES_ROOT;

/// Names read through the `variables` root, deduplicated in first-use order
///
/// Recognizes `variables.name` and `variables["name"]` where `variables` is a
/// bare identifier. String and bytes literals and `//` comments are skipped, and
/// `variables` used as a field (`object.spec.variables.count`) is not a reference.
/// Dynamic indexing such as `variables[key]` is not resolved.
pub fn variable_references(source: &str) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut refs: Vec<String> = Vec::new();
    let mut after_dot = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if let Some(end) = string_literal_end(&chars, i) {
            i = end;
            after_dot = false;
            continue;
        }

        if is_identifier_start(c) {
            let start = i;
            while i < chars.len() && is_identifier_continue(chars[i]) {
                i += 1;
            }

            let is_root = !after_dot && chars[start..i].iter().copied().eq(VARIABLES_ROOT.chars());
            after_dot = false;

            if is_root && let Some((name, end)) = selected_name(&chars, i) {
                if !refs.contains(&name) {
                    refs.push(name);
                }
                i = end;
            }
            continue;
        }

        if c.is_ascii_digit() {
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || (chars[i] == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)))
            {
                i += 1;
            }
            after_dot = false;
            continue;
        }

        after_dot = c == '.';
        i += 1;
    }

    refs
}

/// The name selected from `variables` by the tokens starting at `i`, and where they end
fn selected_name(chars: &[char], i: usize) -> Option<(String, usize)> {
    let i = skip_whitespace(chars, i);

    match chars.get(i)? {
        '.' => {
            let start = skip_whitespace(chars, i + 1);
            let mut end = start;
            if !chars.get(start).copied().is_some_and(is_identifier_start) {
                return None;
            }
            while end < chars.len() && is_identifier_continue(chars[end]) {
                end += 1;
            }
            Some((chars[start..end].iter().collect(), end))
        }
        '[' => {
            let open = skip_whitespace(chars, i + 1);
            let quote = *chars.get(open)?;
            if quote != '\'' && quote != '"' {
                return None;
            }

            let close = open + 1 + chars[open + 1..].iter().position(|&ch| ch == quote)?;
            let name: String = chars[open + 1..close].iter().collect();
            if name.contains('\\') {
                return None;
            }

            let bracket = skip_whitespace(chars, close + 1);
            (chars.get(bracket) == Some(&']')).then_some((name, bracket + 1))
        }
        _ => None,
    }
}

/// If a string or bytes literal starts at `i`, the index just past its end
fn string_literal_end(chars: &[char], i: usize) -> Option<usize> {
    let mut j = i;
    let mut raw = false;
    while j < chars.len() && j - i < 2 && matches!(chars[j], 'r' | 'R' | 'b' | 'B') {
        raw |= matches!(chars[j], 'r' | 'R');
        j += 1;
    }

    let quote = *chars.get(j)?;
    if quote != '\'' && quote != '"' {
        return None;
    }

    // a prefix is only a prefix when it is not the tail of a longer identifier
    if j > i && i > 0 && is_identifier_continue(chars[i - 1]) {
        return None;
    }

    let triple = chars.get(j + 1) == Some(&quote) && chars.get(j + 2) == Some(&quote);
    let mut k = if triple { j + 3 } else { j + 1 };

    while k < chars.len() {
        if !raw && chars[k] == '\\' {
            k += 2;
            continue;
        }

        if chars[k] == quote {
            if !triple {
                return Some(k + 1);
            }
            if chars.get(k + 1) == Some(&quote) && chars.get(k + 2) == Some(&quote) {
                return Some(k + 3);
            }
        }

        k += 1;
    }

    Some(chars.len())
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

const fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
