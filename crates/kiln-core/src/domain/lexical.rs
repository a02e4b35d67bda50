//! Lexical helpers for the generated script language.
//!
//! The compiler never parses user code. It only needs to know where string
//! literals and comments are, so that it can find a matching parenthesis,
//! ignore a trailing comment and quote literal text safely.

/// Opening long bracket (`[[`, `[=[`, ...) at `start`: returns its level and
/// byte length.
fn long_bracket_open(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    if bytes.get(start) != Some(&b'[') {
        return None;
    }
    let mut i = start + 1;
    while bytes.get(i) == Some(&b'=') {
        i += 1;
    }
    (bytes.get(i) == Some(&b'[')).then_some((i - start - 1, i + 1 - start))
}

fn long_bracket_end(code: &str, from: usize, level: usize) -> Option<usize> {
    let closer = format!("]{}]", "=".repeat(level));
    code[from..]
        .find(&closer)
        .map(|offset| from + offset + closer.len())
}

fn short_string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Byte positions of a code line that lie outside strings and comments.
///
/// Scanning stops at a line comment or at a string literal that runs off the
/// end of the line.
fn significant_positions(code: &str) -> Vec<usize> {
    let bytes = code.as_bytes();
    let mut positions = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let next = match bytes[i] {
            b'\'' | b'"' => short_string_end(bytes, i),
            b'[' => match long_bracket_open(bytes, i) {
                Some((level, len)) => long_bracket_end(code, i + len, level),
                None => {
                    positions.push(i);
                    Some(i + 1)
                }
            },
            b'-' if bytes.get(i + 1) == Some(&b'-') => match long_bracket_open(bytes, i + 2) {
                Some((level, len)) => long_bracket_end(code, i + 2 + len, level),
                // line comment
                None => return positions,
            },
            _ => {
                positions.push(i);
                Some(i + 1)
            }
        };
        match next {
            Some(next) => i = next,
            None => return positions,
        }
    }
    positions
}

/// Byte index of the parenthesis closing the one at `open`.
///
/// Parentheses inside string literals, long brackets and comments are
/// ignored. Returns `None` when the call is unbalanced.
pub fn find_closing_paren(code: &str, open: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    for pos in significant_positions(code)
        .into_iter()
        .filter(|&pos| pos >= open)
    {
        match bytes[pos] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Code with trailing comments, trailing string literals and whitespace
/// removed.
///
/// Used to look at how a line *ends* without being fooled by
/// `x = "then" -- do`.
pub fn significant_prefix(code: &str) -> &str {
    let last = significant_positions(code)
        .into_iter()
        .rev()
        .find(|&pos| !code.as_bytes()[pos].is_ascii_whitespace());
    match last {
        Some(pos) => {
            let end = (pos + 1..=code.len())
                .find(|&end| code.is_char_boundary(end))
                .unwrap_or(code.len());
            &code[..end]
        }
        None => "",
    }
}

/// Quote `content` as a string literal.
///
/// Short quotes are used when the content has no backslash and no matching
/// quote character. Otherwise the lowest long-bracket level whose closer
/// first appears right after the content is chosen. Content with control
/// characters other than tab is escaped instead, since both literal forms
/// would turn a raw `\r` into a line break.
pub fn quote_literal(content: &str) -> String {
    if content.chars().any(needs_escape) {
        return escaped_literal(content);
    }
    if !content.contains('\\') {
        if !content.contains('\'') {
            return format!("'{content}'");
        }
        if !content.contains('"') {
            return format!("\"{content}\"");
        }
    }
    let mut level = 0;
    loop {
        let equals = "=".repeat(level);
        let closer = format!("]{equals}]");
        let probe = format!("{content}{closer}");
        if probe.find(&closer) == Some(content.len()) {
            return format!("[{equals}[{content}]{equals}]");
        }
        level += 1;
    }
}

fn needs_escape(c: char) -> bool {
    c.is_ascii_control() && c != '\t'
}

/// A double-quoted literal with backslash escapes.
fn escaped_literal(content: &str) -> String {
    let mut quoted = String::with_capacity(content.len() + 2);
    quoted.push('"');
    for c in content.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\r' => quoted.push_str("\\r"),
            '\n' => quoted.push_str("\\n"),
            // three digits so a following digit is not swallowed
            c if needs_escape(c) => quoted.push_str(&format!("\\{:03}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Whether `code` ends with `keyword` as a whole word.
pub fn ends_with_keyword(code: &str, keyword: &str) -> bool {
    code.strip_suffix(keyword).is_some_and(|head| {
        !head
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Whether `code` starts with `keyword` as a whole word.
pub fn starts_with_keyword(code: &str, keyword: &str) -> bool {
    code.strip_prefix(keyword).is_some_and(|tail| {
        !tail
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_paren_skips_nested_calls() {
        let code = "print(f(a, g(b)), c) .. x";
        assert_eq!(find_closing_paren(code, 5), Some(19));
    }

    #[test]
    fn closing_paren_ignores_parens_in_strings() {
        let code = r#"print(")", '(\'', [[)]], [==[ ]] ) ]==]) -- )"#;
        let close = find_closing_paren(code, 5).unwrap();
        assert_eq!(&code[close..close + 1], ")");
        assert_eq!(&code[close + 1..], " -- )");
    }

    #[test]
    fn unbalanced_call_has_no_close() {
        assert_eq!(find_closing_paren("print(a, (b)", 5), None);
        assert_eq!(find_closing_paren("print(\"unterminated)", 5), None);
        assert_eq!(find_closing_paren("print(a -- )", 5), None);
    }

    #[test]
    fn significant_prefix_drops_comments_and_trailing_strings() {
        assert_eq!(significant_prefix("for i = 1, 3 do -- loop"), "for i = 1, 3 do");
        assert_eq!(significant_prefix("if x then --[[ c ]]"), "if x then");
        assert_eq!(significant_prefix("x = \"then\""), "x =");
        assert_eq!(significant_prefix("-- only a comment"), "");
    }

    #[test]
    fn quote_prefers_short_quotes() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("it's"), "\"it's\"");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn quote_falls_back_to_long_brackets() {
        assert_eq!(quote_literal("both ' and \""), "[[both ' and \"]]");
        assert_eq!(quote_literal("C:\\path"), "[[C:\\path]]");
        assert_eq!(quote_literal("a ]] b\\"), "[=[a ]] b\\]=]");
        assert_eq!(quote_literal("\\ ]=] ]]"), "[==[\\ ]=] ]]]==]");
    }

    #[test]
    fn long_bracket_level_avoids_trailing_bracket_collision() {
        assert_eq!(quote_literal("x]\\"), "[[x]\\]]");
        // content ending in "]" would close one byte early at level 0
        assert_eq!(quote_literal("x\\]"), "[=[x\\]]=]");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(quote_literal("a\rb"), r#""a\rb""#);
        assert_eq!(quote_literal("say \"hi\"\r"), r#""say \"hi\"\r""#);
        assert_eq!(quote_literal("C:\\dir\r"), r#""C:\\dir\r""#);
        assert_eq!(quote_literal("bell\u{7}1"), r#""bell\0071""#);
        // tabs are safe inside short strings
        assert_eq!(quote_literal("a\tb"), "'a\tb'");
    }

    #[test]
    fn keyword_matching_respects_word_boundaries() {
        assert!(ends_with_keyword("for i = 1, 2 do", "do"));
        assert!(!ends_with_keyword("undo", "do"));
        assert!(starts_with_keyword("else", "else"));
        assert!(starts_with_keyword("end)", "end"));
        assert!(!starts_with_keyword("endpoint = 1", "end"));
    }
}
