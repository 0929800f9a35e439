//! Cursor context extraction and suggestion cleanup.

use agentpane_core::agent::FileSnippet;

/// Cuts up to `context_lines` lines before and after the cursor out of
/// `text`. Positions past the end of a line or the document are clamped.
pub fn extract_snippet(
    path: &str,
    text: &str,
    line: u32,
    character: u32,
    context_lines: usize,
) -> FileSnippet {
    let lines: Vec<&str> = text.split('\n').collect();
    let cursor_line = (line as usize).min(lines.len().saturating_sub(1));
    let current = lines.get(cursor_line).copied().unwrap_or_default();

    let split_at = current
        .char_indices()
        .nth(character as usize)
        .map(|(i, _)| i)
        .unwrap_or(current.len());
    let (line_before, line_after) = current.split_at(split_at);

    let first = cursor_line.saturating_sub(context_lines);
    let last = (cursor_line + context_lines).min(lines.len().saturating_sub(1));

    let mut before_cursor = lines[first..cursor_line].join("\n");
    if cursor_line > first {
        before_cursor.push('\n');
    }
    before_cursor.push_str(line_before);

    let mut after_cursor = line_after.to_string();
    if last > cursor_line {
        after_cursor.push('\n');
        after_cursor.push_str(&lines[cursor_line + 1..=last].join("\n"));
    }

    FileSnippet {
        path: path.to_string(),
        line,
        character,
        before_cursor,
        after_cursor,
    }
}

/// Cleans an agent suggestion for insertion at the cursor.
///
/// Strips surrounding markdown code fences, then drops the longest tail of
/// the suggestion that the document already contains right after the
/// cursor. Returns `None` if nothing is left to insert.
pub fn trim_suggestion(suggestion: &str, after_cursor: &str) -> Option<String> {
    let unfenced = strip_code_fences(suggestion);

    let overlap = unfenced
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| after_cursor.starts_with(&unfenced[i..]))
        .unwrap_or(unfenced.len());
    let trimmed = &unfenced[..overlap];

    if trimmed.trim().is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim_matches('\n');
    if !trimmed.trim_start().starts_with("```") {
        return trimmed;
    }

    // Drop the opening fence line (with its language tag).
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return "",
    };
    let body = body.trim_end();
    body.strip_suffix("```")
        .map(|b| b.trim_end_matches('\n'))
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "line0\nline1\nfn main() {\n    let x = 1;\n}\nline5";

    #[test]
    fn test_snippet_around_cursor() {
        let snippet = extract_snippet("main.rs", DOC, 3, 8, 1);

        assert_eq!(snippet.before_cursor, "fn main() {\n    let ");
        assert_eq!(snippet.after_cursor, "x = 1;\n}");
        assert_eq!(snippet.path, "main.rs");
    }

    #[test]
    fn test_snippet_clamps_positions() {
        let snippet = extract_snippet("a", DOC, 99, 99, 50);
        assert_eq!(snippet.before_cursor, DOC);
        assert_eq!(snippet.after_cursor, "");

        let start = extract_snippet("a", DOC, 0, 0, 1);
        assert_eq!(start.before_cursor, "");
        assert_eq!(start.after_cursor, "line0\nline1");
    }

    #[test]
    fn test_snippet_multibyte_column() {
        let snippet = extract_snippet("a", "héllo", 0, 2, 5);
        assert_eq!(snippet.before_cursor, "hé");
        assert_eq!(snippet.after_cursor, "llo");
    }

    #[test]
    fn test_trim_overlap_with_following_text() {
        assert_eq!(
            trim_suggestion("x + 1);", ");\n}").as_deref(),
            Some("x + 1")
        );
        assert_eq!(trim_suggestion("foo", "bar").as_deref(), Some("foo"));
        assert_eq!(trim_suggestion(");", ");"), None);
    }

    #[test]
    fn test_trim_code_fences() {
        assert_eq!(
            trim_suggestion("```rust\nlet y = 2;\n```\n", "").as_deref(),
            Some("let y = 2;")
        );
        assert_eq!(trim_suggestion("```\n```", ""), None);
        assert_eq!(trim_suggestion("   \n", ""), None);
    }
}
