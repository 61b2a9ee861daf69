//! Helpers for the pipe tables found in Learn Markdown.

/// True for a line that begins with a pipe (after trimming).
pub fn is_pipe_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// True for a separator row such as `|---|:---:|`.
///
/// With pipes, dashes and spaces removed, what remains must be empty or
/// colons only.
pub fn is_separator(line: &str) -> bool {
    is_pipe_line(line)
        && line
            .chars()
            .filter(|c| !matches!(c, '|' | '-' | ' ' | '\t'))
            .all(|c| c == ':')
}

/// Split a pipe row into its cells, keeping empty cells in place.
///
/// `| a | | b |` gives `["a", "", "b"]`.
pub fn split_cells(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

/// Strip surrounding backtick and asterisk markup (and the whitespace
/// inside it) from a cell.
pub fn strip_markup(cell: &str) -> &str {
    cell.trim()
        .trim_matches(|c| c == '`' || c == '*')
        .trim()
}

/// Level of an ATX heading (`## Title` is 2), or `None` for other lines.
pub fn heading_level(line: &str) -> Option<usize> {
    let line = line.trim();
    let level = line.chars().take_while(|&c| c == '#').count();
    let rest = &line[level..];
    ((1..=6).contains(&level) && (rest.is_empty() || rest.starts_with([' ', '\t']))).then_some(level)
}

/// Title of a `### ` heading, if the line is one.
pub fn heading3(line: &str) -> Option<&str> {
    line.trim().strip_prefix("### ").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_variants() {
        assert!(is_separator("|---|---|"));
        assert!(is_separator("| :--- | :---: | ---: |"));
        assert!(is_separator("| | |"));
        assert!(!is_separator("| gpt-4 | 0613 |"));
        assert!(!is_separator("---"), "no pipe, not a table separator");
    }

    #[test]
    fn split_keeps_empty_cells() {
        assert_eq!(split_cells("| eastus | ✅ | |"), vec!["eastus", "✅", ""]);
        assert_eq!(split_cells("| a |"), vec!["a"]);
    }

    #[test]
    fn markup_stripped() {
        assert_eq!(strip_markup(" **`gpt-4o`** "), "gpt-4o");
        assert_eq!(strip_markup("`Legacy`"), "Legacy");
        assert_eq!(strip_markup("plain"), "plain");
    }

    #[test]
    fn heading_title() {
        assert_eq!(heading3("### Audio "), Some("Audio"));
        assert_eq!(heading3("## Audio"), None);
        assert_eq!(heading3("#### Audio"), None);
    }

    #[test]
    fn heading_levels() {
        assert_eq!(heading_level("## Regions"), Some(2));
        assert_eq!(heading_level("  ### Global Batch model availability"), Some(3));
        assert_eq!(heading_level("#### Note"), Some(4));
        assert_eq!(heading_level("#"), Some(1));
        assert_eq!(heading_level("#hashtag"), None);
        assert_eq!(heading_level("####### too deep"), None);
        assert_eq!(heading_level("| # | a |"), None);
    }
}
