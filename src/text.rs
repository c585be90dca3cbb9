/// Characters Windows refuses in file names.
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// First line of the clipboard text with carriage returns removed and surrounding whitespace trimmed.
pub fn first_line(content: &str) -> String {
    let line = content.split('\n').next().unwrap_or_default();
    line.replace('\r', "").trim().to_string()
}

/// Remove the first prefix of the pipe-delimited set that the line starts with.
/// Candidates are tried in the order they are listed; empty candidates are skipped.
pub fn strip_prefix_set<'a>(line: &'a str, prefix_set: &str) -> &'a str {
    prefix_set
        .split('|')
        .filter(|p| !p.is_empty())
        .find_map(|p| line.strip_prefix(p))
        .unwrap_or(line)
}

/// Replace every character that cannot appear in a file name with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Build the target file name from clipboard text.
///
/// Returns `None` when the first line is blank, in which case nothing should be saved.
pub fn derive_filename(content: &str, prefix_set: &str, extension: &str) -> Option<String> {
    let line = first_line(content);
    if line.is_empty() {
        return None;
    }
    let base = strip_prefix_set(&line, prefix_set).trim();
    Some(format!("{}{}", sanitize_filename(base), extension))
}
