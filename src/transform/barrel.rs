//! Barrel manifest maintenance.
//!
//! The manifest is a source file whose structurally significant content is
//! an ordered list of side-effect import lines preceding a fixed export
//! statement. Membership is a set; order is insertion order of first add.
//! Both operations are idempotent and `remove(add(base, p), p) == base`
//! holds for any baseline that does not already import `p`.

/// Does the manifest already contain a side-effect import of `path`?
pub fn has_import(content: &str, path: &str) -> bool {
    content.lines().any(|line| is_import_of(line, path))
}

fn is_import_of(line: &str, path: &str) -> bool {
    let trimmed = line.trim();
    trimmed == format!("import \"{}\";", path)
        || trimmed == format!("import '{}';", path)
        || trimmed == format!("import \"{}\"", path)
        || trimmed == format!("import '{}'", path)
}

fn is_side_effect_import(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import \"") || trimmed.starts_with("import '")
}

/// Add a side-effect import line. No-op when the import is already present.
///
/// Insertion point: after the last existing side-effect import line, else
/// before the first `export` line, else the end of the file.
pub fn add_import(content: &str, path: &str) -> String {
    if has_import(content, path) {
        return content.to_string();
    }
    let line = format!("import \"{}\";", path);

    // Byte offset to insert at, always a line start.
    let mut insert_at: Option<usize> = None;

    let mut offset = 0;
    let mut last_import_end: Option<usize> = None;
    let mut first_export_start: Option<usize> = None;
    for l in content.split_inclusive('\n') {
        if is_side_effect_import(l) {
            last_import_end = Some(offset + l.len());
        } else if first_export_start.is_none() && l.trim_start().starts_with("export ") {
            first_export_start = Some(offset);
        }
        offset += l.len();
    }
    if let Some(end) = last_import_end {
        insert_at = Some(end);
    } else if let Some(start) = first_export_start {
        insert_at = Some(start);
    }

    match insert_at {
        Some(at) if at <= content.len() && starts_line(content, at) => {
            format!("{}{}\n{}", &content[..at], line, &content[at..])
        }
        Some(at) => {
            // Last import line has no trailing newline: append on a new line.
            debug_assert_eq!(at, content.len());
            format!("{}\n{}", content, line)
        }
        None => {
            if content.is_empty() {
                format!("{}\n", line)
            } else if content.ends_with('\n') {
                format!("{}{}\n", content, line)
            } else {
                format!("{}\n{}", content, line)
            }
        }
    }
}

fn starts_line(content: &str, at: usize) -> bool {
    at == 0 || content.as_bytes().get(at - 1) == Some(&b'\n')
}

/// Remove the side-effect import of `path`. No-op when absent.
pub fn remove_import(content: &str, path: &str) -> String {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if is_import_of(line.trim_end_matches('\n'), path) {
            let start = offset;
            let end = offset + line.len();
            if line.ends_with('\n') {
                return format!("{}{}", &content[..start], &content[end..]);
            }
            // Line at EOF without trailing newline: also drop the newline
            // that separated it from the previous line, restoring the
            // pre-add shape exactly.
            let cut = if start > 0 && content.as_bytes()[start - 1] == b'\n' {
                start - 1
            } else {
                start
            };
            return content[..cut].to_string();
        }
        offset += line.len();
    }
    content.to_string()
}

/// Import paths currently present, in file order.
pub fn list_imports(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed
                .strip_prefix("import \"")
                .map(|r| ('"', r))
                .or_else(|| trimmed.strip_prefix("import '").map(|r| ('\'', r)))?;
            let (quote, rest) = rest;
            rest.split(quote).next().map(|s| s.to_string())
        })
        .collect()
}
