//! Tool wiring: linking and unlinking a tool reference inside an agent
//! source file.
//!
//! Linking inserts an import line and an entry in the agent's `tools` object
//! literal; unlinking is the exact mirror. The block is located by a
//! balanced-brace scan, not a parse; the scan skips string literals and
//! line comments. When the block cannot be located the operation returns a
//! manual-edit instruction and leaves the source untouched.
//!
//! The block-editing surface is a trait so a stricter structural backend
//! can be substituted without touching call sites.

/// Byte span of the located `tools` object literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolsBlock {
    /// Offset of the opening `{`.
    pub open: usize,
    /// Offset of the matching `}`.
    pub close: usize,
    pub multiline: bool,
}

/// Structural editing of the agent's tools block.
pub trait ToolsBlockEditor {
    fn locate_block(&self, source: &str) -> Option<ToolsBlock>;
    fn entry_keys(&self, source: &str, block: &ToolsBlock) -> Vec<String>;
    fn insert_entry(&self, source: &str, block: &ToolsBlock, key: &str, value: &str) -> String;
    fn remove_entry(&self, source: &str, block: &ToolsBlock, key: &str) -> String;
}

/// Outcome of a link or unlink operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringOutcome {
    /// Source text was changed.
    Updated(String),
    /// The operation was already satisfied; no edit applied.
    Unchanged,
    /// The structural anchor could not be located; the message tells the
    /// user what to edit by hand. No edit applied.
    ManualEdit(String),
}

/// Balanced-brace text backend.
pub struct BraceScanEditor;

impl ToolsBlockEditor for BraceScanEditor {
    fn locate_block(&self, source: &str) -> Option<ToolsBlock> {
        let open = find_tools_open_brace(source)?;
        let close = matching_brace(source, open)?;
        let multiline = source[open..close].contains('\n');
        Some(ToolsBlock {
            open,
            close,
            multiline,
        })
    }

    fn entry_keys(&self, source: &str, block: &ToolsBlock) -> Vec<String> {
        let inner = &source[block.open + 1..block.close];
        split_top_level(inner)
            .into_iter()
            .filter_map(|(s, e)| segment_key(&inner[s..e]))
            .collect()
    }

    fn insert_entry(&self, source: &str, block: &ToolsBlock, key: &str, value: &str) -> String {
        let inner = &source[block.open + 1..block.close];
        if block.multiline {
            insert_multiline(source, block, inner, key, value)
        } else {
            insert_single_line(source, block, inner, key, value)
        }
    }

    fn remove_entry(&self, source: &str, block: &ToolsBlock, key: &str) -> String {
        let inner = &source[block.open + 1..block.close];
        let segments = split_top_level(inner);
        let keyed: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, (s, e))| segment_key(&inner[*s..*e]).is_some())
            .map(|(i, _)| i)
            .collect();
        let Some(&target) = keyed
            .iter()
            .find(|&&i| segment_key(&inner[segments[i].0..segments[i].1]).as_deref() == Some(key))
        else {
            return source.to_string();
        };

        // Sole entry: collapse the whole block to an empty literal.
        if keyed.len() == 1 {
            return format!("{}{{}}{}", &source[..block.open], &source[block.close + 1..]);
        }

        let base = block.open + 1;
        let (seg_start, seg_end) = segments[target];
        let followed_by_comma = target + 1 < segments.len();
        let (cut_start, cut_end) = if followed_by_comma {
            (base + seg_start, base + seg_end + 1)
        } else {
            // Last entry: remove the comma that preceded it, keeping the
            // segment's trailing whitespace so the closing brace stays put.
            let seg_text = &inner[seg_start..seg_end];
            let trailing_ws = seg_text.len() - seg_text.trim_end().len();
            (base + seg_start - 1, base + seg_end - trailing_ws)
        };
        format!("{}{}", &source[..cut_start], &source[cut_end..])
    }
}

fn insert_single_line(
    source: &str,
    block: &ToolsBlock,
    inner: &str,
    key: &str,
    value: &str,
) -> String {
    let trimmed = inner.trim();
    let new_inner = if trimmed.is_empty() {
        format!(" {}: {} ", key, value)
    } else if trimmed.ends_with(',') {
        format!(" {} {}: {} ", trimmed, key, value)
    } else {
        format!(" {}, {}: {} ", trimmed, key, value)
    };
    format!(
        "{}{{{}}}{}",
        &source[..block.open],
        new_inner,
        &source[block.close + 1..]
    )
}

fn insert_multiline(
    source: &str,
    block: &ToolsBlock,
    inner: &str,
    key: &str,
    value: &str,
) -> String {
    let base_indent = line_indent(source, block.open);
    let last = inner.rfind(|c: char| !c.is_whitespace());
    match last {
        None => {
            // Empty multi-line block.
            let entry_indent = format!("{}  ", base_indent);
            format!(
                "{}{{\n{}{}: {},\n{}}}{}",
                &source[..block.open],
                entry_indent,
                key,
                value,
                base_indent,
                &source[block.close + 1..]
            )
        }
        Some(rel) => {
            let abs = block.open + 1 + rel;
            let entry_indent = line_indent(source, abs);
            let last_char = source.as_bytes()[abs];
            let insertion = if last_char == b',' {
                // Trailing-comma style: keep it on the new entry too.
                format!("\n{}{}: {},", entry_indent, key, value)
            } else {
                format!(",\n{}{}: {}", entry_indent, key, value)
            };
            format!("{}{}{}", &source[..abs + 1], insertion, &source[abs + 1..])
        }
    }
}

/// Indentation (leading whitespace) of the line containing `pos`.
fn line_indent(source: &str, pos: usize) -> String {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Find the opening brace of a `tools` property: the identifier `tools`
/// followed by `:` and `{`, at a property position.
fn find_tools_open_brace(source: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = source[search_from..].find("tools") {
        let at = search_from + rel;
        search_from = at + "tools".len();

        let before_ok = at == 0 || !is_ident_byte(bytes[at - 1]);
        if !before_ok {
            continue;
        }
        let mut i = at + "tools".len();
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b':' {
            continue;
        }
        i += 1;
        while i < bytes.len() && (bytes[i] as char).is_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'{' {
            return Some(i);
        }
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Offset of the `}` matching the `{` at `open`, skipping string literals
/// and line comments.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' | b'\'' | b'`' => i = skip_string(bytes, i)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the closing quote for the string starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Split text into comma-separated segments at nesting depth zero. Returns
/// byte ranges; separating commas are not included in any range.
fn split_top_level(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' | b'(' => depth += 1,
            b'}' | b']' | b')' => depth = depth.saturating_sub(1),
            b'"' | b'\'' | b'`' => {
                if let Some(end) = skip_string(bytes, i) {
                    i = end;
                }
            }
            b',' if depth == 0 => {
                ranges.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start <= bytes.len() {
        ranges.push((start, bytes.len()));
    }
    ranges
}

/// Property key of a tools-block segment, or `None` for whitespace-only
/// segments. Shorthand entries (`weatherTool`) are their own key.
fn segment_key(segment: &str) -> Option<String> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return None;
    }
    let key = trimmed.split(':').next().unwrap_or(trimmed).trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

// --- Import statement handling -------------------------------------------

/// Byte spans of top-level import statements, one per statement (multi-line
/// statements produce one span covering all their lines).
fn import_spans(source: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    let mut current: Option<usize> = None;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if current.is_none() && (trimmed.starts_with("import ") || trimmed.starts_with("import{")) {
            current = Some(offset);
        }
        if let Some(start) = current {
            if line.contains(';') {
                spans.push((start, offset + line.len()));
                current = None;
            }
        }
        offset += line.len();
    }
    if let Some(start) = current {
        spans.push((start, source.len()));
    }
    spans
}

fn in_spans(spans: &[(usize, usize)], pos: usize) -> bool {
    spans.iter().any(|&(s, e)| pos >= s && pos < e)
}

/// Is `symbol` present as a whole identifier anywhere in `text`?
fn contains_ident(text: &str, symbol: &str) -> bool {
    find_ident(text, symbol, 0).is_some()
}

fn find_ident(text: &str, symbol: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut search = from;
    while let Some(rel) = text[search..].find(symbol) {
        let at = search + rel;
        let before_ok = at == 0 || !is_ident_byte(bytes[at - 1]);
        let after = at + symbol.len();
        let after_ok = after >= bytes.len() || !is_ident_byte(bytes[after]);
        if before_ok && after_ok {
            return Some(at);
        }
        search = at + symbol.len();
    }
    None
}

/// Is the symbol referenced outside import statements?
fn referenced_outside_imports(source: &str, symbol: &str) -> bool {
    let spans = import_spans(source);
    let mut from = 0;
    while let Some(at) = find_ident(source, symbol, from) {
        if !in_spans(&spans, at) {
            return true;
        }
        from = at + symbol.len();
    }
    false
}

/// Insert `import { symbol } from "path";` after the last import statement,
/// or at the top of the file when there are none.
fn insert_import(source: &str, symbol: &str, path: &str) -> String {
    let line = format!("import {{ {} }} from \"{}\";", symbol, path);
    let spans = import_spans(source);
    match spans.last() {
        Some(&(_, end)) => {
            if source[..end].ends_with('\n') {
                format!("{}{}\n{}", &source[..end], line, &source[end..])
            } else {
                format!("{}\n{}{}", &source[..end], line, &source[end..])
            }
        }
        None => format!("{}\n{}", line, source),
    }
}

/// Remove `symbol` from whichever import statement binds it. A statement
/// importing only this symbol is deleted outright; otherwise the symbol is
/// cut out of the braces, comma and all.
fn remove_symbol_import(source: &str, symbol: &str) -> String {
    let spans = import_spans(source);
    for &(start, end) in &spans {
        let stmt = &source[start..end];
        let Some(brace_open) = stmt.find('{') else {
            continue;
        };
        let Some(brace_close_rel) = stmt[brace_open..].find('}') else {
            continue;
        };
        let brace_close = brace_open + brace_close_rel;
        let inner = &stmt[brace_open + 1..brace_close];
        if !contains_ident(inner, symbol) {
            continue;
        }
        let segments = split_top_level(inner);
        let named: Vec<(usize, usize)> = segments
            .into_iter()
            .filter(|&(s, e)| !inner[s..e].trim().is_empty())
            .collect();
        let Some(idx) = named
            .iter()
            .position(|&(s, e)| imported_name(&inner[s..e]) == symbol)
        else {
            continue;
        };

        if named.len() == 1 {
            // Whole statement goes away.
            return format!("{}{}", &source[..start], &source[end..]);
        }
        let base = start + brace_open + 1;
        let (seg_start, seg_end) = named[idx];
        let (cut_start, cut_end) = if idx + 1 < named.len() {
            // Remove through the following comma.
            let mut e = seg_end;
            if inner.as_bytes().get(e) == Some(&b',') {
                e += 1;
            }
            (base + seg_start, base + e)
        } else {
            let seg_text = &inner[seg_start..seg_end];
            let trailing_ws = seg_text.len() - seg_text.trim_end().len();
            (base + seg_start - 1, base + seg_end - trailing_ws)
        };
        return format!("{}{}", &source[..cut_start], &source[cut_end..]);
    }
    source.to_string()
}

/// Local binding introduced by one import clause segment (`a` or `a as b`
/// binds `b`).
fn imported_name(segment: &str) -> &str {
    let trimmed = segment.trim();
    match trimmed.rsplit_once(" as ") {
        Some((_, local)) => local.trim(),
        None => trimmed,
    }
}

// --- Link / unlink --------------------------------------------------------

fn manual_link_instruction(key: &str, symbol: &str, path: &str) -> String {
    format!(
        "Could not locate the `tools` object in the agent source. \
         Add `{}: {}` to the agent's tools map and add \
         `import {{ {} }} from \"{}\";` near the top of the file.",
        key, symbol, symbol, path
    )
}

fn manual_unlink_instruction(key: &str, symbol: &str) -> String {
    format!(
        "Could not locate the `tools` object in the agent source. \
         Remove `{}: {}` from the agent's tools map and delete the \
         `{}` import if nothing else uses it.",
        key, symbol, symbol
    )
}

/// Link a tool into an agent source file. Idempotent: a key already present
/// in the tools block reports `Unchanged`.
pub fn link_tool(
    source: &str,
    key: &str,
    symbol: &str,
    import_path: &str,
    editor: &dyn ToolsBlockEditor,
) -> WiringOutcome {
    let Some(block) = editor.locate_block(source) else {
        return WiringOutcome::ManualEdit(manual_link_instruction(key, symbol, import_path));
    };
    if editor.entry_keys(source, &block).iter().any(|k| k == key) {
        return WiringOutcome::Unchanged;
    }

    let with_import = if contains_ident(source, symbol) {
        source.to_string()
    } else {
        insert_import(source, symbol, import_path)
    };
    // Offsets moved with the import insertion; locate again.
    let Some(block) = editor.locate_block(&with_import) else {
        return WiringOutcome::ManualEdit(manual_link_instruction(key, symbol, import_path));
    };
    WiringOutcome::Updated(editor.insert_entry(&with_import, &block, key, symbol))
}

/// Unlink a tool from an agent source file: the mirror of [`link_tool`].
pub fn unlink_tool(
    source: &str,
    key: &str,
    symbol: &str,
    editor: &dyn ToolsBlockEditor,
) -> WiringOutcome {
    let Some(block) = editor.locate_block(source) else {
        return WiringOutcome::ManualEdit(manual_unlink_instruction(key, symbol));
    };
    if !editor.entry_keys(source, &block).iter().any(|k| k == key) {
        return WiringOutcome::Unchanged;
    }

    let without_entry = editor.remove_entry(source, &block, key);
    let result = if referenced_outside_imports(&without_entry, symbol) {
        without_entry
    } else {
        remove_symbol_import(&without_entry, symbol)
    };
    WiringOutcome::Updated(result)
}
