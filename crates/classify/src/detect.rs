//! Heuristics over tool names, file paths and payload text.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Semantic family of a tool, inferred from its raw name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    FileRead,
    FileWrite,
    Shell,
    Search,
    Web,
    Task,
    Other,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileRead => "file_read",
            Self::FileWrite => "file_write",
            Self::Shell => "shell",
            Self::Search => "search",
            Self::Web => "web",
            Self::Task => "task",
            Self::Other => "other",
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::FileRead | Self::FileWrite)
    }
}

/// Infer a semantic tool kind from a raw tool name.
pub fn infer_tool_kind(name: &str) -> ToolKind {
    let lower = name.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return ToolKind::Other;
    }
    if matches!(
        lower.as_str(),
        "read"
            | "read_file"
            | "view"
            | "cat"
            | "open"
            | "fileread"
            | "readfile"
            | "list_dir"
            | "ls"
    ) {
        return ToolKind::FileRead;
    }
    if matches!(
        lower.as_str(),
        "edit"
            | "multiedit"
            | "write"
            | "create"
            | "delete"
            | "apply_patch"
            | "str_replace_editor"
            | "edit_file"
            | "notebookedit"
            | "write_file"
            | "fileedit"
    ) {
        return ToolKind::FileWrite;
    }
    if matches!(
        lower.as_str(),
        "bash" | "shell" | "exec_command" | "run_terminal_cmd" | "execute_command" | "bashoutput"
    ) {
        return ToolKind::Shell;
    }
    if matches!(
        lower.as_str(),
        "grep" | "search" | "code_search" | "grep_search" | "file_search" | "glob" | "find"
    ) {
        return ToolKind::Search;
    }
    if lower.starts_with("web") || matches!(lower.as_str(), "fetch" | "browser") {
        return ToolKind::Web;
    }
    if lower.contains("task") || lower.contains("subagent") {
        return ToolKind::Task;
    }
    ToolKind::Other
}

/// Path argument of a file tool invocation.
pub fn input_file_path(input: &Value) -> Option<&str> {
    ["file_path", "notebook_path", "path"]
        .iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .filter(|path| !path.trim().is_empty())
}

/// Shell command argument of a shell tool invocation.
pub fn input_command(input: &Value) -> Option<&str> {
    ["command", "cmd"]
        .iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
}

// ── File type / language ────────────────────────────────────────────────────

fn basename(file_path: &str) -> &str {
    file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_path)
}

/// Extension of `file_path`, or the lower-cased file name when it has none
/// (`Dockerfile` → `dockerfile`).
pub fn file_type(file_path: &str) -> Option<String> {
    let name = basename(file_path);
    if name.is_empty() {
        return None;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_lowercase()),
        _ => Some(name.to_lowercase()),
    }
}

/// Detect programming language from file path extension
pub fn detect_language(file_path: &str) -> Option<String> {
    let name = basename(file_path);

    // Special filenames
    match name {
        "Dockerfile" | "Makefile" => return Some("bash".to_string()),
        "Cargo.toml" | "pyproject.toml" => return Some("toml".to_string()),
        _ => {}
    }

    let (_, ext) = name.rsplit_once('.')?;
    let lang = match ext.to_lowercase().as_str() {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" | "gradle" | "kts" => "kotlin",
        "swift" => "swift",
        "rb" => "ruby",
        "cpp" | "c" | "h" | "hpp" => "cpp",
        "cs" => "csharp",
        "css" | "scss" => "css",
        "html" | "svelte" | "vue" => "html",
        "xml" => "xml",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" => "markdown",
        "sql" => "sql",
        "sh" | "bash" | "zsh" => "bash",
        "diff" | "patch" => "diff",
        "properties" | "env" => "properties",
        _ => return None,
    };
    Some(lang.to_string())
}

// ── Line-number detection (cat -n output and NNNNN| format) ─────────────────

/// Matches line number prefixes:  `  1→code` or `00001| code`
static LINE_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *\d+[→|\t]").expect("valid line number regex"));

static LINE_NUM_CAPTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *(\d+)[→|\t]").expect("valid line number regex"));

/// Detect if text looks like line-numbered file content
pub fn is_line_numbered_output(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().take(5).collect();
    if lines.is_empty() {
        return false;
    }
    let match_count = lines
        .iter()
        .filter(|l| LINE_NUM_RE.is_match(l) || l.trim().is_empty())
        .count();
    match_count as f64 >= lines.len() as f64 * 0.6
}

/// First line number of line-numbered output.
pub fn numbered_start_line(text: &str) -> Option<u32> {
    if !is_line_numbered_output(text) {
        return None;
    }
    text.lines()
        .find_map(|line| LINE_NUM_CAPTURE_RE.captures(line))
        .and_then(|caps| caps[1].parse().ok())
}

// ── JSON ────────────────────────────────────────────────────────────────────

/// Nesting depth: scalars are 0, each object/array level adds one.
pub fn json_depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Parse `payload` as a complete JSON document (scalars included).
pub fn parse_json_document(payload: &str) -> Option<Value> {
    serde_json::from_str(payload.trim()).ok()
}

// ── Error subtypes ──────────────────────────────────────────────────────────

static ERROR_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "command_not_found",
            r"command not found|not recognized as an internal or external command|executable file not found",
        ),
        (
            "file_not_found",
            r"no such file or directory|does not exist|file not found|enoent|cannot find the (file|path)",
        ),
        (
            "permission_denied",
            r"permission denied|operation not permitted|eacces|access is denied",
        ),
        ("timeout", r"timed out|timeout|deadline exceeded"),
        (
            "network_error",
            r"connection (refused|reset)|network is unreachable|could not resolve host|econnrefused|enotfound|socket hang up",
        ),
        (
            "syntax_error",
            r"syntax ?error|unexpected token|parse error|invalid syntax",
        ),
        (
            "user_rejected",
            r"user (rejected|denied|declined)|doesn't want to proceed|rejected by the user",
        ),
        (
            "tool_use_error",
            r"<tool_use_error>|invalid tool parameters|inputvalidationerror",
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(&format!("(?i){pattern}")).expect("valid error pattern"),
        )
    })
    .collect()
});

/// Best-effort error category for an error payload.
pub fn error_subtype(text: &str) -> &'static str {
    ERROR_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map_or("unknown", |(name, _)| name)
}
