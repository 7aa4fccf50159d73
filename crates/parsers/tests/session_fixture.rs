use sessiontree_core::{get_session_info, BlockRef, ContentBlock, ResultLink, Role};
use sessiontree_parsers::{
    parse_file, DataSource, ParseError, StaticSource, StreamParser, TailSource,
};
use std::io::Write;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/claude_code/session.jsonl")
}

#[test]
fn fixture_parses_with_line_numbered_errors() {
    let batch = parse_file(&fixture_path()).unwrap();
    assert_eq!(batch.messages.len(), 12);

    let errors: Vec<(usize, &ParseError)> = batch
        .errors
        .iter()
        .map(|error| (error.line, &error.error))
        .collect();
    assert_eq!(errors.len(), 3);
    assert!(matches!(
        errors[0],
        (1, ParseError::UnsupportedShape { entry_type, .. }) if entry_type == "file-history-snapshot"
    ));
    assert!(matches!(errors[1], (7, ParseError::Malformed { .. })));
    assert!(matches!(
        errors[2],
        (13, ParseError::UnsupportedShape { entry_type, .. }) if entry_type == "summary"
    ));
}

#[test]
fn fixture_links_results_to_calls() {
    let batch = parse_file(&fixture_path()).unwrap();

    let links: Vec<(String, Option<String>)> = batch
        .messages
        .iter()
        .flat_map(|message| message.blocks.iter())
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                tool_use_id, link, ..
            } => Some((tool_use_id.clone(), link.tool_name().map(str::to_string))),
            _ => None,
        })
        .collect();
    assert_eq!(
        links,
        vec![
            ("toolu_01".to_string(), Some("Read".to_string())),
            ("toolu_02".to_string(), Some("Bash".to_string())),
            (
                "toolu_03".to_string(),
                Some("mcp__github__get_issue".to_string())
            ),
            ("toolu_04".to_string(), Some("Read".to_string())),
            ("toolu_99".to_string(), None),
        ]
    );

    let ContentBlock::ToolResult { link, .. } = &batch.messages[2].blocks[0] else {
        panic!("Expected ToolResult");
    };
    assert_eq!(
        link,
        &ResultLink::Resolved {
            call: BlockRef::new(1, 1),
            tool_name: "Read".to_string(),
        }
    );
}

#[test]
fn fixture_session_info_uses_first_values() {
    let batch = parse_file(&fixture_path()).unwrap();
    let info = get_session_info(&batch.messages);
    assert_eq!(
        info.session_id.as_deref(),
        Some("0b6c7f2e-4a51-4f1e-9a3d-2c8e5b7d9f10")
    );
    assert_eq!(info.cwd.as_deref(), Some("/home/dev/project"));
    assert_eq!(info.git_branch.as_deref(), Some("main"));
    assert_eq!(info.model.as_deref(), Some("claude-sonnet-4-5"));
    assert_eq!(
        info.title.as_deref(),
        Some("Why does the config loader ignore my env file?")
    );
    assert_eq!(info.tool_call_count, 4);
    assert_eq!(info.tool_result_count, 5);
    assert_eq!(info.duration_seconds(), Some(60));
    assert_eq!(batch.messages[11].role, Role::System);
}

#[test]
fn tailing_a_growing_file_matches_batch_parse() {
    let content = std::fs::read_to_string(fixture_path()).unwrap();
    let (head, tail) = content.as_bytes().split_at(content.len() / 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.jsonl");
    std::fs::write(&path, head).unwrap();

    let mut source = TailSource::new(&path);
    let mut parser = StreamParser::new();
    let mut messages = Vec::new();
    for line in source.next_lines().unwrap() {
        if let Ok(Some(message)) = parser.submit_line(&line) {
            messages.push(message);
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap();
    file.write_all(tail).unwrap();
    for line in source.next_lines().unwrap() {
        if let Ok(Some(message)) = parser.submit_line(&line) {
            messages.push(message);
        }
    }

    let batch = parse_file(&fixture_path()).unwrap();
    assert_eq!(messages, batch.messages);
}

#[test]
fn static_source_feeds_the_same_lines() {
    let mut source = StaticSource::from_path(&fixture_path()).unwrap();
    let lines = source.next_lines().unwrap();
    assert!(source.is_exhausted());
    assert_eq!(lines.len(), 15);

    let mut parser = StreamParser::new();
    let batch = parser.parse_batch(&lines);
    assert_eq!(batch.messages.len(), 12);
    assert_eq!(parser.links().len(), 4);
    assert_eq!(
        parser.tool_call("toolu_02").map(|call| call.site),
        Some(BlockRef::new(3, 0))
    );
}
