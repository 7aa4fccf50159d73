use crate::detect::{
    detect_language, error_subtype, file_type, infer_tool_kind, input_command, input_file_path,
    json_depth, numbered_start_line, parse_json_document, ToolKind,
};
use serde_json::Value;
use sessiontree_core::text::{char_count, line_count};
use sessiontree_core::{
    BlockKind, ClassificationMetadata, ClassificationResult, ContentBlock, ContentType,
    DisplayStrategy,
};
use sessiontree_runtime_config::ClassifierSettings;
use std::collections::HashMap;

/// What the classifier knows about a payload besides its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationContext<'a> {
    /// Tool that produced (or, for tool input, will consume) the payload.
    pub tool_name: Option<&'a str>,
    pub kind: BlockKind,
    pub is_error: bool,
    /// The originating tool invocation's input.
    pub tool_input: Option<&'a Value>,
    /// Size reported by the producer, when it differs from the payload at hand.
    pub declared_size: Option<usize>,
}

impl<'a> ClassificationContext<'a> {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_tool(mut self, name: &'a str, input: Option<&'a Value>) -> Self {
        self.tool_name = Some(name);
        self.tool_input = input;
        self
    }

    pub fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    pub fn with_declared_size(mut self, size: usize) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// Decides how a payload should be displayed.
///
/// Pure function of `(payload, context, settings)`: no interior state, so a
/// single instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    settings: ClassifierSettings,
    strategies: HashMap<ContentType, DisplayStrategy>,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(ClassifierSettings::default())
    }
}

impl ContentClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        let strategies = resolve_strategies(&settings);
        Self {
            settings,
            strategies,
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Popup strategy configured for `content_type`.
    pub fn strategy_for(&self, content_type: ContentType) -> DisplayStrategy {
        self.strategies
            .get(&content_type)
            .copied()
            .unwrap_or_else(|| default_strategy(content_type))
    }

    /// Classify a content block. The block's own variant, error flag and
    /// tool input take precedence over what `ctx` declares; a resolved
    /// result supplies the tool name when `ctx` has none.
    pub fn classify(&self, block: &ContentBlock, ctx: &ClassificationContext) -> ClassificationResult {
        let mut ctx = *ctx;
        ctx.kind = block.kind();
        match block {
            ContentBlock::Text { text } => self.classify_text(text, &ctx),
            ContentBlock::ToolUse { name, input, .. } => {
                ctx.tool_name = Some(name.as_str());
                ctx.tool_input = Some(input);
                self.classify_text(&pretty_json(input), &ctx)
            }
            ContentBlock::ToolResult {
                content,
                is_error,
                link,
                ..
            } => {
                ctx.is_error |= *is_error;
                ctx.tool_name = ctx.tool_name.or(link.tool_name());
                self.classify_text(content, &ctx)
            }
        }
    }

    /// Classify a raw payload; ordered rules, first match wins.
    pub fn classify_text(&self, payload: &str, ctx: &ClassificationContext) -> ClassificationResult {
        let mut metadata = ClassificationMetadata {
            line_count: line_count(payload),
            char_count: char_count(payload),
            tool_name: ctx.tool_name.map(str::to_string),
            ..ClassificationMetadata::default()
        };
        let tool_kind = ctx.tool_name.map_or(ToolKind::Other, infer_tool_kind);

        if ctx.kind == BlockKind::ToolInput {
            let strategy = self.strategy_for(ContentType::ToolInput);
            return result(ContentType::ToolInput, strategy, true, 1.0, metadata);
        }

        if ctx.is_error {
            metadata.error_subtype = Some(error_subtype(payload).to_string());
            let strategy = match self.json_document(payload, ctx, &mut metadata) {
                Some(_) => DisplayStrategy::ErrorJsonPopup,
                None => self.strategy_for(ContentType::ErrorContent),
            };
            return result(ContentType::ErrorContent, strategy, true, 1.0, metadata);
        }

        if tool_kind == ToolKind::Shell {
            metadata.command = ctx.tool_input.and_then(input_command).map(str::to_string);
            let strategy = self.strategy_for(ContentType::CommandOutput);
            return result(ContentType::CommandOutput, strategy, true, 1.0, metadata);
        }

        if let Some(api_source) = ctx.tool_name.filter(|name| self.is_api_tool(name)) {
            if let Some(value) = self.json_document(payload, ctx, &mut metadata) {
                metadata.has_nested_structure = Some(json_depth(&value) > 1);
                metadata.api_source = Some(api_source.to_string());
                let strategy = self.strategy_for(ContentType::JsonApiResponse);
                return result(ContentType::JsonApiResponse, strategy, true, 1.0, metadata);
            }
        }

        if tool_kind.is_file() {
            if let Some(path) = ctx.tool_input.and_then(input_file_path) {
                metadata.file_path = Some(path.to_string());
                metadata.file_type = file_type(path);
                metadata.language = detect_language(path);
            }
            metadata.start_line = numbered_start_line(payload);

            let large = metadata.line_count > self.settings.rich_display_lines
                || metadata.char_count > self.settings.rich_display_chars;
            return if large {
                let strategy = self.strategy_for(ContentType::FileContent);
                result(ContentType::FileContent, strategy, true, 0.9, metadata)
            } else {
                result(
                    ContentType::FileContent,
                    DisplayStrategy::InlineWithSyntax,
                    false,
                    0.9,
                    metadata,
                )
            };
        }

        let content_type = if ctx.kind == BlockKind::Text && ctx.tool_name.is_none() {
            ContentType::PlainText
        } else {
            ContentType::GenericText
        };
        let (strategy, force_popup) = self.text_tier(&metadata, content_type);
        result(content_type, strategy, force_popup, 0.5, metadata)
    }

    fn text_tier(
        &self,
        metadata: &ClassificationMetadata,
        content_type: ContentType,
    ) -> (DisplayStrategy, bool) {
        let s = &self.settings;
        if metadata.line_count <= s.inline_max_lines && metadata.char_count <= s.inline_max_chars {
            (DisplayStrategy::Inline, false)
        } else if metadata.line_count >= s.rich_display_lines
            || metadata.char_count >= s.rich_display_chars
        {
            let strategy = self.strategy_for(content_type);
            (strategy, !strategy.is_inline())
        } else {
            (DisplayStrategy::SimplePopup, false)
        }
    }

    /// Size-guarded JSON parse; records when the guard skipped the check.
    fn json_document(
        &self,
        payload: &str,
        ctx: &ClassificationContext,
        metadata: &mut ClassificationMetadata,
    ) -> Option<Value> {
        let limit = self.settings.json_validation_max_bytes;
        if payload.len() > limit || ctx.declared_size.is_some_and(|size| size > limit) {
            metadata.json_check_skipped = true;
            return None;
        }
        parse_json_document(payload)
    }

    /// True for namespaced remote tools (`mcp__github__get_issue`).
    fn is_api_tool(&self, tool_name: &str) -> bool {
        self.settings
            .api_tool_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && tool_name.starts_with(prefix.as_str()))
    }
}

fn result(
    content_type: ContentType,
    display_strategy: DisplayStrategy,
    force_popup: bool,
    confidence: f32,
    metadata: ClassificationMetadata,
) -> ClassificationResult {
    ClassificationResult {
        content_type,
        display_strategy,
        force_popup,
        confidence,
        metadata,
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn default_strategy(content_type: ContentType) -> DisplayStrategy {
    match content_type {
        ContentType::ToolInput => DisplayStrategy::JsonPopupAlways,
        ContentType::ErrorContent => DisplayStrategy::ErrorPopupHighlighted,
        ContentType::CommandOutput => DisplayStrategy::TerminalStylePopup,
        ContentType::JsonApiResponse => DisplayStrategy::JsonPopupWithFolding,
        ContentType::FileContent => DisplayStrategy::SyntaxHighlightedPopup,
        ContentType::GenericText | ContentType::PlainText => DisplayStrategy::RichPopup,
    }
}

fn resolve_strategies(settings: &ClassifierSettings) -> HashMap<ContentType, DisplayStrategy> {
    let mut strategies: HashMap<ContentType, DisplayStrategy> = ContentType::ALL
        .iter()
        .map(|content_type| (*content_type, default_strategy(*content_type)))
        .collect();

    for (tag, name) in &settings.strategies {
        let Some(content_type) = ContentType::from_tag(tag) else {
            tracing::warn!("Ignoring strategy for unknown content type `{}`", tag);
            continue;
        };
        let Some(strategy) = DisplayStrategy::from_name(name) else {
            tracing::warn!("Ignoring unknown display strategy `{}` for {}", name, tag);
            continue;
        };
        strategies.insert(content_type, strategy);
    }
    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sessiontree_core::testing::{
        linked_result_block, text_block, tool_result_block, tool_use_block,
    };
    use sessiontree_core::BlockRef;

    fn classifier() -> ContentClassifier {
        ContentClassifier::default()
    }

    fn result_ctx<'a>(tool: &'a str, input: &'a Value) -> ClassificationContext<'a> {
        ClassificationContext::new(BlockKind::ToolResult).with_tool(tool, Some(input))
    }

    #[test]
    fn tool_input_always_pops_up() {
        let block = tool_use_block("t1", "Read", json!({"file_path": "/a.txt"}));
        let result = classifier().classify(&block, &ClassificationContext::default());
        assert_eq!(result.content_type, ContentType::ToolInput);
        assert_eq!(result.display_strategy, DisplayStrategy::JsonPopupAlways);
        assert!(result.force_popup);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.metadata.tool_name.as_deref(), Some("Read"));
        assert_eq!(result.metadata.line_count, 3);
    }

    #[test]
    fn small_env_file_stays_inline() {
        let input = json!({"file_path": "/config.env"});
        let payload = "DB_HOST=localhost\nDB_PORT=5432\nX=1";
        assert_eq!(payload.chars().count(), 34);
        let result = classifier().classify_text(payload, &result_ctx("Read", &input));
        assert_eq!(result.content_type, ContentType::FileContent);
        assert_eq!(result.display_strategy, DisplayStrategy::InlineWithSyntax);
        assert!(!result.force_popup);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.metadata.file_type.as_deref(), Some("env"));
        assert_eq!(result.metadata.line_count, 3);
        assert_eq!(result.metadata.char_count, 34);
    }

    #[test]
    fn large_file_uses_syntax_popup() {
        let input = json!({"file_path": "/repo/src/main.rs"});
        let payload = (1..=6)
            .map(|n| format!("     {n}→let x{n} = {n};"))
            .collect::<Vec<_>>()
            .join("\n");
        let result = classifier().classify_text(&payload, &result_ctx("Read", &input));
        assert_eq!(result.display_strategy, DisplayStrategy::SyntaxHighlightedPopup);
        assert!(result.force_popup);
        assert_eq!(result.metadata.language.as_deref(), Some("rust"));
        assert_eq!(result.metadata.start_line, Some(1));
    }

    #[test]
    fn file_thresholds_are_strict() {
        let input = json!({"file_path": "notes.md"});
        let five_lines = "a\nb\nc\nd\ne";
        let result = classifier().classify_text(five_lines, &result_ctx("Write", &input));
        assert_eq!(result.display_strategy, DisplayStrategy::InlineWithSyntax);
    }

    #[test]
    fn shell_output_pops_up_even_when_short() {
        let input = json!({"command": "ls"});
        let result = classifier().classify_text("test.txt\nscript.js\n", &result_ctx("Bash", &input));
        assert_eq!(result.content_type, ContentType::CommandOutput);
        assert_eq!(result.display_strategy, DisplayStrategy::TerminalStylePopup);
        assert!(result.force_popup);
        assert_eq!(result.metadata.command.as_deref(), Some("ls"));
        assert_eq!(result.metadata.line_count, 2);
    }

    #[test]
    fn error_takes_precedence_over_tool_kind() {
        let input = json!({"command": "foo"});
        let block = tool_result_block("t1", "bash: foo: command not found", true);
        let ctx = ClassificationContext::default().with_tool("Bash", Some(&input));
        let result = classifier().classify(&block, &ctx);
        assert_eq!(result.content_type, ContentType::ErrorContent);
        assert_eq!(result.display_strategy, DisplayStrategy::ErrorPopupHighlighted);
        assert!(result.force_popup);
        assert_eq!(
            result.metadata.error_subtype.as_deref(),
            Some("command_not_found")
        );
    }

    #[test]
    fn json_error_uses_json_popup() {
        let ctx = ClassificationContext::new(BlockKind::ToolResult).with_error(true);
        let result = classifier().classify_text(r#"{"error": "rate limited"}"#, &ctx);
        assert_eq!(result.display_strategy, DisplayStrategy::ErrorJsonPopup);
        assert_eq!(result.metadata.error_subtype.as_deref(), Some("unknown"));
    }

    #[test]
    fn api_json_response_folds() {
        let input = json!({"number": 42});
        let payload = r#"{"number":42,"labels":[{"name":"bug"}]}"#;
        let result =
            classifier().classify_text(payload, &result_ctx("mcp__github__get_issue", &input));
        assert_eq!(result.content_type, ContentType::JsonApiResponse);
        assert_eq!(result.display_strategy, DisplayStrategy::JsonPopupWithFolding);
        assert_eq!(result.metadata.has_nested_structure, Some(true));
        assert_eq!(
            result.metadata.api_source.as_deref(),
            Some("mcp__github__get_issue")
        );

        let flat = classifier().classify_text(r#"{"ok":true}"#, &result_ctx("mcp__x__y", &input));
        assert_eq!(flat.metadata.has_nested_structure, Some(false));
    }

    #[test]
    fn scalar_json_counts_as_json() {
        let input = json!({"key": "session"});
        for payload in ["\"cached-value\"", "true"] {
            let result = classifier().classify_text(payload, &result_ctx("mcp__kv__get", &input));
            assert_eq!(result.content_type, ContentType::JsonApiResponse);
            assert_eq!(result.display_strategy, DisplayStrategy::JsonPopupWithFolding);
            assert_eq!(result.metadata.has_nested_structure, Some(false));
        }

        let ctx = ClassificationContext::new(BlockKind::ToolResult).with_error(true);
        let error = classifier().classify_text("\"rate limited\"", &ctx);
        assert_eq!(error.display_strategy, DisplayStrategy::ErrorJsonPopup);
    }

    #[test]
    fn resolved_result_supplies_tool_name() {
        let block = linked_result_block("t1", "Bash", BlockRef::new(0, 0), "a.txt\nb.txt");
        let result = classifier().classify(&block, &ClassificationContext::default());
        assert_eq!(result.content_type, ContentType::CommandOutput);
        assert_eq!(result.display_strategy, DisplayStrategy::TerminalStylePopup);
        assert_eq!(result.metadata.tool_name.as_deref(), Some("Bash"));

        let ctx = ClassificationContext::default().with_tool("Read", None);
        let explicit = classifier().classify(&block, &ctx);
        assert_eq!(explicit.content_type, ContentType::FileContent);
    }

    #[test]
    fn api_tool_with_plain_text_falls_through() {
        let input = json!({});
        let result = classifier().classify_text("done", &result_ctx("mcp__slack__post", &input));
        assert_eq!(result.content_type, ContentType::GenericText);
        assert_eq!(result.display_strategy, DisplayStrategy::Inline);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn oversized_json_skips_validation() {
        let mut settings = ClassifierSettings::default();
        settings.json_validation_max_bytes = 10;
        let classifier = ContentClassifier::new(settings);
        let input = json!({});
        let result = classifier.classify_text(
            r#"{"number":42,"title":"long"}"#,
            &result_ctx("mcp__github__get_issue", &input),
        );
        assert_eq!(result.content_type, ContentType::GenericText);
        assert!(result.metadata.json_check_skipped);

        let declared = result_ctx("mcp__github__get_issue", &input).with_declared_size(11);
        let result = classifier.classify_text("{}", &declared);
        assert!(result.metadata.json_check_skipped);
    }

    #[test]
    fn generic_text_threshold_boundary() {
        let ctx = ClassificationContext::new(BlockKind::ToolResult).with_tool("Grep", None);
        let two = classifier().classify_text("a\nb", &ctx);
        assert_eq!(two.display_strategy, DisplayStrategy::Inline);
        assert!(!two.force_popup);

        let three = classifier().classify_text("a\nb\nc", &ctx);
        assert_eq!(three.display_strategy, DisplayStrategy::SimplePopup);
        assert!(!three.force_popup);

        let five = classifier().classify_text("a\nb\nc\nd\ne", &ctx);
        assert_eq!(five.display_strategy, DisplayStrategy::RichPopup);
        assert!(five.force_popup);

        let wide = classifier().classify_text(&"x".repeat(81), &ctx);
        assert_eq!(wide.display_strategy, DisplayStrategy::SimplePopup);
        let huge = classifier().classify_text(&"x".repeat(200), &ctx);
        assert_eq!(huge.display_strategy, DisplayStrategy::RichPopup);
    }

    #[test]
    fn conversation_text_is_plain() {
        let result = classifier().classify(&text_block("Sure, on it."), &Default::default());
        assert_eq!(result.content_type, ContentType::PlainText);
        assert_eq!(result.display_strategy, DisplayStrategy::Inline);
    }

    #[test]
    fn configured_strategy_overrides_default() {
        let mut settings = ClassifierSettings::default();
        settings
            .strategies
            .insert("FILE_CONTENT".to_string(), "rich_popup".to_string());
        settings
            .strategies
            .insert("COMMAND_OUTPUT".to_string(), "no_such_strategy".to_string());
        settings
            .strategies
            .insert("NOT_A_TYPE".to_string(), "inline".to_string());
        let classifier = ContentClassifier::new(settings);
        assert_eq!(
            classifier.strategy_for(ContentType::FileContent),
            DisplayStrategy::RichPopup
        );
        assert_eq!(
            classifier.strategy_for(ContentType::CommandOutput),
            DisplayStrategy::TerminalStylePopup
        );
    }

    #[test]
    fn identical_inputs_classify_identically() {
        let input = json!({"file_path": "/a.txt"});
        let block = tool_result_block("t1", "hello\nworld\nagain", false);
        let ctx = ClassificationContext::default().with_tool("Read", Some(&input));
        let c = classifier();
        assert_eq!(c.classify(&block, &ctx), c.classify(&block, &ctx));
    }

    #[test]
    fn classifier_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContentClassifier>();
    }
}
