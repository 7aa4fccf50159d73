use serde::{Deserialize, Serialize};

/// What kind of payload a content block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    PlainText,
    ToolInput,
    FileContent,
    CommandOutput,
    JsonApiResponse,
    ErrorContent,
    GenericText,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        Self::PlainText,
        Self::ToolInput,
        Self::FileContent,
        Self::CommandOutput,
        Self::JsonApiResponse,
        Self::ErrorContent,
        Self::GenericText,
    ];

    /// Configuration tag, e.g. `TOOL_INPUT`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PlainText => "PLAIN_TEXT",
            Self::ToolInput => "TOOL_INPUT",
            Self::FileContent => "FILE_CONTENT",
            Self::CommandOutput => "COMMAND_OUTPUT",
            Self::JsonApiResponse => "JSON_API_RESPONSE",
            Self::ErrorContent => "ERROR_CONTENT",
            Self::GenericText => "GENERIC_TEXT",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|content_type| content_type.tag().eq_ignore_ascii_case(tag.trim()))
    }
}

/// How the renderer should present a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStrategy {
    Inline,
    InlineWithSyntax,
    SimplePopup,
    RichPopup,
    JsonPopupAlways,
    JsonPopupWithFolding,
    SyntaxHighlightedPopup,
    TerminalStylePopup,
    ErrorPopupHighlighted,
    ErrorJsonPopup,
}

impl DisplayStrategy {
    pub const ALL: [DisplayStrategy; 10] = [
        Self::Inline,
        Self::InlineWithSyntax,
        Self::SimplePopup,
        Self::RichPopup,
        Self::JsonPopupAlways,
        Self::JsonPopupWithFolding,
        Self::SyntaxHighlightedPopup,
        Self::TerminalStylePopup,
        Self::ErrorPopupHighlighted,
        Self::ErrorJsonPopup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::InlineWithSyntax => "inline_with_syntax",
            Self::SimplePopup => "simple_popup",
            Self::RichPopup => "rich_popup",
            Self::JsonPopupAlways => "json_popup_always",
            Self::JsonPopupWithFolding => "json_popup_with_folding",
            Self::SyntaxHighlightedPopup => "syntax_highlighted_popup",
            Self::TerminalStylePopup => "terminal_style_popup",
            Self::ErrorPopupHighlighted => "error_popup_highlighted",
            Self::ErrorJsonPopup => "error_json_popup",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(name))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline | Self::InlineWithSyntax)
    }
}

impl std::fmt::Display for DisplayStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auxiliary facts gathered while classifying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationMetadata {
    pub line_count: usize,
    pub char_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_nested_structure: Option<bool>,
    /// Payload was too large to attempt JSON validation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub json_check_skipped: bool,
}

/// Display decision for one content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub content_type: ContentType,
    pub display_strategy: DisplayStrategy,
    pub force_popup: bool,
    pub confidence: f32,
    pub metadata: ClassificationMetadata,
}
