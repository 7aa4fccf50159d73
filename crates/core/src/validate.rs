use crate::message::{ContentBlock, Message};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ValidationError {
    #[error("message has no content blocks")]
    EmptyContent,
    #[error("tool use at block {block} has an empty {field}")]
    EmptyToolUseField { block: usize, field: &'static str },
    #[error("tool result at block {block} has an empty tool_use_id")]
    EmptyToolResultId { block: usize },
}

/// Validate a message by composing independent checks.
pub fn validate_message(message: &Message) -> Result<(), Vec<ValidationError>> {
    let validators: &[fn(&Message) -> Vec<ValidationError>] =
        &[validate_not_empty, validate_tool_blocks];

    let errors: Vec<ValidationError> = validators.iter().flat_map(|v| v(message)).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_not_empty(message: &Message) -> Vec<ValidationError> {
    if message.blocks.is_empty() {
        vec![ValidationError::EmptyContent]
    } else {
        vec![]
    }
}

fn validate_tool_blocks(message: &Message) -> Vec<ValidationError> {
    message
        .blocks
        .iter()
        .enumerate()
        .flat_map(|(index, block)| match block {
            ContentBlock::ToolUse { id, name, .. } => [("id", id), ("name", name)]
                .into_iter()
                .filter(|(_, value)| value.trim().is_empty())
                .map(|(field, _)| ValidationError::EmptyToolUseField {
                    block: index,
                    field,
                })
                .collect::<Vec<_>>(),
            ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id.trim().is_empty() => {
                vec![ValidationError::EmptyToolResultId { block: index }]
            }
            _ => vec![],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Environment, ResultLink, Role};

    fn message(blocks: Vec<ContentBlock>) -> Message {
        Message {
            uuid: None,
            role: Role::Assistant,
            blocks,
            parent_id: None,
            session_id: None,
            timestamp: None,
            environment: Environment::default(),
            model: None,
        }
    }

    #[test]
    fn empty_message_is_rejected() {
        let errors = validate_message(&message(vec![])).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyContent]);
    }

    #[test]
    fn tool_blocks_need_identifiers() {
        let errors = validate_message(&message(vec![
            ContentBlock::ToolUse {
                id: " ".to_string(),
                name: String::new(),
                input: serde_json::json!({}),
            },
            ContentBlock::ToolResult {
                tool_use_id: String::new(),
                content: "x".to_string(),
                is_error: false,
                link: ResultLink::orphaned(""),
            },
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::EmptyToolUseField {
            block: 0,
            field: "name"
        }));
        assert!(errors.contains(&ValidationError::EmptyToolResultId { block: 1 }));
    }

    #[test]
    fn well_formed_message_passes() {
        let ok = message(vec![ContentBlock::Text {
            text: "hello".to_string(),
        }]);
        assert!(validate_message(&ok).is_ok());
    }
}
