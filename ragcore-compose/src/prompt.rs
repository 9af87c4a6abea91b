//! ABOUTME: Grounded-prompt assembly: numbered context block, system instructions, message list

use ragcore_adapters::llm::{ChatMessage, ChatRole};

/// One retrieved passage to cite as `[Source i: ...]` in the context block.
#[derive(Debug, Clone)]
pub struct ContextSource {
    pub document_display_name: String,
    pub chunk_text: String,
}

/// Fixed answer returned when permission resolution finds no documents
/// accessible to the requesting user, instead of prompting the LLM over an
/// empty context (§4.3/E2E-1).
pub const NO_ACCESSIBLE_DOCUMENTS_MESSAGE: &str =
    "Für diese Anfrage sind keine Dokumente verfügbar, auf die Sie Zugriff haben.";

const SYSTEM_PROMPT_BASE: &str = "\
Beantworte die Frage ausschließlich auf Grundlage des bereitgestellten Kontexts. \
Zitiere Quellen im Fließtext als [Source i: ...], wobei i auf den entsprechenden \
Kontextabschnitt verweist. Wenn der Kontext nicht ausreicht, sage das explizit \
und spekuliere nicht. Wenn Wissensgraph-Informationen bereitgestellt werden, \
nutze sie, um Beziehungen zwischen Personen, Organisationen und Projekten zu erklären.";

/// Renders the numbered `[Source i: <documentDisplayName>] <chunk text>` block,
/// sources separated by a blank line.
#[must_use]
pub fn build_context_block(sources: &[ContextSource]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| format!("[Source {}: {}] {}", i + 1, source.document_display_name, source.chunk_text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the full system prompt, appending a labeled graph-context section
/// before the grounding instructions when graph enrichment produced one.
#[must_use]
pub fn build_system_prompt(context_block: &str, graph_summary: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(summary) = graph_summary {
        prompt.push_str("Wissensgraph-Kontext:\n");
        prompt.push_str(summary);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Kontext:\n");
    prompt.push_str(context_block);
    prompt.push_str("\n\n");
    prompt.push_str(SYSTEM_PROMPT_BASE);
    prompt
}

/// Assembles the final message list: system prompt, conversation history, current turn.
#[must_use]
pub fn build_messages(
    sources: &[ContextSource],
    graph_summary: Option<&str>,
    history: &[ChatMessage],
    user_turn: &str,
) -> Vec<ChatMessage> {
    let context_block = build_context_block(sources);
    let system_prompt = build_system_prompt(&context_block, graph_summary);

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new(ChatRole::System, system_prompt));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::new(ChatRole::User, user_turn));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_block_numbers_sources_from_one() {
        let sources = vec![
            ContextSource { document_display_name: "Handbook".to_string(), chunk_text: "Invoices are net 30.".to_string() },
            ContextSource { document_display_name: "Policy".to_string(), chunk_text: "Vacation accrues monthly.".to_string() },
        ];
        let block = build_context_block(&sources);
        assert!(block.contains("[Source 1: Handbook]"));
        assert!(block.contains("[Source 2: Policy]"));
    }

    #[test]
    fn system_prompt_includes_graph_section_only_when_present() {
        let without = build_system_prompt("ctx", None);
        assert!(!without.contains("Wissensgraph-Kontext"));
        let with = build_system_prompt("ctx", Some("Found 1 person."));
        assert!(with.contains("Wissensgraph-Kontext"));
        assert!(with.contains("Found 1 person."));
    }

    #[test]
    fn no_accessible_documents_message_is_not_empty() {
        assert!(!NO_ACCESSIBLE_DOCUMENTS_MESSAGE.is_empty());
    }

    #[test]
    fn messages_are_ordered_system_history_then_user_turn() {
        let history = vec![ChatMessage::new(ChatRole::User, "hi"), ChatMessage::new(ChatRole::Assistant, "hello")];
        let messages = build_messages(&[], None, &history, "What is the policy?");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[3].role, ChatRole::User);
        assert_eq!(messages[3].content, "What is the policy?");
    }
}
