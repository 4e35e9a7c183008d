//! Prompt assembly for the digest.

use crate::search::Document;

/// Instruction sent as the system turn of every digest request.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are an expert breaking news summarizer.

Given multiple latest web articles about a topic, extract and summarize the most **recent updates** into **5 clear bullet points**.

Each bullet point must be:
- Very recent (last few hours or days)
- Concise (maximum 2 lines)
- Focused on facts, dates, events, or announcements
- Professional, neutral, and informative

Avoid old information, speculation, opinions, and unnecessary storytelling.
Your goal is to quickly update the user with the **latest major developments**.
"#;

/// Separator placed between consecutive documents
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// A system instruction paired with the evidence text for the user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_content: String,
}

/// Join document contents with blank lines, in the order given, and pair them
/// with the system instruction. No truncation is applied.
pub fn assemble(system_instruction: &str, documents: &[Document]) -> Prompt {
    let user_content = documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR);

    Prompt {
        system_instruction: system_instruction.to_string(),
        user_content,
    }
}
