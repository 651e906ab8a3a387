//! Context-block formatting and the system instruction.

use crate::stores::RetrievedChunk;

/// Formats retrieved chunks into the knowledge-base block embedded in the
/// system instruction. Each entry carries its source URL and freshness
/// marker so the model can cite them.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return "No knowledge-base entries matched this question.".to_string();
    }
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "Source: {}\nDate updated: {}\nContent: {}",
                chunk.url,
                chunk.date_updated.as_deref().unwrap_or("unknown"),
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Builds the system instruction for one request. `question` is the user's
/// original text, never the normalized embedding-side copy.
pub fn system_instruction(context: &str, question: &str) -> String {
    format!(
        r#"You are DroneMind, a technical assistant for drone products. You provide detailed technical information and professional advice about drone specifications.

Answer the user's question based on the following knowledge base content:
----------------
Knowledge base begins
{context}
Knowledge base ends
----------------

Answer requirements:
1. Answer in Markdown, including source links and the date the information was updated.
2. Focus on technical parameters, specifications and performance figures; give exact values with units.
3. If the knowledge base is insufficient, you may add from your own expertise, but clearly mark such content as possibly outdated.
4. If the question is unrelated to drones, politely explain that you only answer drone questions.
5. When flight safety is involved, remind the user to follow local regulations.

Areas of expertise include drone series specifications (Mavic, Air, Mini, Phantom and others), flight performance (endurance, transmission range, maximum speed), camera specifications (resolution, frame rate, sensor), gimbal stabilization, intelligent flight modes, obstacle avoidance, and remote controller and transmission technology.

----------------
User question: {question}
----------------"#
    )
}
