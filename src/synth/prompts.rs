//! Prompt templates for the Answer Synthesizer, built as plain string
//! constants with inline XML-style tags delimiting context sections.

/// System prompt shared by every mode: grounds the model in the
/// institutional-assistant persona and instructs it to answer only from the
/// supplied context.
pub const SYSTEM_PROMPT: &str = "Eres un asistente administrativo de una institucion academica. \
Respondes preguntas de estudiantes y docentes usando unicamente la informacion provista en el \
contexto. Si el contexto no alcanza para responder con certeza, decilo explicitamente en vez de \
inventar datos. Cita siempre la fuente cuando sea posible.";

fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    text.chars().take(budget).collect::<String>() + "…"
}

/// Builds the single-context prompt used by `rag` and `graph` modes:
/// one combined context block truncated to `budget` characters.
#[must_use]
pub fn build_single_context_prompt(context: &str, question: &str, budget: usize) -> String {
    format!(
        "<context>\n{}\n</context>\n\n<question>\n{question}\n</question>",
        truncate_chars(context, budget)
    )
}

/// Builds the hybrid prompt: RAG and graph blocks shown separately, each
/// truncated to `budget_per_side` characters, asking the model to combine
/// them.
#[must_use]
pub fn build_hybrid_prompt(rag_context: &str, graph_context: &str, question: &str, budget_per_side: usize) -> String {
    format!(
        "<rag_context>\n{}\n</rag_context>\n\n<graph_context>\n{}\n</graph_context>\n\n\
         Combina ambos contextos para responder, priorizando la informacion mas especifica.\n\n\
         <question>\n{question}\n</question>",
        truncate_chars(rag_context, budget_per_side),
        truncate_chars(graph_context, budget_per_side)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_context_prompt_truncates_to_budget() {
        let long_context = "x".repeat(100);
        let prompt = build_single_context_prompt(&long_context, "q", 10);
        assert!(prompt.contains("xxxxxxxxxx…"));
    }

    #[test]
    fn hybrid_prompt_includes_both_blocks() {
        let prompt = build_hybrid_prompt("rag text", "graph text", "q", 4000);
        assert!(prompt.contains("rag_context"));
        assert!(prompt.contains("graph_context"));
    }
}
