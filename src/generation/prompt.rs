//! Prompt assembly for retrieval-augmented answers.

/// System instruction for the answer model.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. You answer user questions based on provided context. \
If no context is provided or if the context is empty, respond with: \"I don't have any documents loaded to answer your question. Please upload some documents first.\" \
If you can't answer the question with the provided context, say you don't know.";

/// Fixed context line substituted when nothing has been retrieved.
pub const NO_DOCUMENTS_CONTEXT: &str = "No documents have been uploaded yet.";

/// Formats the single structured prompt fed to the generation service,
/// using the Llama 3 chat template. An empty `context` takes the fixed
/// no-documents path instead of producing an empty context section.
pub fn format_rag_prompt(query: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        NO_DOCUMENTS_CONTEXT
    } else {
        context
    };

    format!(
        "<|start_header_id|>system<|end_header_id|>\n\
         {SYSTEM_INSTRUCTION}<|eot_id|>\n\
         \n\
         <|start_header_id|>user<|end_header_id|>\n\
         User Query:\n\
         {query}\n\
         \n\
         Context:\n\
         {context}<|eot_id|>\n\
         \n\
         <|start_header_id|>assistant<|end_header_id|>\n"
    )
}
