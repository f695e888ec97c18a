//! Prompt templates and the fixed strings the pipeline is contractually
//! bound to. Callers compare against these constants, so changing any of
//! them is an interface change, not a wording tweak.

/// Answer returned verbatim when final generation fails.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, I encountered an error while processing your request.";

/// Refusal the answer prompt instructs the model to emit when the context
/// does not cover the question.
pub const REFUSAL_SENTENCE: &str =
    "I'm sorry, I don't see that information in the documents I have.";

/// Context used when retrieval returns nothing.
pub const NO_DOCUMENTS_CONTEXT: &str = "No specific documents found.";

/// Context used when the user asks about the conversation itself.
pub const META_QUESTION_CONTEXT: &str = "The user is asking about the previous conversation \
history, not requesting information from external documents.";

/// History placeholder for the first turn of a session.
pub const EMPTY_HISTORY: &str = "No previous conversation.";

/// Source label attributed to meta-question answers.
pub const MEMORY_SOURCE: &str = "System Memory";

/// Rewrite a follow-up question into a standalone retrieval query.
pub fn condense_query_prompt(conversation_history: &str, question: &str) -> String {
    format!(
        "Given the conversation history and a follow-up question, rephrase the \
follow-up question into a standalone search query for a document database.

Conversation History:
{conversation_history}

Follow-up Question: {question}

Instructions:
- If the question is already self-contained, return it unchanged.
- If it refers back to the conversation, resolve those references into a standalone query.
- If the user is asking about the conversation itself (for example, what they \
asked earlier), output a query containing the phrase \"previous questions\" or \
\"conversation history\".
- Output ONLY the search query, with no explanation.

Search Query:"
    )
}

/// The grounded-answer prompt. The question slot always receives the
/// user's original question, never the condensed retrieval query.
pub fn answer_prompt(conversation_history: &str, context: &str, question: &str) -> String {
    format!(
        "### ROLE
You are a helpful assistant that answers questions using only the provided documents.

### RULES
1. Answer ONLY with information found in the CONTEXT section.
2. If the context does not contain the answer, reply exactly: \"{REFUSAL_SENTENCE}\"
3. Keep answers concise and factual. Do not speculate.
4. Use the conversation history to interpret follow-up questions.

### DATA
Conversation History:
{conversation_history}

CONTEXT:
{context}

Question: {question}

Answer:"
    )
}

/// LLM-judge prompt; demands a JSON-only verdict.
pub fn judge_prompt(question: &str, response: &str, context: &str) -> String {
    format!(
        "You are an impartial evaluator. Score how well the RESPONSE answers the \
QUESTION using ONLY the CONTEXT as ground truth.

Scoring scale:
5 - fully correct, complete, and grounded in the context
4 - mostly correct with minor omissions
3 - partially correct or only partially grounded
2 - mostly incorrect or unsupported by the context
1 - entirely incorrect, irrelevant, or fabricated

QUESTION:
{question}

RESPONSE:
{response}

CONTEXT:
{context}

Respond ONLY with a JSON object of the form {{\"score\": <1-5>, \"reasoning\": \"<one-sentence explanation>\"}}.
Example Output: {{\"score\": 5, \"reasoning\": \"Explanation here\"}}"
    )
}
