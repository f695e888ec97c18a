//! Detection of questions about the conversation itself.

/// Phrases that mark a query as being about the conversation rather than
/// the document corpus. English-tuned by design; extending the list is a
/// product decision, not a tuning knob.
const META_QUESTION_PHRASES: [&str; 4] = [
    "asked you",
    "previous questions",
    "our conversation",
    "my last question",
];

/// Case-insensitive substring check against the fixed phrase list.
/// Runs on the retrieval query, after any condensation.
pub fn is_meta_question(query: &str) -> bool {
    let lowered = query.to_lowercase();
    META_QUESTION_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_phrase() {
        assert!(is_meta_question("What have I asked you so far?"));
        assert!(is_meta_question("summarize the previous questions"));
        assert!(is_meta_question("What was our conversation about?"));
        assert!(is_meta_question("repeat my last question"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(is_meta_question("What have I ASKED YOU so far?"));
        assert!(is_meta_question("List the PREVIOUS Questions please"));
    }

    #[test]
    fn document_questions_pass_through() {
        assert!(!is_meta_question("What is the maximum baggage allowance?"));
        assert!(!is_meta_question("previous flight delays"));
        assert!(!is_meta_question("may I ask you something about visas?"));
        assert!(!is_meta_question(""));
    }
}
