//! crates/study_buddy_core/src/generation.rs
//!
//! Prompt construction and tolerant parsing for LLM-generated study material.
//! Model output is expected to be a JSON array, possibly wrapped in a
//! markdown code fence. Anything that does not decode yields an empty set.

use crate::domain::{Flashcard, QuizQuestion};
use serde::Deserialize;

/// Character budget for document text sent to the model.
pub const DEFAULT_DOCUMENT_CHAR_LIMIT: usize = 15_000;

pub const QUIZ_OPTION_COUNT: usize = 4;

pub const FLASHCARD_INSTRUCTIONS: &str = r#"You create study flashcards from the material the user provides.
Return ONLY a JSON array. Each element must be an object with exactly these keys:
- "question": a question or term
- "answer": the answer or explanation
Do not include any text before or after the JSON array."#;

pub const QUIZ_INSTRUCTIONS: &str = r#"You create multiple-choice quiz questions from the material the user provides.
Return ONLY a JSON array. Each element must be an object with exactly these keys:
- "question": the question string
- "options": an array of 4 answer choices (strings)
- "answer": the correct answer string (must match one of the options exactly)
Do not include any text before or after the JSON array."#;

/// Keeps at most `limit` characters of the document.
pub fn truncate_document(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn study_material_prompt(document: &str, limit: usize) -> String {
    format!("STUDY MATERIAL:\n{}", truncate_document(document, limit))
}

/// Returns the body of the first ``` / ```json fence in the reply, or the
/// trimmed reply when there is no fence. Text around the fence is dropped and
/// the body may sit on the same line as the fence markers.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let rest = &trimmed[open + 3..];
    // Drop the language tag, e.g. "json".
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// Narrows the text to the outermost `[...]` span so prose the model adds
/// around an unfenced array does not break decoding.
fn json_array_span(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn decode_array<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str::<Vec<T>>(json_array_span(strip_code_fences(raw))).unwrap_or_default()
}

#[derive(Deserialize)]
struct FlashcardWire {
    #[serde(alias = "q")]
    question: String,
    #[serde(alias = "a")]
    answer: String,
}

#[derive(Deserialize)]
struct QuizQuestionWire {
    question: String,
    options: Vec<String>,
    answer: String,
}

pub fn parse_flashcards(raw: &str) -> Vec<Flashcard> {
    decode_array::<FlashcardWire>(raw)
        .into_iter()
        .map(|c| Flashcard {
            question: c.question,
            answer: c.answer,
        })
        .collect()
}

/// Questions without exactly four options, or whose answer is not one of
/// the options, are dropped.
pub fn parse_quiz(raw: &str) -> Vec<QuizQuestion> {
    decode_array::<QuizQuestionWire>(raw)
        .into_iter()
        .filter(|q| q.options.len() == QUIZ_OPTION_COUNT && q.options.contains(&q.answer))
        .map(|q| QuizQuestion {
            question: q.question,
            options: q.options,
            answer: q.answer,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_flashcard_array() {
        let cards = parse_flashcards(r#"[{"question":"Q1","answer":"A1"}]"#);
        assert_eq!(
            cards,
            vec![Flashcard {
                question: "Q1".into(),
                answer: "A1".into()
            }]
        );
    }

    #[test]
    fn parses_fenced_flashcard_array() {
        let raw = "```json\n[{\"question\":\"Q1\",\"answer\":\"A1\"}]\n```";
        let cards = parse_flashcards(raw);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "Q1");
        assert_eq!(cards[0].answer, "A1");
    }

    #[test]
    fn single_line_fence_is_unwrapped() {
        let cards = parse_flashcards("```json [{\"question\":\"Q1\",\"answer\":\"A1\"}] ```");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].answer, "A1");

        let cards = parse_flashcards("```[{\"q\":\"Q2\",\"a\":\"A2\"}]```");
        assert_eq!(cards[0].question, "Q2");
    }

    #[test]
    fn fence_after_a_preamble_is_found() {
        let raw = "Here are your flashcards:\n```json\n[{\"question\":\"Q1\",\"answer\":\"A1\"}]\n```\nGood luck!";
        let cards = parse_flashcards(raw);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "Q1");
    }

    #[test]
    fn unfenced_array_inside_prose_is_found() {
        let raw = r#"Sure! [{"question":"2+2?","options":["1","2","3","4"],"answer":"4"}] Let me know."#;
        let quiz = parse_quiz(raw);
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].options.len(), 4);
    }

    #[test]
    fn accepts_short_keys() {
        let cards = parse_flashcards(r#"[{"q":"Term","a":"Meaning"}]"#);
        assert_eq!(cards[0].question, "Term");
    }

    #[test]
    fn empty_array_yields_no_cards() {
        assert!(parse_flashcards("[]").is_empty());
        assert!(parse_flashcards("```\n[]\n```").is_empty());
    }

    #[test]
    fn garbage_yields_no_cards() {
        assert!(parse_flashcards("Here are some flashcards: ...").is_empty());
        assert!(parse_flashcards(r#"{"question":"Q","answer":"A"}"#).is_empty());
    }

    #[test]
    fn quiz_keeps_only_well_formed_questions() {
        let raw = r#"```json
[
  {"question":"2+2?","options":["1","2","3","4"],"answer":"4"},
  {"question":"Bad count","options":["a","b"],"answer":"a"},
  {"question":"Answer missing","options":["a","b","c","d"],"answer":"e"}
]
```"#;
        let quiz = parse_quiz(raw);
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].answer, "4");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_document("héllo", 2), "hé");
        assert_eq!(truncate_document("short", 100), "short");
    }
}
