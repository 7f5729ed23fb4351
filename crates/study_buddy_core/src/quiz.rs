//! crates/study_buddy_core/src/quiz.rs

use crate::domain::{QuizAnswer, QuizQuestion, QuizResult};
use uuid::Uuid;

/// Grades a submission. `selected[i]` is the answer chosen for
/// `questions[i]`; missing entries count as unanswered.
pub fn grade_quiz(session_id: Uuid, questions: &[QuizQuestion], selected: &[Option<String>]) -> QuizResult {
    let answers: Vec<QuizAnswer> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let selected_answer = selected.get(i).cloned().flatten();
            let was_correct = selected_answer.as_deref() == Some(q.answer.as_str());
            QuizAnswer {
                question: q.question.clone(),
                selected_answer,
                correct_answer: q.answer.clone(),
                was_correct,
            }
        })
        .collect();

    QuizResult {
        session_id,
        score: answers.iter().filter(|a| a.was_correct).count(),
        total: answers.len(),
        answers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: text.into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: answer.into(),
        }
    }

    #[test]
    fn counts_exact_matches() {
        let questions = vec![question("one", "a"), question("two", "b"), question("three", "c")];
        let selected = vec![Some("a".to_string()), Some("c".to_string()), None];
        let result = grade_quiz(Uuid::nil(), &questions, &selected);

        assert_eq!(result.score, 1);
        assert_eq!(result.total, 3);
        assert!(result.answers[0].was_correct);
        assert!(!result.answers[1].was_correct);
        assert_eq!(result.answers[2].selected_answer, None);
    }

    #[test]
    fn short_submission_counts_as_unanswered() {
        let questions = vec![question("one", "a"), question("two", "b")];
        let result = grade_quiz(Uuid::nil(), &questions, &[Some("a".into())]);
        assert_eq!(result.score, 1);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn answers_are_case_sensitive() {
        let questions = vec![question("one", "a")];
        let result = grade_quiz(Uuid::nil(), &questions, &[Some("A".into())]);
        assert_eq!(result.score, 0);
    }
}
