// src/exam/scoring.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::exam_result::{AnswerEntry, AnswerOutcome};
use crate::models::question::{Question, QuestionType};

/// Result of scoring one attempt. Always carries exactly one outcome entry
/// per scored question, and `correct + wrong + blank == questions.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub answers: HashMap<Uuid, AnswerOutcome>,
    pub correct: i32,
    pub wrong: i32,
    pub blank: i32,
    /// 0-100, rounded to two decimals.
    pub score: f64,
}

/// Scores one attempt. Pure and deterministic: no I/O, no clock, same
/// inputs always produce the same outcome.
///
/// Per question:
/// * multiple_choice: no selected choice, or a selected id that matches no
///   choice, counts as blank. Otherwise the matched choice's correctness
///   flag decides. A malformed question with no correct choice can only
///   score wrong, never aborts the attempt.
/// * written: the learner text is trimmed; empty counts as blank. A
///   non-empty answer is compared case-insensitively against the trimmed
///   answer key. An empty answer key never grades as correct.
pub fn score_exam(
    questions: &[Question],
    answers: &HashMap<Uuid, AnswerEntry>,
) -> ScoringOutcome {
    debug_assert!(!questions.is_empty(), "hydration guarantees questions");

    let mut correct = 0;
    let mut wrong = 0;
    let mut blank = 0;
    let mut outcome_map = HashMap::with_capacity(questions.len());

    for question in questions {
        let entry = answers.get(&question.id);

        let outcome = match question.question_type {
            QuestionType::MultipleChoice => {
                let selected = entry
                    .and_then(|e| e.choice_id.as_deref())
                    .and_then(|id| question.choice_by_id(id));

                match selected {
                    None => {
                        blank += 1;
                        AnswerOutcome {
                            question_type: question.question_type,
                            choice_id: entry.and_then(|e| e.choice_id.clone()),
                            choice_label: entry.and_then(|e| e.choice_label.clone()),
                            answer_text: None,
                            is_correct: false,
                        }
                    }
                    Some(choice) => {
                        if choice.is_correct {
                            correct += 1;
                        } else {
                            wrong += 1;
                        }
                        AnswerOutcome {
                            question_type: question.question_type,
                            choice_id: Some(choice.id.clone()),
                            choice_label: Some(choice.label.clone()),
                            answer_text: None,
                            is_correct: choice.is_correct,
                        }
                    }
                }
            }
            QuestionType::Written => {
                let value = entry
                    .and_then(|e| e.text.as_deref())
                    .unwrap_or("")
                    .trim()
                    .to_string();
                let expected = question.answer_key.as_deref().unwrap_or("").trim();

                if value.is_empty() {
                    blank += 1;
                    AnswerOutcome {
                        question_type: question.question_type,
                        choice_id: None,
                        choice_label: None,
                        answer_text: None,
                        is_correct: false,
                    }
                } else {
                    let is_correct =
                        !expected.is_empty() && value.to_lowercase() == expected.to_lowercase();
                    if is_correct {
                        correct += 1;
                    } else {
                        wrong += 1;
                    }
                    AnswerOutcome {
                        question_type: question.question_type,
                        choice_id: None,
                        choice_label: None,
                        answer_text: Some(value),
                        is_correct,
                    }
                }
            }
        };

        outcome_map.insert(question.id, outcome);
    }

    let total = questions.len().max(1);
    let score = round2(f64::from(correct) / total as f64 * 100.0);

    ScoringOutcome {
        answers: outcome_map,
        correct,
        wrong,
        blank,
        score,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metadata::Metadata;
    use crate::models::question::{Difficulty, QuestionChoice};
    use sqlx::types::Json;

    fn mc_question(correct_id: &str) -> Question {
        let choices = ["a", "b", "c", "d"]
            .iter()
            .map(|id| QuestionChoice {
                id: id.to_string(),
                label: id.to_uppercase(),
                text: format!("choice {}", id),
                is_correct: *id == correct_id,
            })
            .collect();
        Question {
            id: Uuid::new_v4(),
            institution_id: Uuid::new_v4(),
            question_type: QuestionType::MultipleChoice,
            subject: "geography".to_string(),
            topic: "capitals".to_string(),
            difficulty: Difficulty::Easy,
            question_text: "Pick the right one".to_string(),
            passage_text: None,
            choices: Json(choices),
            answer_key: None,
            explanation: None,
            metadata: Json(Metadata::new()),
            created_at: None,
            updated_at: None,
        }
    }

    fn written_question(answer_key: Option<&str>) -> Question {
        let mut q = mc_question("a");
        q.question_type = QuestionType::Written;
        q.choices = Json(Vec::new());
        q.answer_key = answer_key.map(str::to_string);
        q
    }

    fn select(questions: &[Question], index: usize, choice_id: &str) -> (Uuid, AnswerEntry) {
        let q = &questions[index];
        let label = q.choice_by_id(choice_id).unwrap().label.clone();
        (q.id, AnswerEntry::choice(choice_id, label))
    }

    #[test]
    fn all_correct_scores_hundred() {
        let questions: Vec<Question> = (0..4).map(|_| mc_question("b")).collect();
        let answers: HashMap<Uuid, AnswerEntry> = (0..4)
            .map(|i| select(&questions, i, "b"))
            .collect();

        let outcome = score_exam(&questions, &answers);
        assert_eq!(outcome.correct, 4);
        assert_eq!(outcome.wrong, 0);
        assert_eq!(outcome.blank, 0);
        assert_eq!(outcome.score, 100.0);
    }

    #[test]
    fn mixed_answers_score_matches_formula() {
        let questions: Vec<Question> = (0..4).map(|_| mc_question("a")).collect();
        let mut answers = HashMap::new();
        answers.extend([select(&questions, 0, "a"), select(&questions, 1, "a")]);
        answers.extend([select(&questions, 2, "c")]);
        // question 3 left blank

        let outcome = score_exam(&questions, &answers);
        assert_eq!(outcome.correct, 2);
        assert_eq!(outcome.wrong, 1);
        assert_eq!(outcome.blank, 1);
        assert_eq!(outcome.score, 50.0);
    }

    #[test]
    fn counts_always_sum_to_total() {
        let questions = vec![mc_question("a"), written_question(Some("Ankara")), mc_question("d")];
        let mut answers = HashMap::new();
        answers.extend([select(&questions, 0, "b")]);

        let outcome = score_exam(&questions, &answers);
        assert_eq!(
            outcome.correct + outcome.wrong + outcome.blank,
            questions.len() as i32
        );
        assert_eq!(outcome.answers.len(), questions.len());
    }

    #[test]
    fn written_answer_matching_ignores_case_and_whitespace() {
        let questions = vec![written_question(Some("Ankara"))];
        let answers: HashMap<Uuid, AnswerEntry> =
            [(questions[0].id, AnswerEntry::text("  ankara "))].into();

        let outcome = score_exam(&questions, &answers);
        assert_eq!(outcome.correct, 1);
        assert_eq!(
            outcome.answers[&questions[0].id].answer_text.as_deref(),
            Some("ankara")
        );
    }

    #[test]
    fn empty_written_answer_is_blank_not_wrong() {
        let questions = vec![written_question(Some("Ankara"))];
        let answers: HashMap<Uuid, AnswerEntry> =
            [(questions[0].id, AnswerEntry::text("   "))].into();

        let outcome = score_exam(&questions, &answers);
        assert_eq!(outcome.blank, 1);
        assert_eq!(outcome.wrong, 0);
        assert!(!outcome.answers[&questions[0].id].is_correct);
    }

    #[test]
    fn written_without_answer_key_never_correct() {
        let questions = vec![written_question(None), written_question(Some(""))];
        let answers: HashMap<Uuid, AnswerEntry> = questions
            .iter()
            .map(|q| (q.id, AnswerEntry::text("anything")))
            .collect();

        let outcome = score_exam(&questions, &answers);
        assert_eq!(outcome.correct, 0);
        assert_eq!(outcome.wrong, 2);
    }

    #[test]
    fn unmatched_choice_id_counts_as_blank() {
        let questions = vec![mc_question("a")];
        let answers: HashMap<Uuid, AnswerEntry> =
            [(questions[0].id, AnswerEntry::choice("zz", "ZZ"))].into();

        let outcome = score_exam(&questions, &answers);
        assert_eq!(outcome.blank, 1);
        assert!(!outcome.answers[&questions[0].id].is_correct);
    }

    #[test]
    fn malformed_question_without_correct_choice_scores_wrong() {
        let mut question = mc_question("a");
        for choice in question.choices.0.iter_mut() {
            choice.is_correct = false;
        }
        let answers: HashMap<Uuid, AnswerEntry> =
            [select(std::slice::from_ref(&question), 0, "a")].into();

        let outcome = score_exam(std::slice::from_ref(&question), &answers);
        assert_eq!(outcome.wrong, 1);
        assert_eq!(outcome.correct, 0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let questions = vec![mc_question("a"), written_question(Some("Paris"))];
        let mut answers = HashMap::new();
        answers.extend([select(&questions, 0, "a")]);
        answers.insert(questions[1].id, AnswerEntry::text("paris"));

        let first = score_exam(&questions, &answers);
        let second = score_exam(&questions, &answers);
        assert_eq!(first, second);
    }

    #[test]
    fn score_rounds_to_two_decimals() {
        let questions: Vec<Question> = (0..3).map(|_| mc_question("a")).collect();
        let answers: HashMap<Uuid, AnswerEntry> = [select(&questions, 0, "a")].into();

        let outcome = score_exam(&questions, &answers);
        // 1/3 * 100 = 33.333... -> 33.33
        assert_eq!(outcome.score, 33.33);
        assert!(outcome.score >= 0.0 && outcome.score <= 100.0);
    }
}
