// src/exam/session.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::exam::hydrate::hydrate_exam;
use crate::exam::scoring::score_exam;
use crate::models::exam_result::{AnswerEntry, ExamResult, NewExamResult};
use crate::models::metadata::Metadata;
use crate::models::question::{Question, QuestionType};
use crate::store::{BlueprintStore, QuestionStore, ResultStore};

/// Lifecycle of one exam attempt.
///
/// `Failed` is only entered on a persistence failure during submission; a
/// hydration failure surfaces its error and the session returns straight
/// to `Idle` so the learner can pick another exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    InProgress,
    Submitting,
    Completed,
    Failed,
}

/// One in-flight exam attempt.
///
/// Never persisted: the session lives for the duration of a request (or a
/// test) and is discarded after successful submission. All context arrives
/// through the constructor instead of ambient globals.
pub struct ExamSession {
    institution_id: Uuid,
    blueprint_id: Uuid,
    user_id: Uuid,
    student_id: Option<Uuid>,
    attempt_id: Uuid,
    phase: SessionPhase,
    questions: Vec<Question>,
    answers: HashMap<Uuid, AnswerEntry>,
    started_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    pub fn new(
        institution_id: Uuid,
        blueprint_id: Uuid,
        user_id: Uuid,
        student_id: Option<Uuid>,
        attempt_id: Option<Uuid>,
    ) -> Self {
        ExamSession {
            institution_id,
            blueprint_id,
            user_id,
            student_id,
            attempt_id: attempt_id.unwrap_or_else(Uuid::new_v4),
            phase: SessionPhase::Idle,
            questions: Vec::new(),
            answers: HashMap::new(),
            started_at: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    /// Hydrated questions in presentation order. Empty before `start`.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &HashMap<Uuid, AnswerEntry> {
        &self.answers
    }

    /// idle -> loading -> in_progress, or back to idle on hydration failure.
    /// Records the start timestamp on success.
    pub async fn start(
        &mut self,
        blueprints: &dyn BlueprintStore,
        questions: &dyn QuestionStore,
    ) -> Result<&[Question], AppError> {
        if self.phase != SessionPhase::Idle {
            return Err(AppError::InvalidTransition(
                "exam already started".to_string(),
            ));
        }

        self.phase = SessionPhase::Loading;
        match hydrate_exam(blueprints, questions, self.institution_id, self.blueprint_id).await {
            Ok(hydrated) => {
                self.questions = hydrated.questions;
                self.started_at = Some(Utc::now());
                self.phase = SessionPhase::InProgress;
                Ok(&self.questions)
            }
            Err(err) => {
                self.phase = SessionPhase::Idle;
                Err(err)
            }
        }
    }

    /// in_progress -> in_progress. Overwrites any earlier entry for the
    /// same question (last write wins). Rejects ids outside the hydrated
    /// question list so the answer map stays a subset of the exam.
    pub fn record_answer(
        &mut self,
        question_id: Uuid,
        entry: AnswerEntry,
    ) -> Result<(), AppError> {
        if self.phase != SessionPhase::InProgress {
            return Err(AppError::InvalidTransition(
                "answers can only be recorded while the exam is in progress".to_string(),
            ));
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(AppError::BadRequest(
                "question is not part of this exam".to_string(),
            ));
        }
        self.answers.insert(question_id, entry);
        Ok(())
    }

    /// Convenience for multiple-choice answers; resolves the choice label
    /// from the question so the stored entry matches what was shown.
    pub fn select_choice(&mut self, question_id: Uuid, choice_id: &str) -> Result<(), AppError> {
        let label = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .filter(|q| q.question_type == QuestionType::MultipleChoice)
            .and_then(|q| q.choice_by_id(choice_id))
            .map(|c| c.label.clone())
            .unwrap_or_default();
        self.record_answer(question_id, AnswerEntry::choice(choice_id, label))
    }

    /// in_progress | failed -> submitting -> completed, or -> failed when
    /// the write does not go through. On failure the answer map is kept
    /// untouched so the learner can retry without re-answering; any number
    /// of questions may be unanswered (scored as blank).
    ///
    /// `duration_seconds` lets the caller pass a client-measured duration;
    /// when absent the session measures from its own start timestamp.
    pub async fn submit(
        &mut self,
        results: &dyn ResultStore,
        duration_seconds: Option<i32>,
    ) -> Result<ExamResult, AppError> {
        match self.phase {
            SessionPhase::InProgress | SessionPhase::Failed => {}
            _ => {
                return Err(AppError::InvalidTransition(
                    "exam is not in a submittable state".to_string(),
                ));
            }
        }

        self.phase = SessionPhase::Submitting;

        // Scoring completes fully before persistence begins.
        let outcome = score_exam(&self.questions, &self.answers);

        let duration = duration_seconds.or_else(|| {
            self.started_at.map(|started| {
                let elapsed = (Utc::now() - started).num_seconds();
                elapsed.clamp(1, i64::from(i32::MAX)) as i32
            })
        });

        let new = NewExamResult {
            attempt_id: self.attempt_id,
            institution_id: self.institution_id,
            user_id: self.user_id,
            student_id: self.student_id,
            exam_blueprint_id: self.blueprint_id,
            question_ids: self.questions.iter().map(|q| q.id).collect(),
            answers: outcome.answers,
            correct_count: outcome.correct,
            wrong_count: outcome.wrong,
            empty_count: outcome.blank,
            score: outcome.score,
            duration_seconds: duration,
            metadata: Metadata::new(),
        };

        match results.insert_result(new).await {
            Ok(result) => {
                self.phase = SessionPhase::Completed;
                Ok(result)
            }
            Err(err) => {
                self.phase = SessionPhase::Failed;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blueprint::CreateBlueprintRequest;
    use crate::models::metadata::Metadata;
    use crate::models::question::{
        CreateQuestionRequest, Difficulty, QuestionChoice,
    };
    use crate::store::MemoryStore;

    fn mc_request(correct_id: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_type: QuestionType::MultipleChoice,
            subject: "geography".to_string(),
            topic: "capitals".to_string(),
            difficulty: Difficulty::Easy,
            question_text: "Pick the right one".to_string(),
            passage_text: None,
            choices: ["a", "b", "c"]
                .iter()
                .map(|id| QuestionChoice {
                    id: id.to_string(),
                    label: id.to_uppercase(),
                    text: format!("choice {}", id),
                    is_correct: *id == correct_id,
                })
                .collect(),
            answer_key: None,
            explanation: None,
            metadata: Metadata::new(),
        }
    }

    /// Seeds `count` questions and one blueprint referencing them all,
    /// plus any extra (dangling) ids appended to the blueprint.
    async fn seed(
        store: &MemoryStore,
        institution_id: Uuid,
        count: usize,
        dangling: usize,
    ) -> (Uuid, Vec<Uuid>) {
        let mut ids = Vec::new();
        for _ in 0..count {
            let q = crate::store::QuestionStore::insert_question(
                store,
                institution_id,
                mc_request("a"),
            )
            .await
            .unwrap();
            ids.push(q.id);
        }

        let mut blueprint_ids = ids.clone();
        blueprint_ids.extend((0..dangling).map(|_| Uuid::new_v4()));

        let blueprint = crate::store::BlueprintStore::insert_blueprint(
            store,
            institution_id,
            CreateBlueprintRequest {
                name: "Weekly exam".to_string(),
                exam_type: "custom".to_string(),
                duration_minutes: Some(30),
                question_ids: blueprint_ids,
                question_count: None,
                metadata: Metadata::new(),
            },
        )
        .await
        .unwrap();

        (blueprint.id, ids)
    }

    fn session(institution_id: Uuid, blueprint_id: Uuid) -> ExamSession {
        ExamSession::new(institution_id, blueprint_id, Uuid::new_v4(), None, None)
    }

    #[tokio::test]
    async fn full_flow_reaches_completed() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, question_ids) = seed(&store, institution_id, 3, 0).await;

        let mut session = session(institution_id, blueprint_id);
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.start(&store, &store).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.questions().len(), 3);

        for id in &question_ids {
            session.select_choice(*id, "a").unwrap();
        }

        let result = session.submit(&store, Some(120)).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(result.correct_count, 3);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.duration_seconds, Some(120));
        assert_eq!(result.question_ids.0, question_ids);
    }

    #[tokio::test]
    async fn hydration_preserves_order_and_drops_missing_ids() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, question_ids) = seed(&store, institution_id, 4, 1).await;

        let mut session = session(institution_id, blueprint_id);
        session.start(&store, &store).await.unwrap();

        // 5 ids in the blueprint, only 4 resolve.
        let hydrated: Vec<Uuid> = session.questions().iter().map(|q| q.id).collect();
        assert_eq!(hydrated, question_ids);

        let result = session.submit(&store, None).await.unwrap();
        assert_eq!(
            result.correct_count + result.wrong_count + result.empty_count,
            4
        );
    }

    #[tokio::test]
    async fn hydration_failure_returns_to_idle() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();

        let mut session = session(institution_id, Uuid::new_v4());
        let err = session.start(&store, &store).await.unwrap_err();
        assert!(matches!(err, AppError::Hydration(_)));
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn blueprint_with_only_dangling_ids_fails_hydration() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, _) = seed(&store, institution_id, 0, 3).await;

        let mut session = session(institution_id, blueprint_id);
        let err = session.start(&store, &store).await.unwrap_err();
        assert!(matches!(err, AppError::Hydration(_)));
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn last_write_wins_per_question() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, question_ids) = seed(&store, institution_id, 1, 0).await;

        let mut session = session(institution_id, blueprint_id);
        session.start(&store, &store).await.unwrap();

        session.select_choice(question_ids[0], "b").unwrap();
        session.select_choice(question_ids[0], "a").unwrap();
        assert_eq!(session.answers().len(), 1);

        let result = session.submit(&store, None).await.unwrap();
        assert_eq!(result.correct_count, 1);
    }

    #[tokio::test]
    async fn unknown_question_id_rejected() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, _) = seed(&store, institution_id, 1, 0).await;

        let mut session = session(institution_id, blueprint_id);
        session.start(&store, &store).await.unwrap();

        let err = session
            .record_answer(Uuid::new_v4(), AnswerEntry::text("hello"))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn blank_submission_is_allowed() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, _) = seed(&store, institution_id, 2, 0).await;

        let mut session = session(institution_id, blueprint_id);
        session.start(&store, &store).await.unwrap();

        let result = session.submit(&store, None).await.unwrap();
        assert_eq!(result.empty_count, 2);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.answers.len(), 2);
    }

    #[tokio::test]
    async fn persistence_failure_keeps_answers_and_allows_retry() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, question_ids) = seed(&store, institution_id, 2, 0).await;

        let mut session = session(institution_id, blueprint_id);
        session.start(&store, &store).await.unwrap();
        session.select_choice(question_ids[0], "a").unwrap();

        store.set_fail_result_inserts(true);
        let err = session.submit(&store, None).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.answers().len(), 1);
        assert_eq!(store.result_count(), 0);

        store.set_fail_result_inserts(false);
        let result = session.submit(&store, None).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(result.correct_count, 1);
        assert_eq!(store.result_count(), 1);
    }

    #[tokio::test]
    async fn transitions_from_wrong_phase_rejected() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, question_ids) = seed(&store, institution_id, 1, 0).await;

        let mut session = session(institution_id, blueprint_id);

        // Cannot answer or submit before start.
        assert!(matches!(
            session.record_answer(question_ids[0], AnswerEntry::text("x")),
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(
            session.submit(&store, None).await,
            Err(AppError::InvalidTransition(_))
        ));

        session.start(&store, &store).await.unwrap();

        // Cannot start twice.
        assert!(matches!(
            session.start(&store, &store).await,
            Err(AppError::InvalidTransition(_))
        ));

        session.submit(&store, None).await.unwrap();

        // Completed sessions accept nothing further.
        assert!(matches!(
            session.submit(&store, None).await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(
            session.record_answer(question_ids[0], AnswerEntry::text("x")),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn same_attempt_id_never_duplicates_results() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let (blueprint_id, _) = seed(&store, institution_id, 1, 0).await;
        let attempt_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut first = ExamSession::new(
            institution_id,
            blueprint_id,
            user_id,
            None,
            Some(attempt_id),
        );
        first.start(&store, &store).await.unwrap();
        let first_result = first.submit(&store, None).await.unwrap();

        // A second client-side session replaying the same attempt id
        // (double-click, retry after timeout) stores nothing new.
        let mut second = ExamSession::new(
            institution_id,
            blueprint_id,
            user_id,
            None,
            Some(attempt_id),
        );
        second.start(&store, &store).await.unwrap();
        let second_result = second.submit(&store, None).await.unwrap();

        assert_eq!(first_result.id, second_result.id);
        assert_eq!(store.result_count(), 1);
    }
}
