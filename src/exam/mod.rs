// src/exam/mod.rs

pub mod hydrate;
pub mod scoring;
pub mod session;

pub use hydrate::{HydratedExam, hydrate_exam};
pub use scoring::{ScoringOutcome, score_exam};
pub use session::{ExamSession, SessionPhase};
