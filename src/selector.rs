//! Random question selection.
//!
//! Matching rows are fetched in full and sampled here rather than with the
//! database's own random ordering, so the choice is portable across stores
//! and reproducible with a seeded generator.

use rand::{seq::SliceRandom, Rng};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::domain::{Question, QuestionFilter};
use crate::store;

/// Result of a selection. `NotFound` is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionPick {
  Found(Question),
  NotFound,
}

/// Uniformly choose one of `candidates`.
pub fn pick_uniform<R: Rng + ?Sized>(candidates: &[Question], rng: &mut R) -> QuestionPick {
  match candidates.choose(rng) {
    Some(q) => QuestionPick::Found(q.clone()),
    None => QuestionPick::NotFound,
  }
}

#[instrument(level = "info", skip(pool, filter, rng), fields(company = %filter.company, topic = %filter.topic, difficulty = %filter.difficulty))]
pub async fn pick_random<R: Rng + ?Sized>(
  pool: &SqlitePool,
  filter: &QuestionFilter,
  rng: &mut R,
) -> Result<QuestionPick, sqlx::Error> {
  let candidates = store::questions_matching(pool, filter).await?;
  let pick = pick_uniform(&candidates, rng);
  match &pick {
    QuestionPick::Found(q) => info!(target: "questions", candidates = candidates.len(), chosen = q.id, "Question selected"),
    QuestionPick::NotFound => info!(target: "questions", "No question matches filter"),
  }
  Ok(pick)
}
