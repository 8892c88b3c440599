//! Core behaviors behind the question and solution routes.
//!
//! Generation failures degrade to a message here; only storage failures
//! propagate to the caller.

use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, instrument, warn};

use crate::domain::QuestionFilter;
use crate::gateway::{self, GenerationError, TextGenerator, Verdict};
use crate::selector::{self, QuestionPick};
use crate::state::AppState;

/// What the question route has to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionOutcome {
  /// Formatted question text, or the degraded failure message.
  Text(String),
  /// Nothing in the bank matches the filter.
  NoMatch(QuestionFilter),
}

#[instrument(level = "info", skip(state, filter), fields(company = %filter.company, topic = %filter.topic, difficulty = %filter.difficulty))]
pub async fn generate_question(state: &AppState, filter: &QuestionFilter) -> Result<QuestionOutcome, sqlx::Error> {
  let mut rng = StdRng::from_entropy();
  let question = match selector::pick_random(&state.db, filter, &mut rng).await? {
    QuestionPick::Found(q) => q,
    QuestionPick::NotFound => {
      warn!(target: "questions", "Question requested for a filter with no rows");
      return Ok(QuestionOutcome::NoMatch(filter.clone()));
    }
  };

  let text = match generator(state) {
    Ok(gen) => gateway::format_question(gen, &state.prompts, &question.question).await,
    Err(e) => Err(e),
  };
  Ok(QuestionOutcome::Text(text.unwrap_or_else(|e| e.user_message())))
}

/// Judge a submission. Returns the verdict, or feedback carrying the
/// degraded failure message.
#[instrument(level = "info", skip(state, question, code), fields(question_len = question.len(), code_len = code.len()))]
pub async fn judge_solution(state: &AppState, question: &str, code: &str) -> Verdict {
  let reply = match generator(state) {
    Ok(gen) => gateway::check_solution(gen, &state.prompts, question, code).await,
    Err(e) => Err(e),
  };
  match reply {
    Ok(text) => {
      let verdict = Verdict::from_reply(&text);
      info!(target: "questions", correct = matches!(verdict, Verdict::Correct), "Solution judged");
      verdict
    }
    Err(e) => Verdict::Feedback(e.user_message()),
  }
}

fn generator(state: &AppState) -> Result<&dyn TextGenerator, GenerationError> {
  state.generator.as_deref().ok_or(GenerationError::NotConfigured)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::memory_pool;
  use crate::gateway::fake::FixedGenerator;
  use crate::gateway::CORRECT_MARKER;
  use crate::store::{insert_questions, sample_question};
  use std::sync::Arc;

  fn filter() -> QuestionFilter {
    QuestionFilter { company: "Google".into(), topic: "Arrays".into(), difficulty: "Easy".into() }
  }

  #[tokio::test]
  async fn matching_question_is_sent_to_the_generator() {
    let pool = memory_pool().await;
    insert_questions(&pool, &[sample_question("Google", "Easy", "Arrays", "Return indices of two numbers adding to target.")])
      .await
      .unwrap();
    let gen = Arc::new(FixedGenerator::replying("FORMATTED"));
    let state = AppState::for_tests(pool, Some(gen.clone()));

    let out = generate_question(&state, &filter()).await.unwrap();
    assert_eq!(out, QuestionOutcome::Text("FORMATTED".into()));
    assert!(gen.last_prompt().unwrap().contains("Return indices of two numbers adding to target."));
  }

  #[tokio::test]
  async fn empty_match_is_reported_without_calling_the_generator() {
    let gen = Arc::new(FixedGenerator::replying("unused"));
    let state = AppState::for_tests(memory_pool().await, Some(gen.clone()));

    let out = generate_question(&state, &filter()).await.unwrap();
    assert_eq!(out, QuestionOutcome::NoMatch(filter()));
    assert!(gen.last_prompt().is_none());
  }

  #[tokio::test]
  async fn missing_generator_degrades_to_a_message() {
    let pool = memory_pool().await;
    insert_questions(&pool, &[sample_question("Google", "Easy", "Arrays", "q")]).await.unwrap();
    let state = AppState::for_tests(pool, None);

    match generate_question(&state, &filter()).await.unwrap() {
      QuestionOutcome::Text(t) => assert_eq!(t, GenerationError::NotConfigured.user_message()),
      other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
      judge_solution(&state, "q", "code").await,
      Verdict::Feedback(GenerationError::NotConfigured.user_message())
    );
  }

  #[tokio::test]
  async fn judge_passes_model_text_through() {
    let pool = memory_pool().await;
    let correct = AppState::for_tests(pool.clone(), Some(Arc::new(FixedGenerator::replying(CORRECT_MARKER))));
    assert_eq!(judge_solution(&correct, "q", "code").await, Verdict::Correct);

    let feedback = "Off by one in the loop bound.\ndef f(xs): return sum(xs)";
    let wrong = AppState::for_tests(pool, Some(Arc::new(FixedGenerator::replying(feedback))));
    assert_eq!(judge_solution(&wrong, "q", "code").await, Verdict::Feedback(feedback.into()));
  }

  #[tokio::test]
  async fn network_failure_is_rendered_not_raised() {
    let pool = memory_pool().await;
    let err = GenerationError::Network("connection refused".into());
    let state = AppState::for_tests(pool, Some(Arc::new(FixedGenerator::failing(err.clone()))));
    assert_eq!(judge_solution(&state, "q", "code").await, Verdict::Feedback(err.user_message()));
  }
}
