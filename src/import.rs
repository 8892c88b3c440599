//! One-time bulk load of the question bank from a CSV file.
//!
//! Expected columns, in order: `company, difficulty, topic, question`.
//! The first row is a header and is skipped. Every row is validated before
//! anything is written, and all rows go in through a single transaction.

use std::{io::Read, path::Path};

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::NewQuestion;
use crate::store;

#[derive(Debug, Error)]
pub enum ImportError {
  #[error("could not read question file: {0}")]
  Io(#[from] std::io::Error),
  #[error("malformed CSV: {0}")]
  Csv(#[from] csv::Error),
  #[error("line {line}: expected 4 fields (company, difficulty, topic, question), found {found}")]
  WrongFieldCount { line: u64, found: usize },
  #[error("line {line}: field `{field}` is empty")]
  EmptyField { line: u64, field: &'static str },
  #[error("database error: {0}")]
  Storage(#[from] sqlx::Error),
}

const COLUMNS: [&str; 4] = ["company", "difficulty", "topic", "question"];

/// Parse every data row of `reader` into questions.
pub fn parse_questions<R: Read>(reader: R) -> Result<Vec<NewQuestion>, ImportError> {
  let mut csv = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_reader(reader);

  let mut out = Vec::new();
  for record in csv.records() {
    let record = record?;
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    if record.len() != COLUMNS.len() {
      return Err(ImportError::WrongFieldCount { line, found: record.len() });
    }
    let mut fields = [""; 4];
    for (i, name) in COLUMNS.into_iter().enumerate() {
      let value = record.get(i).unwrap_or_default().trim();
      if value.is_empty() {
        return Err(ImportError::EmptyField { line, field: name });
      }
      fields[i] = value;
    }
    let [company, difficulty, topic, question] = fields;
    out.push(NewQuestion {
      company: company.to_string(),
      difficulty: difficulty.to_string(),
      topic: topic.to_string(),
      question: question.to_string(),
    });
  }
  Ok(out)
}

#[instrument(level = "info", skip(pool), fields(path = %path.display()))]
pub async fn import_file(pool: &SqlitePool, path: &Path) -> Result<u64, ImportError> {
  let file = std::fs::File::open(path)?;
  let questions = parse_questions(file)?;
  let written = store::insert_questions(pool, &questions).await?;
  info!(target: "questions", written, "Question bank imported");
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::memory_pool;
  use crate::domain::QuestionFilter;
  use std::io::Write;

  const SAMPLE: &str = "company,difficulty,topic,question
Google,Easy,Arrays,\"Given an array of integers, return indices of the two numbers that add up to a target.\"
Meta,Medium,Graphs,Clone an undirected graph.
";

  #[test]
  fn header_is_skipped_and_quoted_commas_survive() {
    let qs = parse_questions(SAMPLE.as_bytes()).unwrap();
    assert_eq!(qs.len(), 2);
    assert_eq!(qs[0].company, "Google");
    assert_eq!(qs[0].difficulty, "Easy");
    assert_eq!(qs[0].topic, "Arrays");
    assert!(qs[0].question.contains("integers, return indices"));
    assert_eq!(qs[1].question, "Clone an undirected graph.");
  }

  #[test]
  fn wrong_arity_reports_the_line() {
    let data = "company,difficulty,topic,question\nGoogle,Easy,Arrays,q1\nGoogle,Easy,q2\n";
    match parse_questions(data.as_bytes()) {
      Err(ImportError::WrongFieldCount { line, found }) => {
        assert_eq!(line, 3);
        assert_eq!(found, 3);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn blank_fields_are_rejected() {
    let data = "company,difficulty,topic,question\nGoogle, ,Arrays,q1\n";
    assert!(matches!(
      parse_questions(data.as_bytes()),
      Err(ImportError::EmptyField { line: 2, field: "difficulty" })
    ));
  }

  #[tokio::test]
  async fn import_file_writes_every_row() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    let pool = memory_pool().await;

    assert_eq!(import_file(&pool, file.path()).await.unwrap(), 2);
    let filter = QuestionFilter { company: "Meta".into(), topic: "Graphs".into(), difficulty: "Medium".into() };
    assert_eq!(store::questions_matching(&pool, &filter).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn malformed_file_writes_nothing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"company,difficulty,topic,question\nGoogle,Easy,Arrays,ok\nbroken\n").unwrap();
    let pool = memory_pool().await;

    assert!(import_file(&pool, file.path()).await.is_err());
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions").fetch_one(&pool).await.unwrap();
    assert_eq!(n, 0);
  }
}
