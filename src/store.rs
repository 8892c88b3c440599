//! User and question persistence on top of the SQLite pool.

use sqlx::SqlitePool;
use tracing::instrument;

use crate::domain::{NewQuestion, NewUser, Question, QuestionCatalog, QuestionFilter, User};

/// Outcome of inserting a user when the email may already be taken.
#[derive(Debug)]
pub enum InsertUser {
    Created(User),
    EmailTaken,
}

#[instrument(level = "debug", skip(pool, email))]
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, first_name, last_name, email, password_hash FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Insert a user. A UNIQUE violation on `email` is reported as `EmailTaken`
/// so a concurrent signup that slips past the pre-check is still rejected.
#[instrument(level = "debug", skip(pool, user), fields(email_len = user.email.len()))]
pub async fn insert_user(pool: &SqlitePool, user: NewUser) -> Result<InsertUser, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password_hash) VALUES (?, ?, ?, ?)",
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(InsertUser::Created(User {
            id: done.last_insert_rowid(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
        })),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertUser::EmailTaken),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub async fn count_users(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users").fetch_one(pool).await?;
    Ok(n)
}

/// Every question whose three tags match the filter exactly.
#[instrument(level = "debug", skip(pool))]
pub async fn questions_matching(
    pool: &SqlitePool,
    filter: &QuestionFilter,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, company, difficulty, topic, question FROM questions
         WHERE company = ? AND topic = ? AND difficulty = ?
         ORDER BY id",
    )
    .bind(&filter.company)
    .bind(&filter.topic)
    .bind(&filter.difficulty)
    .fetch_all(pool)
    .await
}

/// Insert a batch of questions in one transaction. Returns the number of rows written.
#[instrument(level = "info", skip(pool, questions), fields(count = questions.len()))]
pub async fn insert_questions(pool: &SqlitePool, questions: &[NewQuestion]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut written = 0;
    for q in questions {
        written += sqlx::query(
            "INSERT INTO questions (company, difficulty, topic, question) VALUES (?, ?, ?, ?)",
        )
        .bind(&q.company)
        .bind(&q.difficulty)
        .bind(&q.topic)
        .bind(&q.question)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }
    tx.commit().await?;
    Ok(written)
}

#[instrument(level = "debug", skip(pool))]
pub async fn catalog(pool: &SqlitePool) -> Result<QuestionCatalog, sqlx::Error> {
    Ok(QuestionCatalog {
        companies: distinct(pool, "SELECT DISTINCT company FROM questions ORDER BY company").await?,
        topics: distinct(pool, "SELECT DISTINCT topic FROM questions ORDER BY topic").await?,
        difficulties: distinct(pool, "SELECT DISTINCT difficulty FROM questions ORDER BY difficulty").await?,
    })
}

async fn distinct(pool: &SqlitePool, sql: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(v,)| v).collect())
}

#[cfg(test)]
pub(crate) fn sample_question(company: &str, difficulty: &str, topic: &str, text: &str) -> NewQuestion {
    NewQuestion {
        company: company.into(),
        difficulty: difficulty.into(),
        topic: topic.into(),
        question: text.into(),
    }
}
