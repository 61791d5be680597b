//! PostgreSQL database operations

use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::Result;
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that only connects on first use
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // === Progress Repository ===

    /// Whether a learner has ever saved progress
    pub async fn user_exists(&self, user_key: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE user_key = $1)")
            .bind(user_key)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// Store a learner's progress in one transaction.
    ///
    /// The learner row is upserted. A non-empty `answers` replaces every stored
    /// answer for the learner; an empty one leaves them untouched. Study days
    /// are upserted.
    pub async fn save_progress(
        &self,
        user_key: &str,
        answers: &[AnswerRecord],
        study_dates: &[NaiveDate],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (user_key)
            VALUES ($1)
            ON CONFLICT (user_key) DO NOTHING
            "#,
        )
        .bind(user_key)
        .execute(&mut *tx)
        .await?;

        if !answers.is_empty() {
            sqlx::query("DELETE FROM answers WHERE user_key = $1")
                .bind(user_key)
                .execute(&mut *tx)
                .await?;

            for answer in answers {
                sqlx::query(
                    r#"
                    INSERT INTO answers (user_key, question_id, selected, is_correct, answered_at, chapter, source)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(user_key)
                .bind(&answer.question_id)
                .bind(&answer.selected)
                .bind(answer.is_correct)
                .bind(answer.answered_at)
                .bind(answer.chapter.as_deref().filter(|c| !c.is_empty()))
                .bind(answer.source.as_deref().filter(|s| !s.is_empty()))
                .execute(&mut *tx)
                .await?;
            }
        }

        for date in study_dates {
            sqlx::query(
                r#"
                INSERT INTO study_days (user_key, study_date)
                VALUES ($1, $2)
                ON CONFLICT (user_key, study_date) DO NOTHING
                "#,
            )
            .bind(user_key)
            .bind(date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// A learner's answers, oldest first
    pub async fn get_answers(&self, user_key: &str) -> Result<Vec<DbAnswer>> {
        let answers = sqlx::query_as::<_, DbAnswer>(
            r#"
            SELECT user_key, question_id, selected, is_correct, answered_at, chapter, source
            FROM answers
            WHERE user_key = $1
            ORDER BY answered_at ASC, id ASC
            "#,
        )
        .bind(user_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    /// A learner's study days in calendar order
    pub async fn get_study_days(&self, user_key: &str) -> Result<Vec<NaiveDate>> {
        let days = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT study_date
            FROM study_days
            WHERE user_key = $1
            ORDER BY study_date
            "#,
        )
        .bind(user_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }

    // === Instructor Report ===

    /// Every learner, newest first
    pub async fn list_users(&self) -> Result<Vec<DbUser>> {
        let users = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT user_key, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn list_answers(&self) -> Result<Vec<DbAnswer>> {
        let answers = sqlx::query_as::<_, DbAnswer>(
            r#"
            SELECT user_key, question_id, selected, is_correct, answered_at, chapter, source
            FROM answers
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    pub async fn list_study_days(&self) -> Result<Vec<DbStudyDay>> {
        let days = sqlx::query_as::<_, DbStudyDay>(
            r#"
            SELECT user_key, study_date
            FROM study_days
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }

    /// Remove a learner and everything stored for them
    pub async fn delete_user(&self, user_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_key = $1")
            .bind(user_key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
