//! Database access for polls models

use chrono::{DateTime, Utc};

use super::models::{Choice, Question};
use crate::db::Database;
use crate::error::{Error, Result};

const QUESTION_COLUMNS: &str = "id, question_text, pub_date";
const CHOICE_COLUMNS: &str = "id, question_id, choice_text, votes";

fn check_text(field: &str, text: &str) -> Result<()> {
	if text.trim().is_empty() {
		return Err(Error::BadRequest(format!("{} must not be empty", field)));
	}
	if text.chars().count() > Question::MAX_TEXT_LENGTH {
		return Err(Error::BadRequest(format!(
			"{} is longer than {} characters",
			field,
			Question::MAX_TEXT_LENGTH
		)));
	}
	Ok(())
}

/// Query interface for [`Question`] rows
pub struct QuestionManager<'a> {
	db: &'a Database,
}

impl<'a> QuestionManager<'a> {
	pub fn new(db: &'a Database) -> Self {
		Self { db }
	}

	/// Insert a question and return it as stored
	pub async fn create(&self, question_text: &str, pub_date: DateTime<Utc>) -> Result<Question> {
		check_text("question_text", question_text)?;
		let question = sqlx::query_as::<_, Question>(&format!(
			"INSERT INTO polls_question (question_text, pub_date) VALUES ($1, $2) RETURNING {}",
			QUESTION_COLUMNS
		))
		.bind(question_text)
		.bind(pub_date)
		.fetch_one(self.db.pool())
		.await?;
		tracing::debug!(id = question.id, "question created");
		Ok(question)
	}

	/// Questions published at or before `now`, most recent first
	///
	/// Ties on `pub_date` fall back to the newest id so the order is total.
	pub async fn published(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Question>> {
		let questions = sqlx::query_as::<_, Question>(&format!(
			"SELECT {} FROM polls_question WHERE pub_date <= $1 \
			 ORDER BY pub_date DESC, id DESC LIMIT $2",
			QUESTION_COLUMNS
		))
		.bind(now)
		.bind(limit)
		.fetch_all(self.db.pool())
		.await?;
		Ok(questions)
	}

	pub async fn get(&self, id: i64) -> Result<Option<Question>> {
		let question = sqlx::query_as::<_, Question>(&format!(
			"SELECT {} FROM polls_question WHERE id = $1",
			QUESTION_COLUMNS
		))
		.bind(id)
		.fetch_optional(self.db.pool())
		.await?;
		Ok(question)
	}

	/// Fetch a question that is visible at `now`
	///
	/// Unpublished questions are reported exactly like missing ones.
	pub async fn get_published(&self, id: i64, now: DateTime<Utc>) -> Result<Question> {
		match self.get(id).await? {
			Some(question) if question.is_published_at(now) => Ok(question),
			_ => Err(Error::NotFound(format!("question {}", id))),
		}
	}

	pub async fn count(&self) -> Result<i64> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM polls_question")
			.fetch_one(self.db.pool())
			.await?;
		Ok(count)
	}
}

/// Query interface for [`Choice`] rows
pub struct ChoiceManager<'a> {
	db: &'a Database,
}

impl<'a> ChoiceManager<'a> {
	pub fn new(db: &'a Database) -> Self {
		Self { db }
	}

	pub async fn create(&self, question_id: i64, choice_text: &str) -> Result<Choice> {
		check_text("choice_text", choice_text)?;
		let choice = sqlx::query_as::<_, Choice>(&format!(
			"INSERT INTO polls_choice (question_id, choice_text, votes) VALUES ($1, $2, 0) RETURNING {}",
			CHOICE_COLUMNS
		))
		.bind(question_id)
		.bind(choice_text)
		.fetch_one(self.db.pool())
		.await?;
		Ok(choice)
	}

	pub async fn get(&self, id: i64) -> Result<Option<Choice>> {
		let choice = sqlx::query_as::<_, Choice>(&format!(
			"SELECT {} FROM polls_choice WHERE id = $1",
			CHOICE_COLUMNS
		))
		.bind(id)
		.fetch_optional(self.db.pool())
		.await?;
		Ok(choice)
	}

	/// Choices of a question in creation order
	pub async fn for_question(&self, question_id: i64) -> Result<Vec<Choice>> {
		let choices = sqlx::query_as::<_, Choice>(&format!(
			"SELECT {} FROM polls_choice WHERE question_id = $1 ORDER BY id",
			CHOICE_COLUMNS
		))
		.bind(question_id)
		.fetch_all(self.db.pool())
		.await?;
		Ok(choices)
	}

	/// Add one vote to a choice of `question_id`
	///
	/// Returns `None` when the choice does not exist or belongs to another
	/// question. The increment happens in SQL so concurrent votes never
	/// overwrite each other.
	pub async fn vote(&self, question_id: i64, choice_id: i64) -> Result<Option<Choice>> {
		let choice = sqlx::query_as::<_, Choice>(&format!(
			"UPDATE polls_choice SET votes = votes + 1 WHERE id = $1 AND question_id = $2 RETURNING {}",
			CHOICE_COLUMNS
		))
		.bind(choice_id)
		.bind(question_id)
		.fetch_optional(self.db.pool())
		.await?;
		if let Some(choice) = &choice {
			tracing::info!(question_id, choice_id, votes = choice.votes, "vote recorded");
		}
		Ok(choice)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use rstest::*;

	#[fixture]
	async fn db() -> Database {
		let db = Database::connect_in_memory().await.unwrap();
		db.migrate().await.unwrap();
		db
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_returns_stored_question(#[future] db: Database) {
		let db = db.await;
		let questions = QuestionManager::new(&db);
		let pub_date = Utc::now() - Duration::days(2);

		let created = questions.create("What's new?", pub_date).await.unwrap();
		let fetched = questions.get(created.id).await.unwrap();

		assert_eq!(fetched, Some(created.clone()));
		assert_eq!(created.question_text, "What's new?");
		assert_eq!(questions.count().await.unwrap(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_rejects_overlong_text(#[future] db: Database) {
		let db = db.await;
		let text = "x".repeat(Question::MAX_TEXT_LENGTH + 1);

		let result = QuestionManager::new(&db).create(&text, Utc::now()).await;

		assert!(matches!(result, Err(Error::BadRequest(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_published_excludes_future_and_orders_by_recency(#[future] db: Database) {
		let db = db.await;
		let questions = QuestionManager::new(&db);
		let now = Utc::now();
		let old = questions.create("Old", now - Duration::days(30)).await.unwrap();
		let recent = questions.create("Recent", now - Duration::hours(1)).await.unwrap();
		questions.create("Future", now + Duration::days(3)).await.unwrap();

		let published = questions.published(now, 5).await.unwrap();

		assert_eq!(published, vec![recent, old]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_published_includes_question_published_exactly_now(#[future] db: Database) {
		let db = db.await;
		let questions = QuestionManager::new(&db);
		let now = Utc::now();
		let question = questions.create("Right now", now).await.unwrap();

		assert_eq!(questions.published(now, 5).await.unwrap(), vec![question]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_published_respects_limit(#[future] db: Database) {
		let db = db.await;
		let questions = QuestionManager::new(&db);
		let now = Utc::now();
		for days in 1..=7 {
			questions
				.create(&format!("Question {}", days), now - Duration::days(days))
				.await
				.unwrap();
		}

		let published = questions.published(now, 5).await.unwrap();

		assert_eq!(published.len(), 5);
		assert_eq!(published[0].question_text, "Question 1");
		assert_eq!(published[4].question_text, "Question 5");
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_published_hides_future_question(#[future] db: Database) {
		let db = db.await;
		let questions = QuestionManager::new(&db);
		let now = Utc::now();
		let future = questions.create("Future", now + Duration::days(5)).await.unwrap();

		let result = questions.get_published(future.id, now).await;
		assert!(matches!(result, Err(Error::NotFound(_))));

		let missing = questions.get_published(future.id + 100, now).await;
		assert!(matches!(missing, Err(Error::NotFound(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_vote_increments_only_matching_choice(#[future] db: Database) {
		let db = db.await;
		let now = Utc::now();
		let first = QuestionManager::new(&db).create("First", now).await.unwrap();
		let second = QuestionManager::new(&db).create("Second", now).await.unwrap();
		let choices = ChoiceManager::new(&db);
		let choice = choices.create(first.id, "Yes").await.unwrap();

		let voted = choices.vote(first.id, choice.id).await.unwrap().unwrap();
		assert_eq!(voted.votes, 1);

		let wrong_question = choices.vote(second.id, choice.id).await.unwrap();
		assert!(wrong_question.is_none());

		let stored = choices.get(choice.id).await.unwrap().unwrap();
		assert_eq!(stored.votes, 1);
		assert_eq!(stored.question_id, first.id);
		assert!(choices.get(choice.id + 1).await.unwrap().is_none());
	}
}
