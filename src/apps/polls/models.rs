use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Question model representing a poll question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
	pub id: i64,
	pub question_text: String,
	pub pub_date: DateTime<Utc>,
}

impl Question {
	pub const MAX_TEXT_LENGTH: usize = 200;

	/// Check if the question was published within the last day
	pub fn was_published_recently(&self) -> bool {
		self.was_published_recently_at(Utc::now())
	}

	/// Same check against an explicit reference instant
	///
	/// The window is `(now - 1 day, now]`: a question published exactly one
	/// day ago no longer counts, and future questions never do.
	pub fn was_published_recently_at(&self, now: DateTime<Utc>) -> bool {
		let one_day_ago = now - Duration::days(1);
		self.pub_date > one_day_ago && self.pub_date <= now
	}

	pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
		self.pub_date <= now
	}
}

/// Choice model representing an answer option for a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
	pub id: i64,
	pub question_id: i64,
	pub choice_text: String,
	pub votes: i64,
}
