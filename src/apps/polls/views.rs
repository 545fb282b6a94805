use chrono::Utc;
use hyper::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::managers::{ChoiceManager, QuestionManager};
use super::models::Question;
use crate::app::AppState;
use crate::error::Result;
use crate::http::{Request, Response};

pub const NO_CHOICE_MESSAGE: &str = "You didn't select a choice.";

/// Form body posted by the vote page
#[derive(Debug, Deserialize)]
pub struct VoteForm {
	pub choice: Option<i64>,
}

/// Index view - latest published questions
///
/// GET /polls/
pub async fn index(state: Arc<AppState>, _req: Request) -> Result<Response> {
	let latest_question_list = QuestionManager::new(&state.db)
		.published(Utc::now(), state.settings.index_page_size)
		.await?;

	state.templates.render(
		"polls/index.html",
		json!({ "latest_question_list": latest_question_list }),
	)
}

/// Detail view - a question with its vote form
///
/// GET /polls/{question_id}/
pub async fn detail(state: Arc<AppState>, req: Request) -> Result<Response> {
	let question_id: i64 = req.path_param("question_id")?;
	let question = QuestionManager::new(&state.db)
		.get_published(question_id, Utc::now())
		.await?;
	render_detail(&state, question, None).await
}

/// Results view - vote counts for a question
///
/// GET /polls/{question_id}/results/
pub async fn results(state: Arc<AppState>, req: Request) -> Result<Response> {
	let question_id: i64 = req.path_param("question_id")?;
	let question = QuestionManager::new(&state.db)
		.get_published(question_id, Utc::now())
		.await?;
	let choices = ChoiceManager::new(&state.db).for_question(question.id).await?;

	state.templates.render(
		"polls/results.html",
		json!({ "question": question, "choices": choices }),
	)
}

/// Vote view - record a vote and redirect to the results
///
/// POST /polls/{question_id}/vote/
pub async fn vote(state: Arc<AppState>, req: Request) -> Result<Response> {
	if req.method != Method::POST {
		return Ok(Response::method_not_allowed().with_header("allow", "POST"));
	}
	let question_id: i64 = req.path_param("question_id")?;
	let question = QuestionManager::new(&state.db)
		.get_published(question_id, Utc::now())
		.await?;

	// A malformed form is treated like an empty one
	let choice_id = req.form::<VoteForm>().ok().and_then(|form| form.choice);
	let voted = match choice_id {
		Some(choice_id) => ChoiceManager::new(&state.db)
			.vote(question.id, choice_id)
			.await?
			.is_some(),
		None => false,
	};

	if !voted {
		tracing::debug!(question_id, ?choice_id, "vote without a valid choice");
		return render_detail(&state, question, Some(NO_CHOICE_MESSAGE)).await;
	}

	let id = question.id.to_string();
	let location = state
		.urls
		.reverse("polls:results", &[("question_id", id.as_str())])?;
	Ok(Response::temporary_redirect(location))
}

async fn render_detail(
	state: &AppState,
	question: Question,
	error_message: Option<&str>,
) -> Result<Response> {
	let choices = ChoiceManager::new(&state.db).for_question(question.id).await?;
	state.templates.render(
		"polls/detail.html",
		json!({
			"question": question,
			"choices": choices,
			"error_message": error_message,
		}),
	)
}
