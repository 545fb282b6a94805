use crate::urls::{Router, path};

use super::views;

pub fn url_patterns() -> Router {
	Router::new()
		.with_namespace("polls")
		.route(path("", "index", views::index))
		.route(path("{question_id}/", "detail", views::detail))
		.route(path("{question_id}/results/", "results", views::results))
		.route(path("{question_id}/vote/", "vote", views::vote))
}
