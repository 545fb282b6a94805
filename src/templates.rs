//! Template rendering backed by tera
//!
//! Templates are compiled into the binary. Besides the standard tera
//! functions, templates can call `url(name=..., <param>=...)` to reverse a
//! named route, so markup never hardcodes paths.

use std::collections::HashMap;
use std::sync::Arc;
use tera::{Context, Tera, Value};

use crate::error::Result;
use crate::http::Response;
use crate::urls::UrlResolver;

const TEMPLATES: &[(&str, &str)] = &[
	("polls/base.html", include_str!("../templates/polls/base.html")),
	("polls/index.html", include_str!("../templates/polls/index.html")),
	("polls/detail.html", include_str!("../templates/polls/detail.html")),
	("polls/results.html", include_str!("../templates/polls/results.html")),
];

/// Compiled template set
pub struct Templates {
	tera: Tera,
}

impl Templates {
	pub fn new(resolver: Arc<UrlResolver>) -> Result<Self> {
		let mut tera = Tera::default();
		tera.add_raw_templates(TEMPLATES.iter().copied())?;
		tera.register_function("url", UrlFunction { resolver });
		Ok(Self { tera })
	}

	/// Render `template_name` into a string
	pub fn render_to_string(&self, template_name: &str, context: &serde_json::Value) -> Result<String> {
		let context = Context::from_serialize(context)?;
		Ok(self.tera.render(template_name, &context)?)
	}

	/// Render a template into an HTML response, keeping the context on it
	pub fn render(&self, template_name: &str, context: serde_json::Value) -> Result<Response> {
		let html = self.render_to_string(template_name, &context)?;
		tracing::debug!(template = template_name, bytes = html.len(), "template rendered");
		Ok(Response::ok()
			.with_header("content-type", "text/html; charset=utf-8")
			.with_body(html)
			.with_context(context))
	}
}

/// The `url()` template function
struct UrlFunction {
	resolver: Arc<UrlResolver>,
}

impl tera::Function for UrlFunction {
	fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
		let name = args
			.get("name")
			.and_then(Value::as_str)
			.ok_or_else(|| tera::Error::msg("url() requires a string `name` argument"))?;

		let params: Vec<(&str, String)> = args
			.iter()
			.filter(|(key, _)| key.as_str() != "name")
			.map(|(key, value)| {
				let value = match value {
					Value::String(s) => s.clone(),
					other => other.to_string(),
				};
				(key.as_str(), value)
			})
			.collect();
		let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

		self.resolver
			.reverse(name, &params)
			.map(Value::String)
			.map_err(|e| tera::Error::msg(e.to_string()))
	}

	fn is_safe(&self) -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn templates() -> Templates {
		let mut resolver = UrlResolver::default();
		resolver.register("polls:index", "/polls/");
		resolver.register("polls:detail", "/polls/{question_id}/");
		resolver.register("polls:results", "/polls/{question_id}/results/");
		resolver.register("polls:vote", "/polls/{question_id}/vote/");
		Templates::new(Arc::new(resolver)).unwrap()
	}

	#[test]
	fn test_index_empty_state() {
		let html = templates()
			.render_to_string("polls/index.html", &json!({ "latest_question_list": [] }))
			.unwrap();
		assert!(html.contains("No polls are available."));
		assert!(!html.contains("<ul>"));
	}

	#[test]
	fn test_index_links_questions_by_reverse_url() {
		let html = templates()
			.render_to_string(
				"polls/index.html",
				&json!({
					"latest_question_list": [
						{ "id": 4, "question_text": "What's up?", "pub_date": "2024-01-01T00:00:00Z" }
					]
				}),
			)
			.unwrap();
		assert!(html.contains(r#"<a href="/polls/4/">"#));
		assert!(!html.contains("No polls are available."));
	}

	#[test]
	fn test_question_text_is_escaped() {
		let html = templates()
			.render_to_string(
				"polls/index.html",
				&json!({
					"latest_question_list": [
						{ "id": 1, "question_text": "<script>", "pub_date": "2024-01-01T00:00:00Z" }
					]
				}),
			)
			.unwrap();
		assert!(html.contains("&lt;script&gt;"));
	}

	#[test]
	fn test_render_keeps_context() {
		let context = json!({ "latest_question_list": [] });
		let response = templates().render("polls/index.html", context.clone()).unwrap();
		assert_eq!(response.context, Some(context));
		assert_eq!(
			response.headers.get("content-type").unwrap(),
			"text/html; charset=utf-8"
		);
	}

	#[test]
	fn test_unknown_route_in_template_is_an_error() {
		let mut resolver = UrlResolver::default();
		resolver.register("polls:index", "/polls/");
		let templates = Templates::new(Arc::new(resolver)).unwrap();
		let result = templates.render_to_string(
			"polls/index.html",
			&json!({
				"latest_question_list": [
					{ "id": 1, "question_text": "Q", "pub_date": "2024-01-01T00:00:00Z" }
				]
			}),
		);
		assert!(result.is_err());
	}
}
