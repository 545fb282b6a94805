//! URL routing with named, namespaced routes
//!
//! Routes are declared with [`path`] and grouped into a [`Router`]. A router
//! with a namespace can be mounted under a prefix, after which its routes are
//! reversible as `"namespace:name"`:
//!
//! ```
//! use polls_site::urls::{Router, path};
//! use polls_site::http::Response;
//!
//! let polls = Router::new()
//!     .with_namespace("polls")
//!     .route(path("", "index", |_state, _req| async { Ok::<_, polls_site::Error>(Response::ok()) }))
//!     .route(path("{question_id}/", "detail", |_state, _req| async { Ok::<_, polls_site::Error>(Response::ok()) }));
//!
//! let root = Router::new().mount("/polls/", polls);
//! let resolver = root.resolver();
//!
//! assert_eq!(resolver.reverse("polls:index", &[]).unwrap(), "/polls/");
//! assert_eq!(
//!     resolver.reverse("polls:detail", &[("question_id", "3")]).unwrap(),
//!     "/polls/3/"
//! );
//! ```

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::Result;
use crate::http::{Request, Response};

/// A view callable stored in the routing table
pub type View =
	Arc<dyn Fn(Arc<AppState>, Request) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

/// Errors raised by reverse URL lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReverseError {
	#[error("No route named '{0}'")]
	NotFound(String),

	#[error("Route '{name}' requires parameter '{param}'")]
	MissingParameter { name: String, param: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

fn parse_segments(pattern: &str) -> Vec<Segment> {
	pattern
		.split('/')
		.filter(|s| !s.is_empty())
		.map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
			Some(param) => Segment::Param(param.to_string()),
			None => Segment::Literal(s.to_string()),
		})
		.collect()
}

/// A single URL pattern bound to a view
#[derive(Clone)]
pub struct Route {
	pattern: String,
	name: Option<String>,
	segments: Vec<Segment>,
	view: View,
}

impl Route {
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn view(&self) -> View {
		self.view.clone()
	}

	fn with_prefix(mut self, prefix: &str, namespace: Option<&str>) -> Self {
		let pattern = format!(
			"{}/{}",
			prefix.trim_end_matches('/'),
			self.pattern.trim_start_matches('/')
		);
		self.segments = parse_segments(&pattern);
		self.pattern = pattern;
		if let (Some(ns), Some(name)) = (namespace, self.name.as_ref()) {
			self.name = Some(format!("{}:{}", ns, name));
		}
		self
	}

	/// Match a request path, returning the captured parameters
	fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		if parts.len() != self.segments.len() {
			return None;
		}

		let mut params = HashMap::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(literal) if literal == part => {}
				Segment::Literal(_) => return None,
				Segment::Param(name) => {
					params.insert(name.clone(), part.to_string());
				}
			}
		}
		Some(params)
	}
}

/// Declare a named route, the counterpart of a URLconf `path()` entry
pub fn path<F, Fut>(pattern: &str, name: &str, view: F) -> Route
where
	F: Fn(Arc<AppState>, Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	let boxed: View = Arc::new(
		move |state: Arc<AppState>, request: Request| -> BoxFuture<'static, Result<Response>> {
			Box::pin(view(state, request))
		},
	);
	Route {
		pattern: pattern.to_string(),
		name: Some(name.to_string()),
		segments: parse_segments(pattern),
		view: boxed,
	}
}

/// Ordered routing table; the first matching route wins
#[derive(Clone, Default)]
pub struct Router {
	namespace: Option<String>,
	routes: Vec<Route>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn route(mut self, route: Route) -> Self {
		self.routes.push(route);
		self
	}

	/// Mount another router's routes under `prefix`
	pub fn mount(mut self, prefix: &str, router: Router) -> Self {
		let namespace = router.namespace;
		self.routes.extend(
			router
				.routes
				.into_iter()
				.map(|route| route.with_prefix(prefix, namespace.as_deref())),
		);
		self
	}

	/// Find the route for `path` along with its captured parameters
	pub fn resolve(&self, path: &str) -> Option<(&Route, HashMap<String, String>)> {
		self.routes
			.iter()
			.find_map(|route| route.matches(path).map(|params| (route, params)))
	}

	/// Snapshot of the named routes for reverse lookup
	pub fn resolver(&self) -> UrlResolver {
		let mut resolver = UrlResolver::default();
		for route in &self.routes {
			if let Some(name) = &route.name {
				resolver.register(name.clone(), route.pattern.clone());
			}
		}
		resolver
	}
}

/// Reverse lookup from route names to URLs
#[derive(Debug, Clone, Default)]
pub struct UrlResolver {
	patterns: HashMap<String, String>,
}

impl UrlResolver {
	pub fn register(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
		self.patterns.insert(name.into(), pattern.into());
	}

	/// Build the URL for a named route, substituting `{param}` placeholders
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> std::result::Result<String, ReverseError> {
		let pattern = self
			.patterns
			.get(name)
			.ok_or_else(|| ReverseError::NotFound(name.to_string()))?;

		let mut url = String::with_capacity(pattern.len());
		for (i, segment) in pattern.split('/').enumerate() {
			if i > 0 {
				url.push('/');
			}
			match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
				Some(param) => {
					let value = params
						.iter()
						.find(|(key, _)| *key == param)
						.map(|(_, value)| *value)
						.ok_or_else(|| ReverseError::MissingParameter {
							name: name.to_string(),
							param: param.to_string(),
						})?;
					url.push_str(value);
				}
				None => url.push_str(segment),
			}
		}
		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	async fn noop(_state: Arc<AppState>, _request: Request) -> Result<Response> {
		Ok(Response::ok())
	}

	fn polls_router() -> Router {
		Router::new().mount(
			"/polls/",
			Router::new()
				.with_namespace("polls")
				.route(path("", "index", noop))
				.route(path("{question_id}/", "detail", noop))
				.route(path("{question_id}/results/", "results", noop)),
		)
	}

	#[rstest]
	#[case("/polls/", Some("polls:index"))]
	#[case("/polls", Some("polls:index"))]
	#[case("/polls/5/", Some("polls:detail"))]
	#[case("/polls/5/results/", Some("polls:results"))]
	#[case("/polls/5/votes/", None)]
	#[case("/", None)]
	fn test_resolve(#[case] path: &str, #[case] expected: Option<&str>) {
		let router = polls_router();
		let resolved = router.resolve(path).map(|(route, _)| route.name().unwrap().to_string());
		assert_eq!(resolved.as_deref(), expected);
	}

	#[test]
	fn test_resolve_captures_parameters() {
		let router = polls_router();
		let (route, params) = router.resolve("/polls/12/results/").unwrap();
		assert_eq!(route.pattern(), "/polls/{question_id}/results/");
		assert_eq!(params.get("question_id").map(String::as_str), Some("12"));
	}

	#[test]
	fn test_reverse_unknown_name() {
		let resolver = polls_router().resolver();
		assert_eq!(
			resolver.reverse("polls:vote", &[]),
			Err(ReverseError::NotFound("polls:vote".to_string()))
		);
	}

	#[test]
	fn test_reverse_missing_parameter() {
		let resolver = polls_router().resolver();
		assert_eq!(
			resolver.reverse("polls:detail", &[]),
			Err(ReverseError::MissingParameter {
				name: "polls:detail".to_string(),
				param: "question_id".to_string(),
			})
		);
	}

	#[test]
	fn test_reverse_round_trips_through_resolve() {
		let router = polls_router();
		let url = router
			.resolver()
			.reverse("polls:results", &[("question_id", "9")])
			.unwrap();
		let (route, _) = router.resolve(&url).unwrap();
		assert_eq!(route.name(), Some("polls:results"));
	}
}
