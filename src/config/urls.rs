//! Root URL configuration
//!
//! The `routes` function defines all URL patterns for this project.

use crate::urls::Router;

pub fn routes() -> Router {
	Router::new().mount("/polls/", crate::apps::polls::urls::url_patterns())
}
