// File: src/url.rs
// Purpose: URL generation collaborator and a route-table backed implementation

use std::collections::HashMap;

use crate::context::{RequestContext, RouteValues};

/// True for application-relative urls: `/path` (but not `//host` or `/\host`)
/// and `~/path`.
pub fn is_local_url(url: &str) -> bool {
    let bytes = url.as_bytes();
    match bytes {
        [] => false,
        [b'/'] => true,
        [b'/', b'/' | b'\\', ..] => false,
        [b'/', ..] => true,
        [b'~', b'/'] => true,
        [b'~', b'/', b'/' | b'\\', ..] => false,
        [b'~', b'/', ..] => true,
        _ => false,
    }
}

/// Resolve a leading `~/` against the request's path base.
pub fn content_url(request: &RequestContext, url: &str) -> String {
    match url.strip_prefix("~/") {
        Some(rest) => {
            let base = request.path_base.trim_end_matches('/');
            format!("{}/{}", base, rest)
        }
        None => url.to_string(),
    }
}

/// Generates urls for routes and actions. `None` means nothing matched.
pub trait UrlHelper: Send + Sync {
    fn route_url(
        &self,
        request: &RequestContext,
        route_name: Option<&str>,
        values: &RouteValues,
    ) -> Option<String>;

    fn action_url(
        &self,
        request: &RequestContext,
        action: Option<&str>,
        controller: Option<&str>,
        values: &RouteValues,
    ) -> Option<String>;

    fn is_local_url(&self, url: &str) -> bool {
        is_local_url(url)
    }

    fn content(&self, request: &RequestContext, url: &str) -> String {
        content_url(request, url)
    }
}

/// Url generation over `/items/:id` style patterns.
///
/// Named routes are looked up by name; actions by `controller/action`.
/// Values not consumed by a `:param` segment become the query string.
#[derive(Debug, Clone, Default)]
pub struct RouteTableUrlHelper {
    named: HashMap<String, String>,
    actions: HashMap<String, String>,
    default_route: Option<String>,
}

impl RouteTableUrlHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.named.insert(name.into(), pattern.into());
        self
    }

    /// Route used when no route name is given
    pub fn default_route(mut self, pattern: impl Into<String>) -> Self {
        self.default_route = Some(pattern.into());
        self
    }

    pub fn action(
        mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        self.actions
            .insert(action_key(&controller.into(), &action.into()), pattern.into());
        self
    }

    fn expand(pattern: &str, path_base: &str, values: &RouteValues) -> Option<String> {
        let mut used = Vec::new();
        let mut segments = Vec::new();

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix(':') {
                Some(param) => {
                    let value = values.get(param).filter(|v| !v.is_empty())?;
                    used.push(param);
                    segments.push(urlencoding::encode(value).into_owned());
                }
                None => segments.push(segment.to_string()),
            }
        }

        let mut url = format!("{}/{}", path_base.trim_end_matches('/'), segments.join("/"));

        let query: Vec<String> = values
            .iter()
            .filter(|(key, _)| !used.contains(&key.as_str()))
            .filter(|(key, _)| key.as_str() != "controller" && key.as_str() != "action")
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Some(url)
    }
}

fn action_key(controller: &str, action: &str) -> String {
    format!("{}/{}", controller.to_ascii_lowercase(), action.to_ascii_lowercase())
}

impl UrlHelper for RouteTableUrlHelper {
    fn route_url(
        &self,
        request: &RequestContext,
        route_name: Option<&str>,
        values: &RouteValues,
    ) -> Option<String> {
        let pattern = match route_name {
            Some(name) => self.named.get(name)?,
            None => self.default_route.as_ref()?,
        };
        Self::expand(pattern, &request.path_base, values)
    }

    fn action_url(
        &self,
        request: &RequestContext,
        action: Option<&str>,
        controller: Option<&str>,
        values: &RouteValues,
    ) -> Option<String> {
        // Ambient values fill in whatever the caller left out
        let action = action.or_else(|| request.route_values.get("action").map(String::as_str))?;
        let controller =
            controller.or_else(|| request.route_values.get("controller").map(String::as_str))?;
        let pattern = self.actions.get(&action_key(controller, action))?;
        Self::expand(pattern, &request.path_base, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use rstest::rstest;

    #[rstest]
    #[case("/", true)]
    #[case("/items/1", true)]
    #[case("~/items", true)]
    #[case("~/", true)]
    #[case("//evil.example", false)]
    #[case("/\\evil.example", false)]
    #[case("~//evil.example", false)]
    #[case("https://example.com", false)]
    #[case("items", false)]
    #[case("", false)]
    fn test_is_local_url(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_local_url(url), expected);
    }

    #[test]
    fn test_content_url_uses_path_base() {
        let request = RequestContext::new(Method::GET, "/").with_path_base("/app");
        assert_eq!(content_url(&request, "~/login"), "/app/login");
        assert_eq!(content_url(&request, "/login"), "/login");

        let root = RequestContext::new(Method::GET, "/");
        assert_eq!(content_url(&root, "~/login"), "/login");
    }

    fn values(pairs: &[(&str, &str)]) -> RouteValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_named_route_expansion() {
        let helper = RouteTableUrlHelper::new().route("item", "/items/:id");
        let request = RequestContext::new(Method::GET, "/");

        let url = helper.route_url(&request, Some("item"), &values(&[("id", "7"), ("tab", "a b")]));
        assert_eq!(url.as_deref(), Some("/items/7?tab=a%20b"));

        assert_eq!(helper.route_url(&request, Some("item"), &values(&[])), None);
        assert_eq!(helper.route_url(&request, Some("missing"), &values(&[])), None);
        assert_eq!(helper.route_url(&request, None, &values(&[])), None);
    }

    #[test]
    fn test_action_uses_ambient_values() {
        let helper = RouteTableUrlHelper::new().action("Items", "Show", "/items/:id");
        let request = RequestContext::new(Method::GET, "/items")
            .with_path_base("/shop")
            .with_route_value("controller", "items");

        let url = helper.action_url(&request, Some("show"), None, &values(&[("id", "3")]));
        assert_eq!(url.as_deref(), Some("/shop/items/3"));

        assert_eq!(helper.action_url(&request, None, None, &values(&[])), None);
    }
}
