use axum::http::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{id}` placeholder, digits only.
    Numeric,
    /// Any other placeholder, one non-empty segment.
    Any,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some("id") => Segment::Numeric,
            Some(_) => Segment::Any,
            None => Segment::Literal(raw.to_string()),
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(expected) => expected == segment,
            Segment::Numeric => {
                !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
            }
            Segment::Any => !segment.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
struct RouteRule {
    method: Method,
    segments: Vec<Segment>,
    code: &'static str,
}

impl RouteRule {
    fn parse(method: Method, pattern: &'static str, code: &'static str) -> Self {
        let segments = pattern
            .trim_start_matches('/')
            .split('/')
            .map(Segment::parse)
            .collect();
        Self {
            method,
            segments,
            code,
        }
    }

    fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    fn matches(&self, segments: &[&str]) -> bool {
        self.segments.len() == segments.len()
            && self
                .segments
                .iter()
                .zip(segments)
                .all(|(rule, actual)| rule.matches(actual))
    }
}

/// Ordered mapping from (method, path pattern) to the permission code that
/// guards it. Lookup runs two passes: fully literal patterns first, then
/// placeholder patterns in declaration order. A path with no entry needs no
/// permission.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, pattern: &'static str, code: &'static str) -> Self {
        self.rules.push(RouteRule::parse(method, pattern, code));
        self
    }

    /// The guarded admin surface: every management endpoint and the code a
    /// caller must hold to reach it.
    pub fn standard() -> Self {
        Self::new()
            .route(Method::GET, "api/users", "user:list")
            .route(Method::POST, "api/users", "user:create")
            .route(Method::GET, "api/users/{id}", "user:detail")
            .route(Method::PUT, "api/users/{id}", "user:update")
            .route(Method::DELETE, "api/users/{id}", "user:delete")
            .route(Method::GET, "api/users/{id}/roles", "user:list-roles")
            .route(Method::PUT, "api/users/{id}/roles", "user:assign-roles")
            .route(Method::PUT, "api/users/{id}/status", "user:update-status")
            .route(Method::PUT, "api/users/{id}/password", "user:reset-password")
            .route(Method::GET, "api/roles", "role:list")
            .route(Method::POST, "api/roles", "role:create")
            .route(Method::GET, "api/roles/{id}", "role:detail")
            .route(Method::PUT, "api/roles/{id}", "role:update")
            .route(Method::DELETE, "api/roles/{id}", "role:delete")
            .route(Method::GET, "api/roles/{id}/permissions", "role:list-permissions")
            .route(Method::PUT, "api/roles/{id}/permissions", "role:assign-permissions")
            .route(Method::GET, "api/roles/{id}/menus", "role:list-menus")
            .route(Method::PUT, "api/roles/{id}/menus", "role:assign-menus")
            .route(Method::GET, "api/roles/{id}/users", "role:list-users")
            .route(Method::GET, "api/menus", "menu:list")
            .route(Method::POST, "api/menus", "menu:create")
            .route(Method::GET, "api/menus/tree", "menu:tree")
            .route(Method::GET, "api/menus/{id}", "menu:detail")
            .route(Method::PUT, "api/menus/{id}", "menu:update")
            .route(Method::DELETE, "api/menus/{id}", "menu:delete")
            .route(Method::GET, "api/permissions", "permission:list")
            .route(Method::POST, "api/permissions", "permission:create")
            .route(Method::GET, "api/permissions/group", "permission:group")
            .route(Method::GET, "api/permissions/{id}", "permission:detail")
            .route(Method::PUT, "api/permissions/{id}", "permission:update")
            .route(Method::DELETE, "api/permissions/{id}", "permission:delete")
    }

    pub fn required_permission(&self, method: &Method, path: &str) -> Option<&'static str> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        for rule in &self.rules {
            if rule.method == *method && rule.is_literal() && rule.matches(&segments) {
                return Some(rule.code);
            }
        }
        for rule in &self.rules {
            if rule.method == *method && !rule.is_literal() && rule.matches(&segments) {
                return Some(rule.code);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_collection_and_item_routes() {
        let table = RouteTable::standard();

        assert_eq!(
            table.required_permission(&Method::GET, "/api/users"),
            Some("user:list")
        );
        assert_eq!(
            table.required_permission(&Method::POST, "/api/users"),
            Some("user:create")
        );
        assert_eq!(
            table.required_permission(&Method::PUT, "/api/users/42/password"),
            Some("user:reset-password")
        );
        assert_eq!(
            table.required_permission(&Method::DELETE, "/api/roles/9"),
            Some("role:delete")
        );
    }

    #[test]
    fn id_placeholder_only_accepts_digits() {
        let table = RouteTable::standard();

        assert_eq!(
            table.required_permission(&Method::GET, "/api/users/123"),
            Some("user:detail")
        );
        assert_eq!(table.required_permission(&Method::GET, "/api/users/abc"), None);
        assert_eq!(table.required_permission(&Method::GET, "/api/users/12a"), None);
    }

    #[test]
    fn literal_segments_beat_placeholders_regardless_of_order() {
        let table = RouteTable::new()
            .route(Method::GET, "api/things/{name}", "thing:detail")
            .route(Method::GET, "api/things/special", "thing:special");

        assert_eq!(
            table.required_permission(&Method::GET, "/api/things/special"),
            Some("thing:special")
        );
        assert_eq!(
            table.required_permission(&Method::GET, "/api/things/other"),
            Some("thing:detail")
        );
    }

    #[test]
    fn first_declared_placeholder_wins_ties() {
        let table = RouteTable::new()
            .route(Method::GET, "api/{a}/x", "first")
            .route(Method::GET, "api/{b}/x", "second");

        assert_eq!(
            table.required_permission(&Method::GET, "/api/anything/x"),
            Some("first")
        );
    }

    #[test]
    fn unlisted_routes_need_no_permission() {
        let table = RouteTable::standard();

        assert_eq!(table.required_permission(&Method::GET, "/api/auth/info"), None);
        assert_eq!(table.required_permission(&Method::POST, "/api/auth/login"), None);
        assert_eq!(table.required_permission(&Method::PATCH, "/api/users"), None);
    }

    #[test]
    fn method_is_part_of_the_key() {
        let table = RouteTable::standard();

        assert_eq!(
            table.required_permission(&Method::GET, "/api/menus/tree"),
            Some("menu:tree")
        );
        assert_eq!(table.required_permission(&Method::DELETE, "/api/menus/tree"), None);
    }
}
