//! Declarative route table and the navigation guard.
//!
//! Paths use `:name` segments for parameters. When several routes match,
//! the one with more literal segments wins, then the one declared first.

use std::collections::HashMap;

use log::{debug, info};

pub const APP_TITLE: &str = "惠星伙伴匹配";

const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no route matches '{0}'")]
    NotFound(String),
    #[error("redirect loop starting at '{0}'")]
    RedirectLoop(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: Option<&'static str>,
    pub show_tabbar: bool,
    /// Views hide the nav bar only when this is explicitly off.
    pub show_navbar: bool,
    pub keep_alive: bool,
}

impl RouteMeta {
    /// Full-screen page: titled, no tab bar.
    pub const fn page(title: &'static str) -> Self {
        Self { title: Some(title), show_tabbar: false, show_navbar: true, keep_alive: false }
    }

    /// Tab of the main layout.
    pub const fn tab(title: &'static str, keep_alive: bool, show_navbar: bool) -> Self {
        Self { title: Some(title), show_tabbar: true, show_navbar, keep_alive }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub view: &'static str,
    pub meta: RouteMeta,
}

impl Route {
    pub const fn new(path: &'static str, name: &'static str, view: &'static str, meta: RouteMeta) -> Self {
        Self { path, name, view, meta }
    }

    /// Number of literal segments when the route matches `segments`.
    fn matches(&self, segments: &[&str], params: &mut HashMap<String, String>) -> Option<usize> {
        let pattern: Vec<&str> = split_path(self.path);
        if pattern.len() != segments.len() {
            return None;
        }
        params.clear();
        let mut literal = 0;
        for (expected, actual) in pattern.iter().zip(segments) {
            match expected.strip_prefix(':') {
                Some(name) => {
                    params.insert(name.to_string(), (*actual).to_string());
                }
                None if expected == actual => literal += 1,
                None => return None,
            }
        }
        Some(literal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: Route,
    /// Path after following redirects, without query or fragment.
    pub path: String,
    pub params: HashMap<String, String>,
    pub redirected_from: Option<String>,
}

impl ResolvedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    redirects: Vec<(&'static str, &'static str)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::app()
    }
}

impl RouteTable {
    pub fn new(routes: Vec<Route>, redirects: Vec<(&'static str, &'static str)>) -> Self {
        Self { routes, redirects }
    }

    /// Routes of the partner matching app.
    pub fn app() -> Self {
        let routes = vec![
            Route::new("/layout/home", "LayoutHome", "HomeTabView", RouteMeta::tab("首页", true, true)),
            Route::new("/layout/team", "LayoutTeam", "TeamTabView", RouteMeta::tab("队伍", true, false)),
            Route::new("/layout/publish", "LayoutPublish", "PublishTabView", RouteMeta::tab("发布", false, true)),
            Route::new("/layout/message", "LayoutMessage", "MessageTabView", RouteMeta::tab("消息", true, true)),
            Route::new("/layout/profile", "LayoutProfile", "ProfileTabView", RouteMeta::tab("我的", true, true)),
            Route::new(
                "/login",
                "Login",
                "LoginView",
                RouteMeta { show_navbar: false, ..RouteMeta::page("登录") },
            ),
            Route::new(
                "/register",
                "Register",
                "RegisterView",
                RouteMeta { show_navbar: false, ..RouteMeta::page("注册") },
            ),
            Route::new("/user/:id", "UserProfile", "UserProfileView", RouteMeta::page("用户详情")),
            Route::new("/user/profile", "Profile", "ProfileView", RouteMeta::page("个人中心")),
            Route::new("/settings", "Settings", "SettingsView", RouteMeta::page("设置")),
            Route::new("/search", "Search", "SearchView", RouteMeta::page("搜索")),
            Route::new("/team/detail/:id", "TeamDetail", "TeamDetailView", RouteMeta::page("队伍详情")),
            Route::new("/team/square", "TeamSquare", "TeamSquareView", RouteMeta::page("队伍广场")),
            Route::new("/team/create", "TeamCreate", "TeamCreateView", RouteMeta::page("创建队伍")),
            Route::new("/team/my", "MyTeams", "MyTeamsView", RouteMeta::page("我的队伍")),
            Route::new("/team/search", "TeamSearch", "SearchTeamView", RouteMeta::page("搜索队伍")),
            Route::new("/team/:id", "TeamView", "TeamDetailView", RouteMeta::page("队伍详情")),
            Route::new("/team/invitations", "TeamInvitations", "TeamInvitationsView", RouteMeta::page("队伍邀请")),
            Route::new(
                "/team/applications/received",
                "TeamApplicationsReceived",
                "TeamApplicationsReceivedView",
                RouteMeta::page("队伍审批"),
            ),
            Route::new("/friend/list", "FriendList", "FriendListView", RouteMeta::page("好友列表")),
            Route::new("/friend/request", "FriendRequest", "FriendRequestView", RouteMeta::page("好友申请")),
            Route::new("/friend/add", "FriendAdd", "FriendListView", RouteMeta::page("添加好友")),
            Route::new("/my-applications", "MyApplications", "MyApplicationsView", RouteMeta::page("我的申请")),
            Route::new("/chat/:type/:id", "ChatDetail", "ChatDetailView", RouteMeta::page("聊天详情")),
        ];
        let redirects = vec![("/", "/layout/home"), ("/home", "/layout/home")];
        Self::new(routes, redirects)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute, RouteError> {
        let requested = normalize(path);
        let mut current = requested.clone();
        let mut hops = 0;
        while let Some((_, to)) = self.redirects.iter().find(|(from, _)| *from == current) {
            hops += 1;
            if hops > MAX_REDIRECTS {
                return Err(RouteError::RedirectLoop(requested));
            }
            current = normalize(to);
        }

        let segments = split_path(&current);
        let mut best: Option<(usize, Route, HashMap<String, String>)> = None;
        let mut params = HashMap::new();
        for route in &self.routes {
            if let Some(score) = route.matches(&segments, &mut params) {
                if best.as_ref().map_or(true, |(top, _, _)| score > *top) {
                    best = Some((score, *route, std::mem::take(&mut params)));
                }
            }
        }

        let (_, route, params) = best.ok_or_else(|| RouteError::NotFound(current.clone()))?;
        let redirected_from = (current != requested).then_some(requested);
        Ok(ResolvedRoute { route, path: current, params, redirected_from })
    }
}

fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Tracks the current route and applies the title guard on every navigation.
#[derive(Debug, Clone)]
pub struct Navigator {
    table: RouteTable,
    history: Vec<ResolvedRoute>,
    document_title: String,
}

impl Navigator {
    pub fn new(table: RouteTable) -> Self {
        Self { table, history: Vec::new(), document_title: APP_TITLE.to_string() }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.history.last()
    }

    pub fn document_title(&self) -> &str {
        &self.document_title
    }

    pub fn navigate(&mut self, path: &str) -> Result<&ResolvedRoute, RouteError> {
        let resolved = self.table.resolve(path)?;
        if let Some(from) = &resolved.redirected_from {
            debug!("[ROUTER] {} -> {}", from, resolved.path);
        }
        self.before_each(&resolved);
        info!("[ROUTER] Navigated to {} ({})", resolved.path, resolved.route.name);
        self.history.push(resolved);
        self.history.last().ok_or_else(|| RouteError::NotFound(path.to_string()))
    }

    /// Goes back one entry; the first page stays put.
    pub fn back(&mut self) -> Option<&ResolvedRoute> {
        if self.history.len() > 1 {
            self.history.pop();
            if let Some(previous) = self.history.last().cloned() {
                self.before_each(&previous);
            }
        }
        self.history.last()
    }

    fn before_each(&mut self, to: &ResolvedRoute) {
        if let Some(title) = to.route.meta.title {
            self.document_title = format!("{} - {}", title, APP_TITLE);
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(RouteTable::app())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_home_redirect_to_layout() {
        let table = RouteTable::app();
        for path in ["/", "/home", "", "/home/"] {
            let resolved = table.resolve(path).unwrap();
            assert_eq!(resolved.route.name, "LayoutHome", "{path}");
            assert_eq!(resolved.path, "/layout/home");
        }
        assert_eq!(table.resolve("/home").unwrap().redirected_from.as_deref(), Some("/home"));
        assert!(table.resolve("/layout/home").unwrap().redirected_from.is_none());
    }

    #[test]
    fn literal_segments_beat_params() {
        let table = RouteTable::app();
        assert_eq!(table.resolve("/team/invitations").unwrap().route.name, "TeamInvitations");
        assert_eq!(table.resolve("/user/profile").unwrap().route.name, "Profile");

        let team = table.resolve("/team/42").unwrap();
        assert_eq!(team.route.name, "TeamView");
        assert_eq!(team.param("id"), Some("42"));
    }

    #[test]
    fn duplicate_paths_resolve_to_first_declared() {
        let table = RouteTable::app();
        assert_eq!(table.resolve("/team/create").unwrap().route.name, "TeamCreate");
    }

    #[test]
    fn chat_route_captures_both_params() {
        let resolved = RouteTable::app().resolve("/chat/team/7?from=list").unwrap();
        assert_eq!(resolved.route.name, "ChatDetail");
        assert_eq!(resolved.param("type"), Some("team"));
        assert_eq!(resolved.param("id"), Some("7"));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let err = RouteTable::app().resolve("/nowhere/at/all").unwrap_err();
        assert_eq!(err, RouteError::NotFound("/nowhere/at/all".into()));
    }

    #[test]
    fn redirect_loops_are_reported() {
        let table = RouteTable::new(vec![], vec![("/a", "/b"), ("/b", "/a")]);
        assert_eq!(table.resolve("/a").unwrap_err(), RouteError::RedirectLoop("/a".into()));
    }

    #[test]
    fn guard_sets_document_title() {
        let mut nav = Navigator::default();
        assert_eq!(nav.document_title(), APP_TITLE);

        nav.navigate("/friend/list").unwrap();
        assert_eq!(nav.document_title(), "好友列表 - 惠星伙伴匹配");

        nav.navigate("/").unwrap();
        assert_eq!(nav.document_title(), "首页 - 惠星伙伴匹配");
        assert!(nav.current().unwrap().route.meta.show_tabbar);

        nav.back();
        assert_eq!(nav.current().unwrap().route.name, "FriendList");
        assert_eq!(nav.document_title(), "好友列表 - 惠星伙伴匹配");

        assert!(nav.navigate("/missing").is_err());
        assert_eq!(nav.current().unwrap().route.name, "FriendList");
    }

    #[test]
    fn untitled_route_keeps_previous_title() {
        let untitled = Route::new("/plain", "Plain", "PlainView", RouteMeta { title: None, ..RouteMeta::page("") });
        let titled = Route::new("/x", "X", "XView", RouteMeta::page("X"));
        let mut nav = Navigator::new(RouteTable::new(vec![untitled, titled], vec![]));
        nav.navigate("/x").unwrap();
        nav.navigate("/plain").unwrap();
        assert_eq!(nav.document_title(), "X - 惠星伙伴匹配");
    }
}
