#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabBarItem {
    pub name: &'static str,
    pub route_name: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

pub const TABBAR: [TabBarItem; 5] = [
    TabBarItem { name: "home", route_name: "LayoutHome", icon: "wap-home-o", label: "首页" },
    TabBarItem { name: "team", route_name: "LayoutTeam", icon: "friends-o", label: "队伍" },
    TabBarItem { name: "publish", route_name: "LayoutPublish", icon: "add-o", label: "发布" },
    TabBarItem { name: "message", route_name: "LayoutMessage", icon: "chat-o", label: "消息" },
    TabBarItem { name: "profile", route_name: "LayoutProfile", icon: "user-o", label: "我的" },
];

/// Index of the tab for `route_name`; the first tab when none matches.
pub fn active_tab_index(route_name: &str) -> usize {
    TABBAR.iter().position(|tab| tab.route_name == route_name).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::router::RouteTable;

    #[test]
    fn index_by_route_name() {
        assert_eq!(active_tab_index("LayoutMessage"), 3);
        assert_eq!(active_tab_index("LayoutProfile"), 4);
        assert_eq!(active_tab_index("ChatDetail"), 0);
    }

    #[test]
    fn every_tab_has_a_route() {
        let table = RouteTable::app();
        for tab in TABBAR {
            let route = table.by_name(tab.route_name).unwrap();
            assert!(route.meta.show_tabbar, "{}", tab.name);
        }
    }
}
