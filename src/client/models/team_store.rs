use crate::common::models::{TeamId, TeamInfo, TeamPatch};

/// Teams of the logged-in user, the browsed listing and the team being viewed.
#[derive(Debug, Clone, Default)]
pub struct TeamStore {
    my_teams: Vec<TeamInfo>,
    current_team: Option<TeamInfo>,
    team_list: Vec<TeamInfo>,
}

impl TeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn my_teams(&self) -> &[TeamInfo] {
        &self.my_teams
    }

    pub fn current_team(&self) -> Option<&TeamInfo> {
        self.current_team.as_ref()
    }

    pub fn team_list(&self) -> &[TeamInfo] {
        &self.team_list
    }

    pub fn set_my_teams(&mut self, teams: Vec<TeamInfo>) {
        self.my_teams = teams;
    }

    pub fn set_current_team(&mut self, team: Option<TeamInfo>) {
        self.current_team = team;
    }

    pub fn set_team_list(&mut self, teams: Vec<TeamInfo>) {
        self.team_list = teams;
    }

    pub fn add_team(&mut self, team: TeamInfo) {
        self.my_teams.push(team);
    }

    /// Merges `patch` into the matching entry of `my_teams` and into the
    /// current team when its id matches. Unknown ids are ignored.
    pub fn update_team(&mut self, team_id: TeamId, patch: &TeamPatch) {
        if let Some(team) = self.my_teams.iter_mut().find(|t| t.id == team_id) {
            team.apply(patch);
        }
        if let Some(current) = self.current_team.as_mut().filter(|t| t.id == team_id) {
            current.apply(patch);
        }
    }

    pub fn remove_team(&mut self, team_id: TeamId) {
        self.my_teams.retain(|t| t.id != team_id);
        if self.current_team.as_ref().is_some_and(|t| t.id == team_id) {
            self.current_team = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: TeamId, status: i32) -> TeamInfo {
        TeamInfo { id, name: format!("team-{}", id), max_num: 5, status, ..TeamInfo::default() }
    }

    #[test]
    fn update_touches_list_and_current() {
        let mut store = TeamStore::new();
        store.set_my_teams(vec![team(41, 0), team(42, 0)]);
        store.set_current_team(Some(team(42, 0)));

        store.update_team(42, &TeamPatch { status: Some(2), ..TeamPatch::default() });
        assert_eq!(store.my_teams()[1].status, 2);
        assert_eq!(store.my_teams()[0].status, 0);
        assert_eq!(store.current_team().unwrap().status, 2);
    }

    #[test]
    fn update_of_missing_team_is_noop() {
        let mut store = TeamStore::new();
        store.set_my_teams(vec![team(1, 0)]);
        let before = store.my_teams().to_vec();
        store.update_team(42, &TeamPatch { status: Some(2), ..TeamPatch::default() });
        assert_eq!(store.my_teams(), before.as_slice());
        assert!(store.current_team().is_none());
    }

    #[test]
    fn remove_clears_current_pointer() {
        let mut store = TeamStore::new();
        store.add_team(team(1, 0));
        store.add_team(team(2, 0));
        store.set_current_team(Some(team(2, 0)));

        store.remove_team(1);
        assert!(store.current_team().is_some());
        store.remove_team(2);
        assert!(store.my_teams().is_empty());
        assert!(store.current_team().is_none());
    }
}
