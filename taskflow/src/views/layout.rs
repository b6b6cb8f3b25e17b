//! Dashboard pane layout
//!
//! One pane per project. The grid layout follows the pane count unless the
//! user picked one explicitly. Pane order can be rearranged by dragging;
//! that order lives only in memory.

use crate::backend::Project;
use crate::config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneLayout {
    Single,
    Split,
    Grid,
}

impl PaneLayout {
    /// 1 pane (or none) is single, 2 are split, 3 or more a grid
    pub fn for_pane_count(count: usize) -> Self {
        match count {
            0 | 1 => PaneLayout::Single,
            2 => PaneLayout::Split,
            _ => PaneLayout::Grid,
        }
    }

    /// CSS `grid-template-columns` value
    pub fn grid_template(&self) -> &'static str {
        match self {
            PaneLayout::Single => config::SINGLE_TEMPLATE,
            PaneLayout::Split => config::SPLIT_TEMPLATE,
            PaneLayout::Grid => config::GRID_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pane {
    pub project_id: String,
    pub title: String,
}

impl From<&Project> for Pane {
    fn from(project: &Project) -> Self {
        Self {
            project_id: project.id.clone(),
            title: project.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    panes: Vec<Pane>,
    layout_override: Option<PaneLayout>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: &[Project]) -> Self {
        let mut dashboard = Self::new();
        dashboard.sync_projects(projects);
        dashboard
    }

    /// Bring panes in line with a freshly fetched project list. Panes that
    /// still exist keep their current position, new projects are appended,
    /// vanished ones are dropped.
    pub fn sync_projects(&mut self, projects: &[Project]) {
        self.panes
            .retain(|pane| projects.iter().any(|p| p.id == pane.project_id));

        for pane in &mut self.panes {
            if let Some(project) = projects.iter().find(|p| p.id == pane.project_id) {
                pane.title = project.name.clone();
            }
        }

        for project in projects {
            if !self.panes.iter().any(|pane| pane.project_id == project.id) {
                self.panes.push(Pane::from(project));
            }
        }
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    /// Effective layout: the manual choice if any, else by pane count
    pub fn layout(&self) -> PaneLayout {
        self.layout_override
            .unwrap_or_else(|| PaneLayout::for_pane_count(self.panes.len()))
    }

    pub fn layout_override(&self) -> Option<PaneLayout> {
        self.layout_override
    }

    /// Pin a layout, or `None` to go back to automatic selection
    pub fn set_layout_override(&mut self, layout: Option<PaneLayout>) {
        self.layout_override = layout;
    }

    pub fn grid_template(&self) -> &'static str {
        self.layout().grid_template()
    }

    /// Move the pane at `from` to position `to`. Returns false when either
    /// index is out of range.
    pub fn move_pane(&mut self, from: usize, to: usize) -> bool {
        if from >= self.panes.len() || to >= self.panes.len() {
            return false;
        }
        let pane = self.panes.remove(from);
        self.panes.insert(to, pane);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {}", id),
            description: None,
            owner_id: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn ids(dashboard: &Dashboard) -> Vec<&str> {
        dashboard
            .panes()
            .iter()
            .map(|p| p.project_id.as_str())
            .collect()
    }

    #[test]
    fn test_layout_by_pane_count() {
        assert_eq!(PaneLayout::for_pane_count(1), PaneLayout::Single);
        assert_eq!(PaneLayout::for_pane_count(2), PaneLayout::Split);
        assert_eq!(PaneLayout::for_pane_count(3), PaneLayout::Grid);
        assert_eq!(PaneLayout::for_pane_count(12), PaneLayout::Grid);
        assert_eq!(PaneLayout::for_pane_count(0), PaneLayout::Single);
    }

    #[test]
    fn test_override_wins_until_cleared() {
        let mut dashboard = Dashboard::from_projects(&[project("a"), project("b"), project("c")]);
        assert_eq!(dashboard.layout(), PaneLayout::Grid);

        dashboard.set_layout_override(Some(PaneLayout::Single));
        assert_eq!(dashboard.layout(), PaneLayout::Single);
        assert_eq!(dashboard.grid_template(), "1fr");

        dashboard.set_layout_override(None);
        assert_eq!(dashboard.layout(), PaneLayout::Grid);
        assert!(dashboard.grid_template().contains("350px"));
    }

    #[test]
    fn test_move_pane() {
        let mut dashboard = Dashboard::from_projects(&[project("a"), project("b"), project("c")]);

        assert!(dashboard.move_pane(0, 2));
        assert_eq!(ids(&dashboard), vec!["b", "c", "a"]);

        assert!(dashboard.move_pane(2, 0));
        assert_eq!(ids(&dashboard), vec!["a", "b", "c"]);

        assert!(!dashboard.move_pane(3, 0));
        assert_eq!(ids(&dashboard), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sync_keeps_manual_order() {
        let mut dashboard = Dashboard::from_projects(&[project("a"), project("b")]);
        dashboard.move_pane(1, 0);

        let mut renamed = project("a");
        renamed.name = "Renamed".to_string();
        dashboard.sync_projects(&[project("c"), renamed, project("b")]);

        assert_eq!(ids(&dashboard), vec!["b", "a", "c"]);
        assert_eq!(dashboard.panes()[1].title, "Renamed");
        assert_eq!(dashboard.layout(), PaneLayout::Grid);

        dashboard.sync_projects(&[project("c")]);
        assert_eq!(ids(&dashboard), vec!["c"]);
        assert_eq!(dashboard.layout(), PaneLayout::Single);
    }
}
