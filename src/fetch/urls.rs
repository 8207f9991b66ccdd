// src/fetch/urls.rs
//! Statsguru page catalogue: the fixed set of statistics categories and the
//! URL for each (player, category, format class) combination.

pub const BASE: &str = "https://stats.espncricinfo.com/ci/engine/player";

/// Format classes swept per category: Tests, ODIs, T20Is.
pub const FORMAT_CLASSES: &[u32] = &[1, 2, 3];

/// One page to fetch, tagged with the category it belongs to.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub category: &'static str,
}

#[derive(Debug)]
pub struct Category {
    /// File/sheet name stem; unique across the catalogue.
    pub label: &'static str,
    pub stat_type: &'static str,
    pub view: Option<&'static str>,
}

pub static CATEGORIES: &[Category] = &[
    Category {
        label: "batting",
        stat_type: "batting",
        view: Some("results"),
    },
    Category {
        label: "bowling",
        stat_type: "bowling",
        view: Some("results"),
    },
    Category {
        label: "fielding",
        stat_type: "fielding",
        view: Some("results"),
    },
    Category {
        label: "dismissals",
        stat_type: "fielding",
        view: Some("dismissal_summary"),
    },
    Category {
        label: "allround",
        stat_type: "allround",
        view: Some("results"),
    },
];

impl Category {
    /// One request per format class, in catalogue order.
    pub fn page_requests(&self, player_id: u32) -> Vec<PageRequest> {
        FORMAT_CLASSES
            .iter()
            .map(|class| PageRequest {
                url: self.page_url(player_id, Some(*class)),
                category: self.label,
            })
            .collect()
    }

    /// Statsguru separates query parameters with semicolons and expects
    /// `class` first when present.
    pub fn page_url(&self, player_id: u32, class: Option<u32>) -> String {
        let mut params = Vec::new();
        if let Some(class) = class {
            params.push(format!("class={class}"));
        }
        params.push("template=results".to_string());
        params.push(format!("type={}", self.stat_type));
        if let Some(view) = self.view {
            params.push(format!("view={view}"));
        }
        format!("{BASE}/{player_id}.html?{}", params.join(";"))
    }
}
