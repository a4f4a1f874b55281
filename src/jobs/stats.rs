use crate::job_store::{GroupCount, GroupValue};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub status_stats: Vec<StatusCount>,
    pub monthly_stats: Vec<MonthlyCount>,
}

impl JobStats {
    /// Shapes aggregate results. Groups keyed differently than expected are
    /// ignored.
    pub fn from_groups(status_groups: Vec<GroupCount>, monthly_groups: Vec<GroupCount>) -> Self {
        let status_stats = status_groups
            .into_iter()
            .filter_map(|group| match group.key {
                GroupValue::Status(status) => Some(StatusCount {
                    status,
                    count: group.count,
                }),
                GroupValue::YearMonth { .. } => None,
            })
            .collect();
        let monthly_stats = monthly_groups
            .into_iter()
            .filter_map(|group| match group.key {
                GroupValue::YearMonth { year, month } => Some(MonthlyCount {
                    year,
                    month,
                    count: group.count,
                }),
                GroupValue::Status(_) => None,
            })
            .collect();
        JobStats {
            status_stats,
            monthly_stats,
        }
    }
}
