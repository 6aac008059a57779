use serde::Serialize;

use super::domain::ApplicationStatus;
use crate::workflows::ids::JobId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelLink {
    pub source: &'static str,
    pub target: &'static str,
    pub value: usize,
}

/// Where applications of a job currently sit and how far they got, the
/// data behind the applicant Sankey chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantFunnel {
    pub job_id: JobId,
    pub total: usize,
    pub current: Vec<StageCount>,
    pub reached: Vec<StageCount>,
    pub links: Vec<FunnelLink>,
}

impl ApplicantFunnel {
    pub fn from_statuses<I>(job_id: JobId, statuses: I) -> Self
    where
        I: IntoIterator<Item = ApplicationStatus>,
    {
        let mut counts = [0usize; 6];
        for status in statuses {
            counts[index(status)] += 1;
        }
        let count = |status: ApplicationStatus| counts[index(status)];

        let hired = count(ApplicationStatus::Hired);
        let offered = hired + count(ApplicationStatus::Offered);
        let shortlisted = offered + count(ApplicationStatus::ShortListed);
        let rejected = count(ApplicationStatus::Rejected);
        // Rejection is only reachable after review, so rejected
        // applications count towards UnderReview.
        let reviewed = shortlisted + rejected + count(ApplicationStatus::UnderReview);
        let total: usize = counts.iter().sum();

        let current = ApplicationStatus::ordered()
            .into_iter()
            .map(|status| StageCount {
                status,
                label: status.label(),
                count: count(status),
            })
            .collect();

        let reached = [
            (ApplicationStatus::Applied, total),
            (ApplicationStatus::UnderReview, reviewed),
            (ApplicationStatus::ShortListed, shortlisted),
            (ApplicationStatus::Rejected, rejected),
            (ApplicationStatus::Offered, offered),
            (ApplicationStatus::Hired, hired),
        ]
        .into_iter()
        .map(|(status, count)| StageCount {
            status,
            label: status.label(),
            count,
        })
        .collect();

        let links = [
            ("Applied", "UnderReview", reviewed),
            ("UnderReview", "ShortListed", shortlisted),
            ("UnderReview", "Rejected", rejected),
            ("ShortListed", "Offered", offered),
            ("Offered", "Hired", hired),
        ]
        .into_iter()
        .map(|(source, target, value)| FunnelLink {
            source,
            target,
            value,
        })
        .collect();

        Self {
            job_id,
            total,
            current,
            reached,
            links,
        }
    }

    pub fn reached(&self, status: ApplicationStatus) -> usize {
        self.reached
            .iter()
            .find(|stage| stage.status == status)
            .map(|stage| stage.count)
            .unwrap_or(0)
    }
}

fn index(status: ApplicationStatus) -> usize {
    match status {
        ApplicationStatus::Applied => 0,
        ApplicationStatus::UnderReview => 1,
        ApplicationStatus::ShortListed => 2,
        ApplicationStatus::Rejected => 3,
        ApplicationStatus::Offered => 4,
        ApplicationStatus::Hired => 5,
    }
}
