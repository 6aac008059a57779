use std::path::Path;

use crate::workflows::assessment::domain::Test;
use crate::workflows::assessment::report::TestReport;
use crate::workflows::hiring::domain::{ApplicationContext, Interview, JobPosting, OfferDocument};

use super::{Attachment, Notification, NotificationKind};

pub fn test_posted(job: &JobPosting, test: &Test, recipients: Vec<String>) -> Notification {
    let mut html = String::new();
    html.push_str(&format!(
        "<h1>New assessment for {}</h1>",
        escape_html(&job.title)
    ));
    html.push_str(&format!(
        "<p>{} has published the test <strong>{}</strong> for the position you applied to.</p>",
        escape_html(&job.company_name),
        escape_html(&test.name)
    ));
    if let Some(description) = test.description.as_deref().filter(|d| !d.trim().is_empty()) {
        html.push_str(&format!("<p>{}</p>", escape_html(description.trim())));
    }
    html.push_str(&format!(
        "<ul><li>Questions: {}</li><li>Duration: {} minutes</li><li>Closes: {} at {} UTC</li></ul>",
        test.question_count,
        test.duration_minutes,
        test.end_time.format("%Y-%m-%d"),
        test.end_time.format("%H:%M")
    ));

    Notification {
        kind: NotificationKind::TestPosted,
        subject: format!("{}: new test for {}", job.company_name, job.title),
        html_body: html,
        recipients,
        attachment: None,
    }
}

pub fn interview_scheduled(context: &ApplicationContext, interview: &Interview) -> Notification {
    let mut html = greeting(context);
    html.push_str(&format!(
        "<p>{} has scheduled an interview for the <strong>{}</strong> position.</p>",
        escape_html(&context.job.company_name),
        escape_html(&context.job.title)
    ));
    html.push_str(&format!(
        "<ul><li>Date: {}</li><li>Time: {}</li><li>Format: {}</li><li>Location: {}</li></ul>",
        interview.scheduled_at.format("%Y-%m-%d"),
        interview.scheduled_at.format("%H:%M"),
        interview.mode.label(),
        escape_html(&interview.location)
    ));
    if let Some(notes) = interview.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        html.push_str(&format!("<p><em>{}</em></p>", escape_html(notes.trim())));
    }
    html.push_str(&signature(context));

    Notification {
        kind: NotificationKind::InterviewScheduled,
        subject: format!("Interview scheduled: {}", context.job.title),
        html_body: html,
        recipients: vec![context.student.email.clone()],
        attachment: None,
    }
}

pub fn interview_cancelled(context: &ApplicationContext, interview: &Interview) -> Notification {
    let mut html = greeting(context);
    html.push_str(&format!(
        "<p>Your interview for <strong>{}</strong> at {} on {} at {} has been cancelled.</p>",
        escape_html(&context.job.title),
        escape_html(&context.job.company_name),
        interview.scheduled_at.format("%Y-%m-%d"),
        interview.scheduled_at.format("%H:%M")
    ));
    html.push_str(&format!(
        "<p>Questions can be sent to {} at <a href=\"mailto:{}\">{}</a>.</p>",
        escape_html(&context.job.representative_name),
        escape_html(&context.job.representative_email),
        escape_html(&context.job.representative_email)
    ));

    Notification {
        kind: NotificationKind::InterviewCancelled,
        subject: format!("Interview cancelled: {}", context.job.title),
        html_body: html,
        recipients: vec![context.student.email.clone()],
        attachment: None,
    }
}

pub fn offer_extended(context: &ApplicationContext, document: &OfferDocument) -> Notification {
    let mut html = greeting(context);
    html.push_str(&format!(
        "<p>Congratulations! {} is pleased to offer you the <strong>{}</strong> position.</p>",
        escape_html(&context.job.company_name),
        escape_html(&context.job.title)
    ));
    html.push_str("<p>The offer letter is attached to this message.</p>");
    html.push_str(&signature(context));

    Notification {
        kind: NotificationKind::OfferExtended,
        subject: format!("Offer from {}", context.job.company_name),
        html_body: html,
        recipients: vec![context.student.email.clone()],
        attachment: Some(Attachment {
            file_name: document.file_name.clone(),
            content_type: content_type_for(&document.path).to_string(),
            path: document.path.clone(),
        }),
    }
}

pub fn result_draft_ready(
    job: &JobPosting,
    test: &Test,
    report: &TestReport,
    artifact: &Path,
) -> Notification {
    let mut html = format!("<p>Hello {},</p>", escape_html(&job.representative_name));
    html.push_str(&format!(
        "<p>The result draft for <strong>{}</strong> is ready.</p>",
        escape_html(&test.name)
    ));
    html.push_str(&format!(
        "<ul><li>Participants: {}</li><li>Passed: {}</li><li>Failed: {}</li><li>Cutoff: {} of {} points ({}%)</li></ul>",
        report.participants(),
        report.passed,
        report.failed,
        report.cutoff,
        report.total_points,
        report.threshold
    ));

    let file_name = artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}result.html", test.id));

    Notification {
        kind: NotificationKind::ResultDraftReady,
        subject: format!("Result draft ready: {}", test.name),
        html_body: html,
        recipients: vec![job.representative_email.clone()],
        attachment: Some(Attachment {
            file_name,
            content_type: mime::TEXT_HTML.to_string(),
            path: artifact.to_path_buf(),
        }),
    }
}

fn greeting(context: &ApplicationContext) -> String {
    format!("<p>Hello {},</p>", escape_html(&context.student.name))
}

fn signature(context: &ApplicationContext) -> String {
    format!(
        "<p>Regards,<br>{}<br>{}</p>",
        escape_html(&context.job.representative_name),
        escape_html(&context.job.company_name)
    )
}

pub(crate) fn content_type_for(path: &Path) -> mime::Mime {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => mime::APPLICATION_PDF,
        Some("html") | Some("htm") => mime::TEXT_HTML,
        Some("txt") => mime::TEXT_PLAIN,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::workflows::hiring::domain::{
        Application, ApplicationStatus, InterviewMode, InterviewStatus, StudentProfile,
    };
    use crate::workflows::ids::{ApplicationId, InterviewId, JobId, StudentId, UserId};

    fn context() -> ApplicationContext {
        ApplicationContext {
            application: Application {
                id: ApplicationId(7),
                job_id: JobId(3),
                student_id: StudentId(11),
                status: ApplicationStatus::ShortListed,
            },
            job: JobPosting {
                id: JobId(3),
                owner: UserId(1),
                title: "Backend <Intern>".to_string(),
                company_name: "Acme & Co".to_string(),
                representative_name: "Rita".to_string(),
                representative_email: "rita@acme.test".to_string(),
            },
            student: StudentProfile {
                id: StudentId(11),
                name: "Sam".to_string(),
                email: "sam@uni.test".to_string(),
                resume_path: None,
                result_path: None,
            },
        }
    }

    #[test]
    fn interview_email_escapes_job_copy_and_targets_student() {
        let interview = Interview {
            id: InterviewId(1),
            application_id: ApplicationId(7),
            scheduled_by: UserId(1),
            scheduled_at: NaiveDate::from_ymd_opt(2025, 5, 2)
                .and_then(|date| date.and_hms_opt(9, 15, 0))
                .expect("valid datetime"),
            mode: InterviewMode::Onsite,
            status: InterviewStatus::Scheduled,
            notes: Some("Bring ID".to_string()),
            location: "Room 4".to_string(),
        };

        let notification = interview_scheduled(&context(), &interview);
        assert_eq!(notification.recipients, vec!["sam@uni.test".to_string()]);
        assert!(notification.html_body.contains("Backend &lt;Intern&gt;"));
        assert!(notification.html_body.contains("Acme &amp; Co"));
        assert!(notification.html_body.contains("2025-05-02"));
        assert!(notification.html_body.contains("09:15"));
    }

    #[test]
    fn offer_attaches_document_with_detected_content_type() {
        let document = OfferDocument {
            file_name: "offer.pdf".to_string(),
            path: PathBuf::from("/tmp/offers/offer.PDF"),
        };
        let notification = offer_extended(&context(), &document);
        let attachment = notification.attachment.expect("attachment");
        assert_eq!(attachment.content_type, "application/pdf");
        assert_eq!(attachment.file_name, "offer.pdf");
    }
}
