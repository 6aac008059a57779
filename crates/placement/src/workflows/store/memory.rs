use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::RepositoryError;
use crate::workflows::assessment::domain::{
    AnswerKeyEntry, NewTest, SubmissionResponse, Test, TestResult,
};
use crate::workflows::assessment::repository::{EvaluationStore, TestRepository};
use crate::workflows::hiring::domain::{
    Application, ApplicationContext, ApplicationStatus, Interview, InterviewStatus, JobPosting,
    NewInterview, StudentProfile,
};
use crate::workflows::hiring::repository::{
    ApplicationRepository, InterviewRepository, JobRepository,
};
use crate::workflows::ids::{ApplicationId, InterviewId, JobId, ResultId, StudentId, TestId};

/// Single-mutex store: every trait call runs under one lock, so the
/// compare-and-set status writes are atomic with respect to each other.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    jobs: HashMap<JobId, JobPosting>,
    students: HashMap<StudentId, StudentProfile>,
    applications: BTreeMap<ApplicationId, Application>,
    interviews: Vec<Interview>,
    tests: BTreeMap<TestId, Test>,
    answer_keys: HashMap<TestId, Vec<AnswerKeyEntry>>,
    results: BTreeMap<ResultId, TestResult>,
    responses: Vec<SubmissionResponse>,
    next_interview_id: i64,
    next_test_id: i64,
}

impl InMemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn insert_job(&self, job: JobPosting) -> Result<(), RepositoryError> {
        self.lock()?.jobs.insert(job.id, job);
        Ok(())
    }

    pub fn insert_student(&self, student: StudentProfile) -> Result<(), RepositoryError> {
        self.lock()?.students.insert(student.id, student);
        Ok(())
    }

    pub fn insert_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        if inner.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict(format!(
                "application {} already exists",
                application.id
            )));
        }
        inner.applications.insert(application.id, application);
        Ok(())
    }

    pub fn insert_result(&self, result: TestResult) -> Result<(), RepositoryError> {
        self.lock()?.results.insert(result.id, result);
        Ok(())
    }

    pub fn insert_response(&self, response: SubmissionResponse) -> Result<(), RepositoryError> {
        self.lock()?.responses.push(response);
        Ok(())
    }

    pub fn application_status(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationStatus>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).map(|app| app.status))
    }

    pub fn interviews_for(&self, id: ApplicationId) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .iter()
            .filter(|interview| interview.application_id == id)
            .cloned()
            .collect())
    }

    pub fn result(&self, id: ResultId) -> Result<Option<TestResult>, RepositoryError> {
        Ok(self.lock()?.results.get(&id).cloned())
    }
}

impl ApplicationRepository for InMemoryStore {
    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn context(&self, id: ApplicationId) -> Result<Option<ApplicationContext>, RepositoryError> {
        let inner = self.lock()?;
        let Some(application) = inner.applications.get(&id).cloned() else {
            return Ok(None);
        };
        let job = inner
            .jobs
            .get(&application.job_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("job {}", application.job_id)))?;
        let student = inner
            .students
            .get(&application.student_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("student {}", application.student_id))
            })?;
        Ok(Some(ApplicationContext {
            application,
            job,
            student,
        }))
    }

    fn compare_and_set_status(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.lock()?;
        match inner.applications.get_mut(&id) {
            Some(application) if application.status == expected => {
                application.status = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn for_job(&self, job_id: JobId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| application.job_id == job_id)
            .cloned()
            .collect())
    }
}

impl InterviewRepository for InMemoryStore {
    fn insert(&self, interview: NewInterview) -> Result<Interview, RepositoryError> {
        let mut inner = self.lock()?;
        let already_scheduled = inner.interviews.iter().any(|existing| {
            existing.application_id == interview.application_id
                && existing.status == InterviewStatus::Scheduled
        });
        if already_scheduled {
            return Err(RepositoryError::Conflict(format!(
                "application {} already has a scheduled interview",
                interview.application_id
            )));
        }

        inner.next_interview_id += 1;
        let stored = Interview {
            id: InterviewId(inner.next_interview_id),
            application_id: interview.application_id,
            scheduled_by: interview.scheduled_by,
            scheduled_at: interview.scheduled_at,
            mode: interview.mode,
            status: InterviewStatus::Scheduled,
            notes: interview.notes,
            location: interview.location,
        };
        inner.interviews.push(stored.clone());
        Ok(stored)
    }

    fn active_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .iter()
            .rev()
            .find(|interview| {
                interview.application_id == application_id
                    && interview.status != InterviewStatus::Cancelled
            })
            .cloned())
    }

    fn update_status(
        &self,
        id: InterviewId,
        status: InterviewStatus,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.lock()?;
        match inner.interviews.iter_mut().find(|interview| interview.id == id) {
            Some(interview) => {
                interview.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn close_for_application(
        &self,
        application_id: ApplicationId,
        status: InterviewStatus,
    ) -> Result<usize, RepositoryError> {
        let mut inner = self.lock()?;
        let mut touched = 0;
        for interview in inner.interviews.iter_mut().filter(|interview| {
            interview.application_id == application_id
                && interview.status != InterviewStatus::Cancelled
        }) {
            interview.status = status;
            touched += 1;
        }
        Ok(touched)
    }
}

impl JobRepository for InMemoryStore {
    fn fetch(&self, id: JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    fn applicant_emails(&self, id: JobId) -> Result<Vec<String>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner
            .applications
            .values()
            .filter(|application| application.job_id == id)
            .filter_map(|application| inner.students.get(&application.student_id))
            .map(|student| student.email.clone())
            .collect())
    }
}

impl TestRepository for InMemoryStore {
    fn insert(&self, test: NewTest) -> Result<Test, RepositoryError> {
        let mut inner = self.lock()?;
        let duplicate = inner
            .tests
            .values()
            .any(|existing| existing.job_id == test.job_id && existing.name == test.name);
        if duplicate {
            return Err(RepositoryError::Conflict(
                "The test already exists !".to_string(),
            ));
        }

        inner.next_test_id += 1;
        let stored = Test {
            id: TestId(inner.next_test_id),
            name: test.name,
            description: test.description,
            duration_minutes: test.duration_minutes,
            question_count: test.question_count,
            end_time: test.end_time,
            grading: test.grading,
            upload_method: test.upload_method,
            job_id: test.job_id,
            owner: test.owner,
            form_id: test.form_id,
            result_artifact: None,
            threshold: test.threshold,
        };
        inner.tests.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn fetch(&self, id: TestId) -> Result<Option<Test>, RepositoryError> {
        Ok(self.lock()?.tests.get(&id).cloned())
    }

    fn set_result_artifact(&self, id: TestId, path: &str) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        let test = inner
            .tests
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("test {id}")))?;
        test.result_artifact = Some(path.to_string());
        Ok(())
    }
}

impl EvaluationStore for InMemoryStore {
    fn replace_answer_key(
        &self,
        test_id: TestId,
        entries: Vec<AnswerKeyEntry>,
    ) -> Result<(), RepositoryError> {
        self.lock()?.answer_keys.insert(test_id, entries);
        Ok(())
    }

    fn answer_key(&self, test_id: TestId) -> Result<Vec<AnswerKeyEntry>, RepositoryError> {
        Ok(self
            .lock()?
            .answer_keys
            .get(&test_id)
            .cloned()
            .unwrap_or_default())
    }

    fn responses(&self, test_id: TestId) -> Result<Vec<SubmissionResponse>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner
            .responses
            .iter()
            .filter(|response| {
                inner
                    .results
                    .get(&response.result_id)
                    .is_some_and(|result| result.test_id == test_id)
            })
            .cloned()
            .collect())
    }

    fn results(&self, test_id: TestId) -> Result<Vec<TestResult>, RepositoryError> {
        Ok(self
            .lock()?
            .results
            .values()
            .filter(|result| result.test_id == test_id)
            .cloned()
            .collect())
    }

    fn write_scores(
        &self,
        test_id: TestId,
        scores: &BTreeMap<ResultId, i64>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        if let Some(missing) = scores.keys().find(|result_id| {
            !inner
                .results
                .get(result_id)
                .is_some_and(|result| result.test_id == test_id)
        }) {
            return Err(RepositoryError::NotFound(format!(
                "result {missing} for test {test_id}"
            )));
        }
        for (result_id, score) in scores {
            if let Some(result) = inner.results.get_mut(result_id) {
                result.score = Some(*score);
            }
        }
        Ok(())
    }
}
