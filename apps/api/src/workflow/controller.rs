//! Workflow Controller: the only owner of the session state machine.
//!
//! ```text
//! Intake ──analyze──► Clarification ──complete──► Generating ──► Results ──restart──► Intake
//!    └──────────(no questions)───────────────────────┘    └─(stage 1/2 failure)─► Intake
//! any ──navigate──► Profile | JobSearch | Intake
//! JobSearch ──select──► Intake (seeded from the opportunity and the master resume)
//! ```
//!
//! Session state sits behind a `tokio::sync::RwLock` that is never held across a
//! backend await. A generation-path call made while another one is in flight is
//! rejected with `AppError::Conflict`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::analysis::gate::{analyze, validate_intake};
use crate::errors::AppError;
use crate::generation::pipeline::{run_pipeline, PipelineInput, PipelineObserver, Stage};
use crate::job_search::runner::search;
use crate::llm_client::GenerationBackend;
use crate::models::content::{AnalysisResult, GeneratedContent};
use crate::models::job::JobOpportunity;
use crate::models::profile::{SearchPreferences, UserProfile};
use crate::models::workflow::{ChatMessage, ChatRole, JobContext, WorkflowStep};
use crate::profile::knowledge::{learn_from_transcript, merge_facts};
use crate::profile::store::ProfileStore;

const ANALYSIS_STATUS: &str = "Checking your knowledge base & analyzing the gap...";
const CLARIFICATION_INTRO: &str = "I've analyzed your resume and known facts against the job description. To bridge the remaining gap, I have a few questions:";
pub const CLARIFICATION_ACK: &str = "Got it. Anything else relevant to add?";

#[derive(Debug, Clone, Default)]
struct Session {
    step: WorkflowStep,
    loading: bool,
    status_text: Option<String>,
    job_context: JobContext,
    analysis: Option<AnalysisResult>,
    conversation: Vec<ChatMessage>,
    results: Option<GeneratedContent>,
    last_error: Option<String>,
    clarification_occurred: bool,
    updated_at: DateTime<Utc>,
}

/// Read-only view of the session handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub step: WorkflowStep,
    pub loading: bool,
    pub status_text: Option<String>,
    pub job_context: JobContext,
    pub analysis: Option<AnalysisResult>,
    pub conversation: Vec<ChatMessage>,
    pub results: Option<GeneratedContent>,
    pub last_error: Option<String>,
    pub clarification_occurred: bool,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            step: self.step,
            loading: self.loading,
            status_text: self.status_text.clone(),
            job_context: self.job_context.clone(),
            analysis: self.analysis.clone(),
            conversation: self.conversation.clone(),
            results: self.results.clone(),
            last_error: self.last_error.clone(),
            clarification_occurred: self.clarification_occurred,
            updated_at: self.updated_at,
        }
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.loading {
            return Err(AppError::Conflict(
                "Another generation is still in progress".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_step(&self, expected: WorkflowStep, action: &str) -> Result<(), AppError> {
        if self.step != expected {
            return Err(AppError::Conflict(format!(
                "Cannot {action} from the {:?} step",
                self.step
            )));
        }
        Ok(())
    }

    fn enter(&mut self, step: WorkflowStep) {
        info!("Workflow {:?} -> {:?}", self.step, step);
        self.step = step;
        self.updated_at = Utc::now();
    }

    fn start_loading(&mut self, status: &str) {
        self.loading = true;
        self.status_text = Some(status.to_string());
        self.updated_at = Utc::now();
    }

    fn stop_loading(&mut self) {
        self.loading = false;
        self.status_text = None;
        self.updated_at = Utc::now();
    }

    /// Drops everything tied to the previous application attempt.
    fn reset_attempt(&mut self) {
        self.analysis = None;
        self.conversation.clear();
        self.results = None;
        self.last_error = None;
        self.clarification_occurred = false;
    }
}

fn clarification_opening(questions: &[String]) -> String {
    let numbered = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {q}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{CLARIFICATION_INTRO}\n\n{numbered}")
}

/// The user's answers, joined by blank lines.
pub fn clarification_context(conversation: &[ChatMessage]) -> String {
    conversation
        .iter()
        .filter(|m| m.role == ChatRole::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One `ROLE: content` line per message.
pub fn render_transcript(conversation: &[ChatMessage]) -> String {
    conversation
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn seed_job_description(job: &JobOpportunity) -> String {
    let mut seeded = format!("{} at {}\nLocation: {}", job.title, job.company, job.location);
    if let Some(salary) = &job.salary {
        seeded.push_str(&format!("\nSalary: {salary}"));
    }
    if let Some(url) = &job.url {
        seeded.push_str(&format!("\nURL: {url}"));
    }
    seeded
}

pub struct WorkflowController {
    backend: Arc<dyn GenerationBackend>,
    profiles: ProfileStore,
    profile: RwLock<UserProfile>,
    session: RwLock<Session>,
    search_deadline: Duration,
}

impl WorkflowController {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        profiles: ProfileStore,
        profile: UserProfile,
        search_deadline: Duration,
    ) -> Self {
        Self {
            backend,
            profiles,
            profile: RwLock::new(profile),
            session: RwLock::new(Session {
                updated_at: Utc::now(),
                ..Default::default()
            }),
            search_deadline,
        }
    }

    /// Builds a controller around the currently stored profile.
    pub async fn load(
        backend: Arc<dyn GenerationBackend>,
        profiles: ProfileStore,
        search_deadline: Duration,
    ) -> Self {
        let profile = profiles.load().await;
        info!(
            "Loaded profile {} ({} facts)",
            profiles.key(),
            profile.facts.len()
        );
        Self::new(backend, profiles, profile, search_deadline)
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.session.read().await.snapshot()
    }

    pub async fn profile(&self) -> UserProfile {
        self.profile.read().await.clone()
    }

    // ── Application path ────────────────────────────────────────────────────

    /// Validates, analyzes, then either opens the clarification dialogue or
    /// generates straight away.
    pub async fn submit_intake(
        &self,
        resume: &str,
        job_description: &str,
    ) -> Result<WorkflowSnapshot, AppError> {
        validate_intake(resume, job_description)?;
        {
            let mut session = self.session.write().await;
            session.ensure_idle()?;
            session.ensure_step(WorkflowStep::Intake, "submit an application")?;
            session.job_context = JobContext {
                resume: resume.to_string(),
                job_description: job_description.to_string(),
                additional_context: String::new(),
            };
            session.reset_attempt();
            session.start_loading(ANALYSIS_STATUS);
        }

        let known_facts = self.profile.read().await.facts.clone();
        let analysis = analyze(self.backend.as_ref(), resume, job_description, &known_facts).await;

        let job_context = {
            let mut session = self.session.write().await;
            if analysis.requires_clarification() {
                session.conversation = vec![ChatMessage::assistant(clarification_opening(
                    &analysis.questions,
                ))];
                session.analysis = Some(analysis);
                session.enter(WorkflowStep::Clarification);
                session.stop_loading();
                return Ok(session.snapshot());
            }
            session.analysis = Some(analysis);
            session.enter(WorkflowStep::Generating);
            session.start_loading(Stage::TailoredResume.status_text());
            session.job_context.clone()
        };

        self.generate(job_context, None).await
    }

    /// Appends the user's answer and the fixed acknowledgement.
    pub async fn post_message(&self, content: &str) -> Result<WorkflowSnapshot, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }

        let mut session = self.session.write().await;
        session.ensure_idle()?;
        session.ensure_step(WorkflowStep::Clarification, "post a message")?;
        session.conversation.push(ChatMessage::user(content));
        session.conversation.push(ChatMessage::assistant(CLARIFICATION_ACK));
        session.updated_at = Utc::now();
        Ok(session.snapshot())
    }

    /// Ends the dialogue and generates with `context`. After Results is published,
    /// facts revealed in `transcript` are merged into the profile.
    pub async fn complete_clarification(
        &self,
        context: &str,
        transcript: &str,
    ) -> Result<WorkflowSnapshot, AppError> {
        let job_context = {
            let mut session = self.session.write().await;
            session.ensure_idle()?;
            session.ensure_step(WorkflowStep::Clarification, "complete clarification")?;
            session.job_context = JobContext {
                additional_context: context.to_string(),
                ..session.job_context.clone()
            };
            session.clarification_occurred = true;
            session.enter(WorkflowStep::Generating);
            session.start_loading(Stage::TailoredResume.status_text());
            session.job_context.clone()
        };

        self.generate(job_context, Some(transcript.to_string())).await
    }

    /// `complete_clarification` with context and transcript derived from the
    /// recorded conversation.
    pub async fn complete_clarification_from_conversation(
        &self,
    ) -> Result<WorkflowSnapshot, AppError> {
        let (context, transcript) = {
            let session = self.session.read().await;
            (
                clarification_context(&session.conversation),
                render_transcript(&session.conversation),
            )
        };
        self.complete_clarification(&context, &transcript).await
    }

    /// Runs the pipeline for a session already in Generating with `loading` set.
    async fn generate(
        &self,
        job_context: JobContext,
        transcript: Option<String>,
    ) -> Result<WorkflowSnapshot, AppError> {
        let input = PipelineInput {
            resume: job_context.resume,
            job_description: job_context.job_description,
            additional_context: job_context.additional_context,
            known_facts: self.profile.read().await.facts.clone(),
        };

        let content = match run_pipeline(self.backend.as_ref(), &input, self).await {
            Ok(content) => content,
            Err(failure) => {
                error!("Generation aborted: {failure}");
                let mut session = self.session.write().await;
                session.last_error = Some(failure.to_string());
                session.enter(WorkflowStep::Intake);
                session.stop_loading();
                return Err(failure.into());
            }
        };

        let snapshot = {
            let mut session = self.session.write().await;
            session.results = Some(content);
            session.enter(WorkflowStep::Results);
            session.stop_loading();
            session.snapshot()
        };

        if let Some(transcript) = transcript {
            let outcome =
                learn_from_transcript(&self.profiles, self.backend.as_ref(), &transcript).await;
            if let Some(profile) = outcome.profile {
                *self.profile.write().await = profile;
            }
        }

        Ok(snapshot)
    }

    /// Results → Intake. The job context is kept for another attempt.
    pub async fn restart(&self) -> Result<WorkflowSnapshot, AppError> {
        let mut session = self.session.write().await;
        session.ensure_idle()?;
        session.ensure_step(WorkflowStep::Results, "restart")?;
        session.reset_attempt();
        session.enter(WorkflowStep::Intake);
        Ok(session.snapshot())
    }

    /// Free navigation between the top-level views. Job context is preserved.
    pub async fn navigate(&self, target: WorkflowStep) -> Result<WorkflowSnapshot, AppError> {
        if !matches!(
            target,
            WorkflowStep::Intake | WorkflowStep::Profile | WorkflowStep::JobSearch
        ) {
            return Err(AppError::Validation(format!(
                "Cannot navigate directly to the {target:?} step"
            )));
        }

        let mut session = self.session.write().await;
        session.ensure_idle()?;
        session.enter(target);
        Ok(session.snapshot())
    }

    /// JobSearch → Intake. Always re-bases the context on the master resume.
    pub async fn select_opportunity(
        &self,
        job: &JobOpportunity,
    ) -> Result<WorkflowSnapshot, AppError> {
        let master_resume = self.profile.read().await.master_resume.clone();

        let mut session = self.session.write().await;
        session.ensure_idle()?;
        session.ensure_step(WorkflowStep::JobSearch, "select an opportunity")?;
        session.job_context = JobContext {
            resume: master_resume,
            job_description: seed_job_description(job),
            additional_context: String::new(),
        };
        session.reset_attempt();
        session.enter(WorkflowStep::Intake);
        info!("Selected opportunity {} ({} at {})", job.id, job.title, job.company);
        Ok(session.snapshot())
    }

    // ── Profile ─────────────────────────────────────────────────────────────

    /// Replaces the stored profile. Persistence failures are logged, not raised.
    pub async fn save_profile(&self, profile: UserProfile) -> UserProfile {
        let profile = UserProfile {
            facts: merge_facts(&[], &profile.facts),
            ..profile
        };
        self.profiles.save(&profile).await;
        *self.profile.write().await = profile.clone();
        profile
    }

    pub async fn add_fact(&self, fact: &str) -> Result<UserProfile, AppError> {
        let profile = self.profiles.add_fact(fact).await?;
        *self.profile.write().await = profile.clone();
        Ok(profile)
    }

    pub async fn remove_fact(&self, index: usize) -> Result<UserProfile, AppError> {
        let profile = self.profiles.remove_fact(index).await?;
        *self.profile.write().await = profile.clone();
        Ok(profile)
    }

    pub async fn save_preferences(&self, preferences: SearchPreferences) -> UserProfile {
        let profile = self.profiles.save_preferences(preferences).await;
        *self.profile.write().await = profile.clone();
        profile
    }

    // ── Discovery ───────────────────────────────────────────────────────────

    /// Independent of the session: never changes the step or the job context.
    pub async fn run_search(
        &self,
        profile: &UserProfile,
        preferences: &SearchPreferences,
    ) -> Result<Vec<JobOpportunity>, AppError> {
        search(
            self.backend.as_ref(),
            profile,
            preferences,
            self.search_deadline,
        )
        .await
    }
}

#[async_trait]
impl PipelineObserver for WorkflowController {
    async fn stage_started(&self, stage: Stage) {
        let mut session = self.session.write().await;
        session.status_text = Some(stage.status_text().to_string());
        session.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::job_search::runner::DEFAULT_SEARCH_DEADLINE;
    use crate::llm_client::testing::ScriptedBackend;
    use crate::storage::{KeyValueStore, MemoryStore};

    const RESUME: &str = "# Jane Doe\n## Experience\n- Built payment systems in Rust for 6 years at Acme";
    const JOB: &str = "Staff Engineer at Beta. You will own our Rust payments platform end to end.";

    struct Harness {
        backend: Arc<ScriptedBackend>,
        store: ProfileStore,
        controller: Arc<WorkflowController>,
    }

    async fn harness_with(backend: ScriptedBackend, profile: UserProfile) -> Harness {
        let backend = Arc::new(backend);
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = ProfileStore::new(kv, "test");
        store.save(&profile).await;
        let controller = WorkflowController::load(
            backend.clone(),
            store.clone(),
            DEFAULT_SEARCH_DEADLINE,
        )
        .await;
        Harness {
            backend,
            store,
            controller: Arc::new(controller),
        }
    }

    async fn harness() -> Harness {
        harness_with(ScriptedBackend::new(), UserProfile::default()).await
    }

    fn script_generation(backend: &ScriptedBackend) {
        backend
            .push_text("# Jane Doe (tailored)")
            .push_text("Dear Beta team,");
        backend.push_json(json!({"managerInfo": "Sam Lee, Eng Director", "draftMessage": "Hi Sam!"}));
    }

    #[tokio::test]
    async fn test_direct_path_reaches_results() {
        let h = harness().await;
        h.backend
            .push_json(json!({"needsInfo": false, "questions": [], "rationale": "covered"}));
        script_generation(&h.backend);

        let snapshot = h.controller.submit_intake(RESUME, JOB).await.unwrap();

        assert_eq!(snapshot.step, WorkflowStep::Results);
        assert!(!snapshot.loading);
        assert!(snapshot.status_text.is_none());
        assert!(!snapshot.clarification_occurred);
        let results = snapshot.results.unwrap();
        assert!(!results.resume.is_empty());
        assert!(!results.cover_letter.is_empty());
        assert!(!results.outreach_message.is_empty());
        // analysis + 3 stages, no learning call
        assert_eq!(h.backend.prompts().len(), 4);
    }

    #[tokio::test]
    async fn test_clarification_path_learns_facts() {
        let h = harness_with(
            ScriptedBackend::new(),
            UserProfile {
                facts: vec!["Existing fact".to_string()],
                ..Default::default()
            },
        )
        .await;
        h.backend.push_json(json!({
            "needsInfo": true,
            "questions": ["How big was the team?", "Which metrics improved?"],
            "rationale": "missing scope"
        }));

        let snapshot = h.controller.submit_intake(RESUME, JOB).await.unwrap();
        assert_eq!(snapshot.step, WorkflowStep::Clarification);
        assert_eq!(snapshot.conversation.len(), 1);
        let opening = &snapshot.conversation[0].content;
        assert!(opening.starts_with(CLARIFICATION_INTRO));
        assert!(opening.contains("1. How big was the team?\n\n2. Which metrics improved?"));

        let snapshot = h.controller.post_message("Team of 5, cut costs 30%").await.unwrap();
        assert_eq!(snapshot.conversation.len(), 3);
        assert_eq!(snapshot.conversation[2].content, CLARIFICATION_ACK);

        script_generation(&h.backend);
        h.backend.push_json(json!(["Led a team of 5", "Existing fact"]));

        let snapshot = h
            .controller
            .complete_clarification_from_conversation()
            .await
            .unwrap();

        assert_eq!(snapshot.step, WorkflowStep::Results);
        assert!(snapshot.clarification_occurred);
        assert_eq!(snapshot.job_context.additional_context, "Team of 5, cut costs 30%");

        let prompts = h.backend.prompts();
        assert!(prompts[1].contains("Team of 5, cut costs 30%\n\nKNOWN FACTS:\nExisting fact"));
        assert!(prompts[4].contains("USER: Team of 5, cut costs 30%"));
        assert!(prompts[4].contains("ASSISTANT: Got it."));

        let expected = vec!["Existing fact".to_string(), "Led a team of 5".to_string()];
        assert_eq!(h.controller.profile().await.facts, expected);
        assert_eq!(h.store.load().await.facts, expected);
    }

    #[tokio::test]
    async fn test_learning_failure_keeps_results() {
        let h = harness().await;
        h.backend
            .push_json(json!({"needsInfo": true, "questions": ["Team size?"], "rationale": ""}));
        h.controller.submit_intake(RESUME, JOB).await.unwrap();
        h.controller.post_message("Five").await.unwrap();

        script_generation(&h.backend);
        h.backend.push_json_error();

        let snapshot = h
            .controller
            .complete_clarification_from_conversation()
            .await
            .unwrap();

        assert_eq!(snapshot.step, WorkflowStep::Results);
        assert!(snapshot.results.is_some());
        assert!(h.controller.profile().await.facts.is_empty());
    }

    #[tokio::test]
    async fn test_stage_one_failure_returns_to_intake() {
        let h = harness().await;
        h.backend.push_json(json!({"needsInfo": false}));
        h.backend.push_text_error();

        let err = h.controller.submit_intake(RESUME, JOB).await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));

        let snapshot = h.controller.snapshot().await;
        assert_eq!(snapshot.step, WorkflowStep::Intake);
        assert!(!snapshot.loading);
        assert!(snapshot.results.is_none());
        assert!(snapshot.last_error.is_some());
        assert_eq!(snapshot.job_context.resume, RESUME);

        // A fresh attempt clears the error.
        h.backend.push_json(json!({"needsInfo": false}));
        script_generation(&h.backend);
        let snapshot = h.controller.submit_intake(RESUME, JOB).await.unwrap();
        assert_eq!(snapshot.step, WorkflowStep::Results);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_analysis_failure_still_generates() {
        let h = harness().await;
        h.backend.push_json_error();
        script_generation(&h.backend);

        let snapshot = h.controller.submit_intake(RESUME, JOB).await.unwrap();

        assert_eq!(snapshot.step, WorkflowStep::Results);
        assert!(!snapshot.analysis.unwrap().needs_info);
    }

    #[tokio::test]
    async fn test_short_input_is_rejected_without_transition() {
        let h = harness().await;

        let err = h.controller.submit_intake("too short", JOB).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let snapshot = h.controller.snapshot().await;
        assert_eq!(snapshot.step, WorkflowStep::Intake);
        assert!(!snapshot.loading);
        assert!(snapshot.job_context.resume.is_empty());
        assert!(h.backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_clarification_actions_need_clarification_step() {
        let h = harness().await;

        let err = h.controller.complete_clarification("ctx", "").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = h.controller.post_message("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = h.controller.post_message("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = h.controller.restart().await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_restart_keeps_job_context() {
        let h = harness().await;
        h.backend.push_json(json!({"needsInfo": false}));
        script_generation(&h.backend);
        h.controller.submit_intake(RESUME, JOB).await.unwrap();

        let snapshot = h.controller.restart().await.unwrap();

        assert_eq!(snapshot.step, WorkflowStep::Intake);
        assert!(snapshot.results.is_none());
        assert_eq!(snapshot.job_context.job_description, JOB);
    }

    #[tokio::test]
    async fn test_navigation_preserves_context() {
        let h = harness().await;
        h.backend
            .push_json(json!({"needsInfo": true, "questions": ["Team size?"]}));
        h.controller.submit_intake(RESUME, JOB).await.unwrap();

        let snapshot = h.controller.navigate(WorkflowStep::Profile).await.unwrap();
        assert_eq!(snapshot.step, WorkflowStep::Profile);
        assert_eq!(snapshot.job_context.resume, RESUME);

        let err = h.controller.navigate(WorkflowStep::Results).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_select_opportunity_rebases_on_master_resume() {
        let h = harness_with(
            ScriptedBackend::new(),
            UserProfile {
                master_resume: "MASTER RESUME".to_string(),
                ..Default::default()
            },
        )
        .await;
        let job = JobOpportunity {
            id: "j1".to_string(),
            title: "Staff Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            salary: None,
            url: Some("https://acme.example/jobs/1".to_string()),
            match_score: 91,
            reasoning: "Rust".to_string(),
        };

        let err = h.controller.select_opportunity(&job).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        h.controller.navigate(WorkflowStep::JobSearch).await.unwrap();
        let snapshot = h.controller.select_opportunity(&job).await.unwrap();

        assert_eq!(snapshot.step, WorkflowStep::Intake);
        assert_eq!(snapshot.job_context.resume, "MASTER RESUME");
        assert_eq!(
            snapshot.job_context.job_description,
            "Staff Engineer at Acme\nLocation: Remote\nURL: https://acme.example/jobs/1"
        );
        assert!(snapshot.job_context.additional_context.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_controller_rejects_second_generation() {
        let h = harness_with(
            ScriptedBackend::new().with_delay(Duration::from_secs(1)),
            UserProfile::default(),
        )
        .await;
        h.backend.push_json(json!({"needsInfo": false}));
        script_generation(&h.backend);

        let controller = h.controller.clone();
        let first = tokio::spawn(async move { controller.submit_intake(RESUME, JOB).await });

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = h.controller.snapshot().await;
        assert!(snapshot.loading);
        assert_eq!(snapshot.status_text.as_deref(), Some(ANALYSIS_STATUS));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = h.controller.snapshot().await;
        assert_eq!(snapshot.step, WorkflowStep::Generating);
        assert_eq!(
            snapshot.status_text.as_deref(),
            Some(Stage::TailoredResume.status_text())
        );

        let err = h.controller.submit_intake(RESUME, JOB).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = h.controller.navigate(WorkflowStep::Profile).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let snapshot = first.await.unwrap().unwrap();
        assert_eq!(snapshot.step, WorkflowStep::Results);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completing_clarification_is_busy_immediately() {
        let h = harness_with(
            ScriptedBackend::new().with_delay(Duration::from_secs(1)),
            UserProfile::default(),
        )
        .await;
        h.backend
            .push_json(json!({"needsInfo": true, "questions": ["Team size?"], "rationale": ""}));
        h.controller.submit_intake(RESUME, JOB).await.unwrap();
        h.controller.post_message("Five").await.unwrap();
        script_generation(&h.backend);
        h.backend.push_json(json!([]));

        let controller = h.controller.clone();
        let pending = tokio::spawn(async move {
            controller.complete_clarification_from_conversation().await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        let snapshot = h.controller.snapshot().await;
        assert_eq!(snapshot.step, WorkflowStep::Generating);
        assert!(snapshot.loading);
        assert_eq!(
            snapshot.status_text.as_deref(),
            Some(Stage::TailoredResume.status_text())
        );
        let err = h.controller.navigate(WorkflowStep::Intake).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = h.controller.complete_clarification("again", "").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let snapshot = pending.await.unwrap().unwrap();
        assert_eq!(snapshot.step, WorkflowStep::Results);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_profile_edits_update_memory_and_store() {
        let h = harness().await;

        h.controller
            .save_profile(UserProfile {
                master_resume: "resume".to_string(),
                facts: vec!["a".to_string(), "a".to_string(), "b".to_string()],
                ..Default::default()
            })
            .await;
        assert_eq!(h.controller.profile().await.facts, vec!["a", "b"]);

        h.controller.add_fact("c").await.unwrap();
        h.controller.remove_fact(0).await.unwrap();
        assert_eq!(h.controller.profile().await.facts, vec!["b", "c"]);

        let prefs = SearchPreferences {
            roles: "Staff Engineer".to_string(),
            ..Default::default()
        };
        h.controller.save_preferences(prefs.clone()).await;

        let stored = h.store.load().await;
        assert_eq!(stored.master_resume, "resume");
        assert_eq!(stored.facts, vec!["b", "c"]);
        assert_eq!(stored.search_preferences, prefs);
    }

    #[tokio::test]
    async fn test_search_leaves_session_untouched() {
        let h = harness().await;
        h.backend
            .push_json(json!([{"title": "Staff Engineer", "company": "Acme", "matchScore": 80}]));
        let before = h.controller.snapshot().await;

        let profile = h.controller.profile().await;
        let jobs = h
            .controller
            .run_search(&profile, &profile.search_preferences)
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
        let after = h.controller.snapshot().await;
        assert_eq!(after.step, before.step);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn test_transcript_and_context_derivation() {
        let conversation = vec![
            ChatMessage::assistant("Q?"),
            ChatMessage::user("A1"),
            ChatMessage::assistant(CLARIFICATION_ACK),
            ChatMessage::user("A2"),
        ];
        assert_eq!(clarification_context(&conversation), "A1\n\nA2");
        assert_eq!(
            render_transcript(&conversation),
            format!("ASSISTANT: Q?\nUSER: A1\nASSISTANT: {CLARIFICATION_ACK}\nUSER: A2")
        );
    }
}
