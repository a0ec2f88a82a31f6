//! Project repository and phase state machine.
//!
//! [`ProjectService`] owns the in-memory collection, applies every lifecycle
//! operation to it and hands the result to its [`ProjectStore`] after each
//! successful mutation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{TrackerError, TrackerResult};
use super::phase::{ActionTrigger, PhaseId};
use super::project::{
    GemOutput, NewProject, Project, ProjectAction, ProjectStatus, ProjectUpdate, UserInput,
    UserInputData,
};
use super::store::{ProjectCollection, ProjectStore};

/// Criteria for [`ProjectService::find_projects`]. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    phase: Option<PhaseId>,
    /// Lowercased research manager
    manager: Option<String>,
    active_only: bool,
}

impl ProjectFilter {
    /// Only projects currently in `phase`.
    pub fn phase(mut self, phase: PhaseId) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Only projects of this research manager (case-insensitive).
    pub fn manager(mut self, manager: &str) -> Self {
        self.manager = Some(manager.to_lowercase());
        self
    }

    /// Only projects with status `active`.
    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Whether `project` meets every set criterion.
    pub fn matches(&self, project: &Project) -> bool {
        self.phase.map_or(true, |phase| project.current_phase() == phase)
            && self
                .manager
                .as_deref()
                .map_or(true, |m| project.research_manager.to_lowercase() == m)
            && (!self.active_only || project.status == ProjectStatus::Active)
    }
}

/// Repository of projects backed by a [`ProjectStore`].
#[derive(Debug)]
pub struct ProjectService<S: ProjectStore> {
    store: S,
    collection: ProjectCollection,
}

impl<S: ProjectStore> ProjectService<S> {
    /// Load the collection from `store`.
    pub fn open(store: S) -> TrackerResult<Self> {
        let mut collection = store.load()?;
        for project in collection.projects.values_mut() {
            project.sync_phase_number();
        }
        Ok(Self { store, collection })
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service, returning the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    // --- Lifecycle ---

    /// Create a project and persist it.
    pub fn add_project(&mut self, data: NewProject) -> TrackerResult<Project> {
        let id = format!("proj_{}", Uuid::new_v4().simple());
        let project = Project::new(id.clone(), data, Utc::now());

        tracing::info!(
            project = %id,
            client = %project.client_name,
            phase = %project.current_phase(),
            "Created project"
        );

        self.collection.projects.insert(id.clone(), project.clone());
        if let Err(e) = self.persist() {
            self.collection.projects.remove(&id);
            return Err(e);
        }
        Ok(project)
    }

    /// Apply a partial update to descriptive fields.
    pub fn update_project(&mut self, id: &str, update: ProjectUpdate) -> TrackerResult<Project> {
        self.mutate(id, |project, _| {
            project.apply(update);
            true
        })
    }

    /// Change the lifecycle status.
    pub fn set_status(&mut self, id: &str, status: ProjectStatus) -> TrackerResult<Project> {
        self.update_project(id, ProjectUpdate { status: Some(status), ..ProjectUpdate::default() })
    }

    /// Remove a project from the collection.
    pub fn delete_project(&mut self, id: &str) -> TrackerResult<Project> {
        let project = self
            .collection
            .projects
            .remove(id)
            .ok_or_else(|| TrackerError::ProjectNotFound(id.to_string()))?;
        if let Err(e) = self.persist() {
            self.collection.projects.insert(id.to_string(), project);
            return Err(e);
        }
        tracing::info!(project = %id, "Deleted project");
        Ok(project)
    }

    // --- Phase management ---

    /// Log `trigger` as completed and auto-advance if the current phase is satisfied.
    ///
    /// Completing an already-logged trigger changes nothing. After a new entry
    /// is appended, the project moves exactly one phase forward when any
    /// trigger of its current phase is in the log and a next phase exists.
    pub fn complete_action(
        &mut self,
        id: &str,
        trigger: ActionTrigger,
        description: &str,
        completed_by: Option<&str>,
    ) -> TrackerResult<Project> {
        self.mutate(id, |project, now| {
            if project.has_completed(trigger) {
                tracing::debug!(project = %project.id, %trigger, "Action already completed");
                return false;
            }

            project.completed_actions.push(ProjectAction {
                id: format!("action_{}", Uuid::new_v4().simple()),
                trigger,
                description: description.to_string(),
                completed_at: now,
                completed_by: completed_by.map(str::to_string),
            });

            if project.current_phase_satisfied() {
                let from = project.current_phase();
                if let Some(next) = from.next() {
                    project.move_to(next);
                    tracing::debug!(project = %project.id, %from, to = %next, %trigger, "Advanced phase");
                }
            }

            true
        })
    }

    /// Remove `trigger` from the completed-action log.
    ///
    /// Phase advancement that the trigger caused is kept.
    pub fn uncomplete_action(&mut self, id: &str, trigger: ActionTrigger) -> TrackerResult<Project> {
        self.mutate(id, |project, _| {
            let before = project.completed_actions.len();
            project.completed_actions.retain(|a| a.trigger != trigger);
            project.completed_actions.len() != before
        })
    }

    /// Move to `phase` unconditionally, in either direction.
    pub fn set_phase(&mut self, id: &str, phase: PhaseId) -> TrackerResult<Project> {
        self.mutate(id, |project, _| {
            tracing::debug!(project = %project.id, from = %project.current_phase(), to = %phase, "Set phase");
            project.move_to(phase);
            true
        })
    }

    /// Move one phase forward; nothing happens at the last phase.
    pub fn advance_phase(&mut self, id: &str) -> TrackerResult<Project> {
        self.mutate(id, |project, _| match project.current_phase().next() {
            Some(next) => {
                project.move_to(next);
                true
            }
            None => false,
        })
    }

    // --- Cached outputs and inputs ---

    /// Store `output` for `trigger`, replacing any previous output.
    pub fn save_gem_output(
        &mut self,
        id: &str,
        trigger: ActionTrigger,
        output: &str,
        saved_by: Option<&str>,
    ) -> TrackerResult<Project> {
        self.mutate(id, |project, now| {
            project.gem_outputs.insert(
                trigger,
                GemOutput {
                    output: output.to_string(),
                    saved_at: now,
                    saved_by: saved_by.map(str::to_string),
                },
            );
            true
        })
    }

    /// Store a user input under `key`, replacing any previous input.
    pub fn save_user_input(
        &mut self,
        id: &str,
        key: &str,
        input: UserInputData,
    ) -> TrackerResult<Project> {
        self.mutate(id, |project, now| {
            project.user_inputs.insert(
                key.to_string(),
                UserInput {
                    text: input.text,
                    file_name: input.file_name,
                    file_data: input.file_data,
                    saved_at: now,
                },
            );
            true
        })
    }

    // --- Queries ---

    /// Look up a project.
    pub fn get_project(&self, id: &str) -> Option<&Project> {
        self.collection.projects.get(id)
    }

    /// Look up a project, failing if it does not exist.
    pub fn require_project(&self, id: &str) -> TrackerResult<&Project> {
        self.get_project(id).ok_or_else(|| TrackerError::ProjectNotFound(id.to_string()))
    }

    /// All projects in creation order.
    pub fn list_projects(&self) -> Vec<&Project> {
        let mut projects: Vec<_> = self.collection.projects.values().collect();
        // Sort by created_at, with id as tie-breaker for determinism
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        projects
    }

    /// Projects matching every criterion of `filter`, in creation order.
    pub fn find_projects(&self, filter: &ProjectFilter) -> Vec<&Project> {
        self.list_projects().into_iter().filter(|p| filter.matches(p)).collect()
    }

    /// Projects owned by a research manager (case-insensitive).
    pub fn projects_by_manager(&self, manager: &str) -> Vec<&Project> {
        self.find_projects(&ProjectFilter::default().manager(manager))
    }

    /// Projects currently in `phase`.
    pub fn projects_by_phase(&self, phase: PhaseId) -> Vec<&Project> {
        self.find_projects(&ProjectFilter::default().phase(phase))
    }

    /// Projects with status `active`.
    pub fn active_projects(&self) -> Vec<&Project> {
        self.find_projects(&ProjectFilter::default().active_only())
    }

    /// Cached output of a project for `trigger`.
    pub fn get_gem_output(&self, id: &str, trigger: ActionTrigger) -> Option<&GemOutput> {
        self.get_project(id).and_then(|p| p.gem_output(trigger))
    }

    /// Saved user input of a project for `key`.
    pub fn get_user_input(&self, id: &str, key: &str) -> Option<&UserInput> {
        self.get_project(id).and_then(|p| p.user_input(key))
    }

    /// Number of projects.
    pub fn len(&self) -> usize {
        self.collection.projects.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.collection.projects.is_empty()
    }

    // --- Internals ---

    /// Run `f` on a copy of a project; when it reports a change, refresh
    /// `updated_at` and persist. The collection keeps the old project if the
    /// save fails.
    fn mutate<F>(&mut self, id: &str, f: F) -> TrackerResult<Project>
    where
        F: FnOnce(&mut Project, DateTime<Utc>) -> bool,
    {
        let now = Utc::now();
        let mut updated = self.require_project(id)?.clone();

        if !f(&mut updated, now) {
            return Ok(updated);
        }

        updated.updated_at = now;
        let previous = self.collection.projects.insert(id.to_string(), updated.clone());
        if let Err(e) = self.persist() {
            if let Some(previous) = previous {
                self.collection.projects.insert(id.to_string(), previous);
            }
            tracing::warn!(project = %id, error = %e, "Save failed, change discarded");
            return Err(e);
        }
        Ok(updated)
    }

    fn persist(&mut self) -> TrackerResult<()> {
        self.store.save(&self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::store::MemoryStore;

    fn service() -> ProjectService<MemoryStore> {
        ProjectService::open(MemoryStore::new()).unwrap()
    }

    fn new_project(service: &mut ProjectService<MemoryStore>) -> String {
        service.add_project(NewProject::new("Acme", "Brand Health")).unwrap().id
    }

    #[test]
    fn test_add_project_persists() {
        let mut svc = service();
        let id = new_project(&mut svc);
        assert!(id.starts_with("proj_"));
        assert_eq!(svc.len(), 1);
        assert_eq!(svc.store().save_count(), 1);
        assert!(svc.store().saved().unwrap().projects.contains_key(&id));
    }

    #[test]
    fn test_complete_action_advances_one_phase() {
        let mut svc = service();
        let id = new_project(&mut svc);

        let p = svc
            .complete_action(&id, ActionTrigger::DossierGenerated, "Dossier", Some("ana"))
            .unwrap();
        assert_eq!(p.current_phase(), PhaseId::KickoffMeeting);
        assert_eq!(p.phase_number(), 2);
        assert_eq!(p.completed_actions.len(), 1);
        assert_eq!(p.completed_actions[0].completed_by.as_deref(), Some("ana"));
    }

    #[test]
    fn test_second_trigger_of_same_phase_does_not_advance() {
        let mut svc = service();
        let id = new_project(&mut svc);

        svc.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();
        let p = svc.complete_action(&id, ActionTrigger::ContextResearchDone, "y", None).unwrap();

        assert_eq!(p.current_phase(), PhaseId::KickoffMeeting);
        assert_eq!(p.completed_actions.len(), 2);
    }

    #[test]
    fn test_complete_action_is_idempotent() {
        let mut svc = service();
        let id = new_project(&mut svc);

        let once = svc.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();
        let saves = svc.store().save_count();
        let twice = svc.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();

        assert_eq!(once, twice);
        assert_eq!(svc.store().save_count(), saves);
    }

    #[test]
    fn test_future_trigger_is_logged_without_advancing() {
        let mut svc = service();
        let id = new_project(&mut svc);

        let p = svc.complete_action(&id, ActionTrigger::KoDeckGenerated, "deck", None).unwrap();
        assert_eq!(p.current_phase(), PhaseId::PreKickoff);
        assert!(p.has_completed(ActionTrigger::KoDeckGenerated));

        // Reaching phase 2 then completing anything re-checks phase 2, which is already satisfied
        let p = svc.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();
        assert_eq!(p.current_phase(), PhaseId::KickoffMeeting);
        let p = svc.complete_action(&id, ActionTrigger::ContextResearchDone, "y", None).unwrap();
        assert_eq!(p.current_phase(), PhaseId::BriefingDesign);
    }

    #[test]
    fn test_last_phase_does_not_advance() {
        let mut svc = service();
        let id = new_project(&mut svc);
        svc.set_phase(&id, PhaseId::ReportQc).unwrap();

        let p = svc.complete_action(&id, ActionTrigger::ReportDelivered, "done", None).unwrap();
        assert_eq!(p.current_phase(), PhaseId::ReportQc);
        assert_eq!(p.phase_number(), 8);
    }

    #[test]
    fn test_uncomplete_keeps_phase() {
        let mut svc = service();
        let id = new_project(&mut svc);
        svc.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();

        let p = svc.uncomplete_action(&id, ActionTrigger::DossierGenerated).unwrap();
        assert!(p.completed_actions.is_empty());
        assert_eq!(p.current_phase(), PhaseId::KickoffMeeting);

        // Absent trigger is a no-op
        let saves = svc.store().save_count();
        svc.uncomplete_action(&id, ActionTrigger::QcPassed).unwrap();
        assert_eq!(svc.store().save_count(), saves);
    }

    #[test]
    fn test_set_phase_can_move_backward() {
        let mut svc = service();
        let id = new_project(&mut svc);
        svc.set_phase(&id, PhaseId::AnalysisPlan).unwrap();
        let p = svc.set_phase(&id, PhaseId::KickoffMeeting).unwrap();
        assert_eq!(p.current_phase(), PhaseId::KickoffMeeting);
        assert_eq!(p.phase_number(), 2);
    }

    #[test]
    fn test_advance_phase_stops_at_end() {
        let mut svc = service();
        let id = new_project(&mut svc);
        for _ in 0..20 {
            svc.advance_phase(&id).unwrap();
        }
        let p = svc.get_project(&id).unwrap();
        assert_eq!(p.current_phase(), PhaseId::ReportQc);
        assert_eq!(p.phase_number(), 8);
    }

    #[test]
    fn test_save_gem_output_replaces() {
        let mut svc = service();
        let id = new_project(&mut svc);

        svc.save_gem_output(&id, ActionTrigger::DossierGenerated, "first", None).unwrap();
        let p = svc.save_gem_output(&id, ActionTrigger::DossierGenerated, "second", Some("ana")).unwrap();

        assert_eq!(p.gem_outputs.len(), 1);
        let output = svc.get_gem_output(&id, ActionTrigger::DossierGenerated).unwrap();
        assert_eq!(output.output, "second");
        assert_eq!(output.saved_by.as_deref(), Some("ana"));
    }

    #[test]
    fn test_save_user_input() {
        let mut svc = service();
        let id = new_project(&mut svc);

        svc.save_user_input(
            &id,
            "transcription",
            UserInputData { text: Some("notes".to_string()), ..UserInputData::default() },
        )
        .unwrap();

        let input = svc.get_user_input(&id, "transcription").unwrap();
        assert_eq!(input.text.as_deref(), Some("notes"));
        assert!(input.file_name.is_none());
    }

    #[test]
    fn test_mutations_refresh_updated_at() {
        let mut svc = service();
        let id = new_project(&mut svc);
        let created = svc.get_project(&id).unwrap().updated_at;

        let p = svc.save_gem_output(&id, ActionTrigger::TxtGenerated, "txt", None).unwrap();
        assert!(p.updated_at >= created);
        assert_eq!(p.created_at, created);
    }

    #[test]
    fn test_unknown_project_is_not_found_and_changes_nothing() {
        let mut svc = service();
        new_project(&mut svc);
        let saves = svc.store().save_count();

        let err = svc.complete_action("proj_missing", ActionTrigger::QcPassed, "x", None);
        assert!(matches!(err, Err(TrackerError::ProjectNotFound(_))));
        assert!(svc.advance_phase("proj_missing").is_err());
        assert!(svc.set_phase("proj_missing", PhaseId::ReportQc).is_err());
        assert!(svc.save_gem_output("proj_missing", ActionTrigger::QcPassed, "x", None).is_err());
        assert!(svc.delete_project("proj_missing").is_err());
        assert_eq!(svc.store().save_count(), saves);
    }

    #[test]
    fn test_queries() {
        let mut svc = service();
        let mut a = NewProject::new("Acme", "A");
        a.research_manager = "Ana Lopez".to_string();
        let a = svc.add_project(a).unwrap().id;
        let mut b = NewProject::new("Globex", "B");
        b.research_manager = "Luis".to_string();
        let b = svc.add_project(b).unwrap().id;

        svc.set_status(&b, ProjectStatus::OnHold).unwrap();
        svc.advance_phase(&a).unwrap();

        assert_eq!(svc.projects_by_manager("ana lopez").len(), 1);
        assert_eq!(svc.active_projects().len(), 1);
        assert_eq!(svc.projects_by_phase(PhaseId::KickoffMeeting)[0].id, a);
        assert_eq!(svc.list_projects().len(), 2);

        svc.delete_project(&a).unwrap();
        assert!(svc.get_project(&a).is_none());
        assert_eq!(svc.len(), 1);
    }

    /// Store whose saves fail once `broken` is set.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: bool,
    }

    impl ProjectStore for FlakyStore {
        fn load(&self) -> TrackerResult<ProjectCollection> {
            self.inner.load()
        }

        fn save(&mut self, collection: &ProjectCollection) -> TrackerResult<()> {
            if self.broken {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.save(collection)
        }
    }

    #[test]
    fn test_failed_save_discards_change() {
        let mut svc = ProjectService::open(FlakyStore::default()).unwrap();
        let id = svc.add_project(NewProject::new("Acme", "Pulse")).unwrap().id;
        let before = svc.get_project(&id).unwrap().clone();
        svc.store.broken = true;

        let err = svc.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap_err();
        assert!(matches!(err, TrackerError::Io(_)));
        assert_eq!(svc.get_project(&id), Some(&before));

        assert!(svc.add_project(NewProject::new("Globex", "U&A")).is_err());
        assert_eq!(svc.len(), 1);
        assert!(svc.delete_project(&id).is_err());
        assert_eq!(svc.get_project(&id), Some(&before));

        // Nothing from the failed calls reaches the next successful save
        svc.store.broken = false;
        svc.set_status(&id, ProjectStatus::OnHold).unwrap();
        let saved = &svc.store().inner.saved().unwrap().projects[&id];
        assert!(saved.completed_actions.is_empty());
        assert_eq!(saved.current_phase(), PhaseId::PreKickoff);
    }

    #[test]
    fn test_find_projects_combines_criteria() {
        let mut svc = service();
        let mut data = NewProject::new("Acme", "Pulse");
        data.research_manager = "Ana Lopez".to_string();
        let a = svc.add_project(data.clone()).unwrap().id;
        let b = svc.add_project(data).unwrap().id;
        svc.set_phase(&b, PhaseId::KickoffMeeting).unwrap();
        svc.set_status(&a, ProjectStatus::OnHold).unwrap();

        let filter = ProjectFilter::default().manager("ANA LOPEZ");
        assert_eq!(svc.find_projects(&filter).len(), 2);

        let filter = filter.active_only();
        let found: Vec<_> = svc.find_projects(&filter).iter().map(|p| p.id.clone()).collect();
        assert_eq!(found, vec![b.clone()]);

        let filter = filter.phase(PhaseId::PreKickoff);
        assert!(svc.find_projects(&filter).is_empty());
        assert_eq!(svc.find_projects(&ProjectFilter::default()).len(), 2);
    }

    #[test]
    fn test_open_recomputes_phase_number() {
        let mut svc = service();
        let id = new_project(&mut svc);
        svc.set_phase(&id, PhaseId::LaunchMonitoring).unwrap();

        let mut raw = serde_json::to_value(svc.store().saved().unwrap()).unwrap();
        raw["projects"][&id]["phaseNumber"] = serde_json::json!(1);
        let collection: ProjectCollection = serde_json::from_value(raw).unwrap();

        let reopened = ProjectService::open(MemoryStore::with_collection(collection)).unwrap();
        assert_eq!(reopened.get_project(&id).unwrap().phase_number(), 5);
    }
}
