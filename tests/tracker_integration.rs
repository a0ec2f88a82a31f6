//! Tracker Integration Tests
//!
//! Exercises the project service against the JSON file store.

use chrono::{Datelike, NaiveDate, Weekday};
use rxhub::schedule::{add_business_days, calculate_delivery_dates};
use rxhub::survey::{self, PREAMBLE};
use rxhub::tracker::{
    included_phases, ActionTrigger, JsonFileStore, NewProject, PhaseId, ProjectService,
    ProjectStore, TrackerError, PHASES,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> ProjectService<JsonFileStore> {
    ProjectService::open(JsonFileStore::new(dir.path().join("projects.json"))).unwrap()
}

fn assert_phase_number_matches(service: &ProjectService<JsonFileStore>) {
    for project in service.list_projects() {
        assert_eq!(project.phase_number(), project.current_phase().config().number);
    }
}

// ============================================================================
// Phase Tracker
// ============================================================================

mod phase_tracker {
    use super::*;

    #[test]
    fn test_same_phase_triggers_advance_once() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Acme", "Brand Health")).unwrap().id;

        service.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();
        let project =
            service.complete_action(&id, ActionTrigger::ContextResearchDone, "y", None).unwrap();

        assert_eq!(project.current_phase(), PhaseId::KickoffMeeting);
        assert_eq!(project.phase_number(), 2);
        assert_eq!(project.completed_actions.len(), 2);
    }

    #[test]
    fn test_complete_action_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Acme", "Pulse")).unwrap().id;

        let once = service.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();
        let twice =
            service.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();

        assert_eq!(once.completed_actions.len(), twice.completed_actions.len());
        assert_eq!(once.current_phase(), twice.current_phase());
        assert_eq!(once.phase_number(), twice.phase_number());
        assert_eq!(once.updated_at, twice.updated_at);
    }

    #[test]
    fn test_earlier_phase_triggers_never_move_backwards() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Acme", "Pulse")).unwrap().id;
        service.set_phase(&id, PhaseId::LaunchMonitoring).unwrap();

        let mut last = service.require_project(&id).unwrap().phase_number();
        for trigger in ActionTrigger::ALL.into_iter().filter(|t| t.phase() < PhaseId::LaunchMonitoring) {
            let project = service.complete_action(&id, trigger, "done", Some("qa")).unwrap();
            assert!(project.phase_number() >= last);
            last = project.phase_number();
        }

        assert_eq!(last, 5);
        assert_phase_number_matches(&service);
    }

    #[test]
    fn test_walk_every_phase() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Acme", "Tracker")).unwrap().id;

        for phase in &PHASES {
            let project = service.require_project(&id).unwrap();
            assert_eq!(project.current_phase(), phase.id);
            service.complete_action(&id, phase.triggers[0], "done", None).unwrap();
        }

        let project = service.require_project(&id).unwrap();
        assert_eq!(project.current_phase(), PhaseId::ReportQc);
        assert_eq!(project.completed_actions.len(), PHASES.len());
        assert_eq!(project.progress_percent(), 100);
    }

    #[test]
    fn test_undo_keeps_phase() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Acme", "Pulse")).unwrap().id;

        service.complete_action(&id, ActionTrigger::DossierGenerated, "x", None).unwrap();
        let project = service.uncomplete_action(&id, ActionTrigger::DossierGenerated).unwrap();

        assert!(project.completed_actions.is_empty());
        assert_eq!(project.current_phase(), PhaseId::KickoffMeeting);
    }

    #[test]
    fn test_unknown_project_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        service.add_project(NewProject::new("Acme", "Pulse")).unwrap();
        let before = std::fs::read_to_string(dir.path().join("projects.json")).unwrap();

        let err = service
            .complete_action("proj_missing", ActionTrigger::DossierGenerated, "x", None)
            .unwrap_err();
        assert!(matches!(err, TrackerError::ProjectNotFound(ref id) if id == "proj_missing"));
        assert!(service.advance_phase("proj_missing").is_err());

        let after = std::fs::read_to_string(dir.path().join("projects.json")).unwrap();
        assert_eq!(before, after);
    }
}

// ============================================================================
// Persistence
// ============================================================================

mod persistence {
    use super::*;

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();

        let id = {
            let mut service = open(&dir);
            let id = service.add_project(NewProject::new("Globex", "U&A")).unwrap().id;
            service.complete_action(&id, ActionTrigger::DossierGenerated, "x", Some("ana")).unwrap();
            service
                .save_gem_output(&id, ActionTrigger::DossierGenerated, "# Dossier", Some("ana"))
                .unwrap();
            id
        };

        let service = open(&dir);
        let project = service.require_project(&id).unwrap();
        assert_eq!(project.current_phase(), PhaseId::KickoffMeeting);
        assert_eq!(project.completed_actions[0].completed_by.as_deref(), Some("ana"));
        assert_eq!(
            service.get_gem_output(&id, ActionTrigger::DossierGenerated).map(|o| o.output.as_str()),
            Some("# Dossier")
        );
        assert_phase_number_matches(&service);
    }

    #[test]
    fn test_gem_output_replaced_not_duplicated() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Globex", "U&A")).unwrap().id;

        service.save_gem_output(&id, ActionTrigger::KoDeckGenerated, "v1", None).unwrap();
        let project = service.save_gem_output(&id, ActionTrigger::KoDeckGenerated, "v2", None).unwrap();

        assert_eq!(project.gem_outputs.len(), 1);
        assert_eq!(project.gem_outputs[&ActionTrigger::KoDeckGenerated].output, "v2");
    }

    #[test]
    fn test_delete_persists() {
        let dir = TempDir::new().unwrap();
        let mut service = open(&dir);
        let id = service.add_project(NewProject::new("Initech", "NPS")).unwrap().id;
        service.delete_project(&id).unwrap();

        let collection = JsonFileStore::new(dir.path().join("projects.json")).load().unwrap();
        assert!(collection.projects.is_empty());
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("projects.json"), "{not json").unwrap();

        let result = ProjectService::open(JsonFileStore::new(dir.path().join("projects.json")));
        assert!(matches!(result, Err(TrackerError::Serialization(_))));
    }
}

// ============================================================================
// Service phases, converter and calendar
// ============================================================================

#[test]
fn test_included_phases_is_deterministic() {
    for service_type in ["Full Service", "Sample Only + Reporting", "reporting", "Unknown"] {
        assert_eq!(included_phases(&[], Some(service_type)), included_phases(&[], Some(service_type)));
    }
}

#[test]
fn test_converter_numbers_questions_and_choices() {
    let txt = survey::convert("Q1. Age?\n- 18-24\n- 25-34\nQ2. Gender?\n- Male\n- Female");
    let lines: Vec<&str> = txt.split('\n').collect();

    assert_eq!(&lines[..PREAMBLE.len() - 1], &PREAMBLE[..PREAMBLE.len() - 1]);
    assert_eq!(lines.iter().filter(|l| l.starts_with("[[Question:")).count(), 2);
    assert_eq!(lines.iter().filter(|l| **l == "[[Choice]]").count(), 4);

    let q1 = lines.iter().position(|l| *l == "[[Question:MC:Q1]]").unwrap();
    let q2 = lines.iter().position(|l| *l == "[[Question:MC:Q2]]").unwrap();
    assert_eq!(&lines[q1 + 2..q1 + 6], &["[[Choice]]", "18-24", "[[Choice]]", "25-34"]);
    assert_eq!(&lines[q2 + 2..q2 + 6], &["[[Choice]]", "Male", "[[Choice]]", "Female"]);
}

#[test]
fn test_friday_plus_one_business_day_is_monday() {
    let friday = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
    assert_eq!(friday.weekday(), Weekday::Fri);
    assert_eq!(add_business_days(friday, 1), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
}

#[test]
fn test_delivery_dates_are_ordered() {
    let mut kickoff = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    while kickoff.year() == 2024 {
        let deliveries = calculate_delivery_dates(kickoff);
        assert_eq!(deliveries[0].phase.key, "pre-kickoff");
        assert_eq!(deliveries[0].date, kickoff);
        assert!(deliveries.windows(2).all(|w| w[0].date <= w[1].date));
        kickoff = kickoff + chrono::Duration::days(13);
    }
}
