//! Interview state (Aggregate Root)
//!
//! Holds the requested fields, the turn stats and the completion latch.
//! The only mutation path for a turn is [`InterviewState::apply`]; the
//! caller keeps the previous value intact by applying to a copy via
//! [`InterviewState::applied`].
//!
//! ```text
//! ACTIVE (is_done = false) ──mark_interview_complete──▶ DONE (is_done = true)
//! ```
//!
//! Oracle output is untrusted content, so data-referential problems
//! (duplicate keys on creation, unknown keys on update) are collected in a
//! [`TurnReport`] instead of failing the turn.

use super::category::IntakeDomain;
use super::field::{FieldRequest, IntakeField};
use super::health_data::{HealthData, HealthDataEntry};
use super::stats::TurnStats;
use super::turn::{InterviewTurn, PostInterviewTurn, TurnDecision, ValueUpdate};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Outcome of applying one decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Keys of fields created this turn.
    pub created: Vec<String>,
    /// Keys of fields whose value was set this turn.
    pub updated: Vec<String>,
    /// Swallowed data-referential failures, in order of occurrence.
    pub rejected: Vec<DomainError>,
    /// Domain the turn was counted against.
    pub recorded_domain: Option<IntakeDomain>,
    /// Domains latched complete by this turn (first time only).
    pub newly_completed: Vec<IntakeDomain>,
    /// Whether this turn latched the interview as done.
    pub became_done: bool,
}

impl TurnReport {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Accumulated intake data of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StateRecord")]
pub struct InterviewState {
    fields: Vec<IntakeField>,
    stats: TurnStats,
    is_done: bool,
    /// Key of the field that most recently received a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Persisted shape, normalized on load.
#[derive(Deserialize)]
struct StateRecord {
    #[serde(default)]
    fields: Vec<IntakeField>,
    #[serde(default)]
    stats: TurnStats,
    #[serde(default)]
    is_done: bool,
    #[serde(default)]
    last_updated: Option<String>,
}

impl From<StateRecord> for InterviewState {
    fn from(record: StateRecord) -> Self {
        let mut stats = record.stats;
        stats.fill_missing_domains();
        Self {
            fields: record.fields,
            stats,
            is_done: record.is_done,
            last_updated: record.last_updated,
        }
    }
}

impl Default for InterviewState {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewState {
    /// Fresh state: no fields, zeroed stats, active.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            stats: TurnStats::new(),
            is_done: false,
            last_updated: None,
        }
    }

    // ==================== Queries ====================

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn stats(&self) -> &TurnStats {
        &self.stats
    }

    /// All fields in the order they were requested.
    pub fn fields(&self) -> &[IntakeField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&IntakeField> {
        self.fields.iter().find(|f| f.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn collected_fields(&self) -> impl Iterator<Item = &IntakeField> {
        self.fields.iter().filter(|f| f.is_collected())
    }

    pub fn pending_fields(&self) -> impl Iterator<Item = &IntakeField> {
        self.fields.iter().filter(|f| !f.is_collected())
    }

    /// Field that most recently received a value. States saved without
    /// that key fall back to the last collected field in request order.
    pub fn latest_collected(&self) -> Option<&IntakeField> {
        self.last_updated
            .as_deref()
            .and_then(|key| self.field(key))
            .filter(|f| f.is_collected())
            .or_else(|| self.collected_fields().last())
    }

    /// Most recently requested field still waiting for a value.
    pub fn latest_pending(&self) -> Option<&IntakeField> {
        self.pending_fields().last()
    }

    /// Collected fields grouped by domain.
    pub fn to_health_data(&self) -> HealthData {
        let mut data = HealthData::new();
        for field in self.collected_fields() {
            data.entry(field.domain())
                .or_default()
                .insert(field.key().to_string(), HealthDataEntry::from(field));
        }
        data
    }

    // ==================== Field catalog ====================

    /// Add a pending field. Fails if the key is already present.
    pub fn create_field(&mut self, request: FieldRequest) -> Result<(), DomainError> {
        if self.contains(&request.spec.key) {
            return Err(DomainError::DuplicateField(request.spec.key));
        }
        self.fields.push(IntakeField::from_request(request));
        Ok(())
    }

    /// Set the value of an existing field. Fails if the key was never requested.
    pub fn apply_value(&mut self, update: &ValueUpdate) -> Result<(), DomainError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.key() == update.key)
            .ok_or_else(|| DomainError::UnknownField(update.key.clone()))?;
        field.set_value(&update.value)?;
        self.last_updated = Some(update.key.clone());
        Ok(())
    }

    /// Latch the interview as done.
    pub fn mark_done(&mut self) {
        self.is_done = true;
    }

    // ==================== Turn application ====================

    /// Apply a decision under whichever contract produced it.
    pub fn apply(&mut self, decision: &TurnDecision) -> TurnReport {
        match decision {
            TurnDecision::Interview(turn) => self.apply_interview_turn(turn),
            TurnDecision::PostInterview(turn) => self.apply_post_interview_turn(turn),
        }
    }

    /// Apply a decision to a copy, leaving `self` untouched.
    pub fn applied(&self, decision: &TurnDecision) -> (Self, TurnReport) {
        let mut next = self.clone();
        let report = next.apply(decision);
        (next, report)
    }

    /// Apply an active-interview decision.
    ///
    /// Creation runs before value updates so an update can target a field
    /// created by the same decision. Exactly one turn is recorded, against
    /// the domain of the next field selection.
    pub fn apply_interview_turn(&mut self, turn: &InterviewTurn) -> TurnReport {
        let mut report = TurnReport::default();

        for request in &turn.new_fields_to_collect {
            let key = request.spec.key.clone();
            match self.create_field(request.clone()) {
                Ok(()) => report.created.push(key),
                Err(e) => report.rejected.push(e),
            }
        }

        self.apply_updates(&turn.value_updates, &mut report);
        self.record_turn(turn.next_field_selection.domain, &mut report);

        let mut domains = turn.domains_to_mark_complete.clone();
        domains.sort();
        domains.dedup();
        for domain in domains {
            let already = self
                .stats
                .domain(domain)
                .is_some_and(|s| s.is_completed());
            match self.stats.mark_completed(domain) {
                Ok(()) if !already => report.newly_completed.push(domain),
                Ok(()) => {}
                Err(e) => report.rejected.push(e),
            }
        }

        if turn.mark_interview_complete && !self.is_done {
            self.is_done = true;
            report.became_done = true;
        }

        report
    }

    /// Apply a post-interview decision: value updates and one recorded turn.
    pub fn apply_post_interview_turn(&mut self, turn: &PostInterviewTurn) -> TurnReport {
        let mut report = TurnReport::default();
        self.apply_updates(&turn.value_updates, &mut report);
        self.record_turn(turn.next_field_selection.domain, &mut report);
        report
    }

    fn apply_updates(&mut self, updates: &[ValueUpdate], report: &mut TurnReport) {
        for update in updates {
            match self.apply_value(update) {
                Ok(()) => report.updated.push(update.key.clone()),
                Err(e) => report.rejected.push(e),
            }
        }
    }

    fn record_turn(&mut self, domain: IntakeDomain, report: &mut TurnReport) {
        match self.stats.record_turn(domain) {
            Ok(()) => report.recorded_domain = Some(domain),
            Err(e) => report.rejected.push(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::field::{FieldSpec, TO_COLLECT, ValueType};
    use crate::intake::turn::NextFieldSelection;

    fn sleep_request() -> FieldRequest {
        FieldRequest::new(
            FieldSpec::new(
                "sleep_hours",
                "Sleep hours",
                IntakeDomain::Sleep,
                ValueType::BucketedChoice,
            )
            .with_option("lt4h", "<4h")
            .with_option("4to6h", "4-6h")
            .with_option("6to8h", "6-8h")
            .with_option("gt8h", ">8h"),
            "User provided this information unprompted",
        )
    }

    fn smoker_request() -> FieldRequest {
        FieldRequest::new(
            FieldSpec::new(
                "is_smoker",
                "Smoker",
                IntakeDomain::SubstanceUse,
                ValueType::YesNo,
            ),
            "Baseline substance use",
        )
    }

    fn ask(key: &str, domain: IntakeDomain) -> InterviewTurn {
        InterviewTurn::new(NextFieldSelection::new(key, domain), "Next question?")
    }

    #[test]
    fn test_new_state_is_empty_and_active() {
        let state = InterviewState::new();
        assert!(state.fields().is_empty());
        assert!(!state.is_done());
        assert_eq!(state.stats().total_turns(), 0);
    }

    #[test]
    fn test_create_then_update_in_same_turn() {
        let mut state = InterviewState::new();
        let turn = ask("sleep_quality", IntakeDomain::Sleep)
            .with_field(sleep_request())
            .with_update(ValueUpdate::new("sleep_hours", "6to8h"));

        let report = state.apply_interview_turn(&turn);

        let field = state.field("sleep_hours").unwrap();
        assert!(field.is_collected());
        assert_eq!(field.value(), "6to8h");
        assert_eq!(report.created, vec!["sleep_hours".to_string()]);
        assert_eq!(report.updated, vec!["sleep_hours".to_string()]);
        assert!(!report.has_rejections());
    }

    #[test]
    fn test_one_turn_recorded_regardless_of_field_count() {
        let mut state = InterviewState::new();
        let turn = ask("is_smoker", IntakeDomain::SubstanceUse)
            .with_field(sleep_request())
            .with_field(smoker_request())
            .with_update(ValueUpdate::new("sleep_hours", "4to6h"));

        state.apply_interview_turn(&turn);

        assert_eq!(state.stats().total_turns(), 1);
        assert_eq!(
            state.stats().domain(IntakeDomain::SubstanceUse).unwrap().turns(),
            1
        );
        assert_eq!(state.stats().domain(IntakeDomain::Sleep).unwrap().turns(), 0);
    }

    #[test]
    fn test_unknown_key_update_is_noop_but_counts_turn() {
        let mut state = InterviewState::new();
        let turn = ask("sleep_hours", IntakeDomain::Sleep)
            .with_update(ValueUpdate::new("never_created", "yes"));

        let report = state.apply_interview_turn(&turn);

        assert!(state.fields().is_empty());
        assert_eq!(state.stats().domain(IntakeDomain::Sleep).unwrap().turns(), 1);
        assert_eq!(
            report.rejected,
            vec![DomainError::UnknownField("never_created".to_string())]
        );
    }

    #[test]
    fn test_duplicate_creation_is_swallowed() {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &ask("sleep_hours", IntakeDomain::Sleep).with_field(sleep_request()),
        );
        state
            .apply_value(&ValueUpdate::new("sleep_hours", "lt4h"))
            .unwrap();

        let report = state.apply_interview_turn(
            &ask("sleep_hours", IntakeDomain::Sleep).with_field(sleep_request()),
        );

        assert_eq!(state.fields().len(), 1);
        // The original field keeps its value
        assert_eq!(state.field("sleep_hours").unwrap().value(), "lt4h");
        assert_eq!(
            report.rejected,
            vec![DomainError::DuplicateField("sleep_hours".to_string())]
        );
        assert_eq!(state.stats().total_turns(), 2);
    }

    #[test]
    fn test_domain_completion_is_idempotent() {
        let mut state = InterviewState::new();
        let turn = ask("diet_type", IntakeDomain::Nutrition)
            .with_completed_domain(IntakeDomain::Sleep)
            .with_completed_domain(IntakeDomain::Sleep);

        let first = state.apply_interview_turn(&turn);
        let second = state.apply_interview_turn(&turn);

        assert!(state.stats().domain(IntakeDomain::Sleep).unwrap().is_completed());
        assert_eq!(first.newly_completed, vec![IntakeDomain::Sleep]);
        assert!(second.newly_completed.is_empty());
        assert!(!second.has_rejections());
    }

    #[test]
    fn test_is_done_latches() {
        let mut state = InterviewState::new();
        let report = state.apply_interview_turn(
            &ask("main_goal", IntakeDomain::Lifestyle).with_interview_complete(),
        );
        assert!(report.became_done);
        assert!(state.is_done());

        let report = state.apply_interview_turn(&ask("main_goal", IntakeDomain::Lifestyle));
        assert!(!report.became_done);
        assert!(state.is_done());
    }

    #[test]
    fn test_post_interview_turn_updates_values_only() {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_field(smoker_request())
                .with_interview_complete(),
        );

        let turn = PostInterviewTurn::new(
            NextFieldSelection::new("is_smoker", IntakeDomain::SubstanceUse),
            "Anything else you want to update?",
        )
        .with_update(ValueUpdate::new("is_smoker", "no"))
        .with_update(ValueUpdate::new("unknown", "x"));

        let report = state.apply(&turn.into());

        assert_eq!(state.field("is_smoker").unwrap().value(), "no");
        assert_eq!(report.updated, vec!["is_smoker".to_string()]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(state.stats().total_turns(), 2);
        assert!(state.is_done());
    }

    #[test]
    fn test_applied_does_not_mutate_input() {
        let state = InterviewState::new();
        let decision: TurnDecision = ask("sleep_hours", IntakeDomain::Sleep)
            .with_field(sleep_request())
            .into();

        let (next, _) = state.applied(&decision);

        assert!(state.fields().is_empty());
        assert_eq!(state.stats().total_turns(), 0);
        assert_eq!(next.fields().len(), 1);
        assert_eq!(next.stats().total_turns(), 1);
    }

    #[test]
    fn test_collected_and_pending_partition() {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_field(sleep_request())
                .with_field(smoker_request())
                .with_update(ValueUpdate::new("sleep_hours", "4to6h")),
        );

        let collected: Vec<_> = state.collected_fields().map(|f| f.key()).collect();
        let pending: Vec<_> = state.pending_fields().map(|f| f.key()).collect();
        assert_eq!(collected, vec!["sleep_hours"]);
        assert_eq!(pending, vec!["is_smoker"]);
        assert_eq!(state.latest_collected().unwrap().key(), "sleep_hours");
        assert_eq!(state.latest_pending().unwrap().value(), TO_COLLECT);
    }

    #[test]
    fn test_latest_collected_follows_last_update() {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_field(sleep_request())
                .with_field(smoker_request())
                .with_update(ValueUpdate::new("sleep_hours", "4to6h"))
                .with_update(ValueUpdate::new("is_smoker", "no")),
        );
        assert_eq!(state.latest_collected().unwrap().key(), "is_smoker");

        // A correction to an earlier field moves it to the front
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_update(ValueUpdate::new("sleep_hours", "6to8h")),
        );
        assert_eq!(state.latest_collected().unwrap().key(), "sleep_hours");

        // Rejected updates leave it alone
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_update(ValueUpdate::new("missing_key", "x")),
        );
        assert_eq!(state.latest_collected().unwrap().key(), "sleep_hours");

        let json = serde_json::to_string(&state).unwrap();
        let restored: InterviewState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.latest_collected().unwrap().key(), "sleep_hours");
    }

    #[test]
    fn test_health_data_groups_collected_by_domain() {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_field(sleep_request())
                .with_field(smoker_request())
                .with_update(ValueUpdate::new("sleep_hours", "4to6h")),
        );

        let data = state.to_health_data();
        assert_eq!(data.len(), 1);
        let entry = &data[&IntakeDomain::Sleep]["sleep_hours"];
        assert_eq!(entry.value, "4to6h");
        assert_eq!(entry.rationale, "User provided this information unprompted");
        assert!(entry.options.as_ref().unwrap().contains_key("6to8h"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut state = InterviewState::new();
        state.apply_interview_turn(
            &ask("is_smoker", IntakeDomain::SubstanceUse)
                .with_field(sleep_request())
                .with_field(smoker_request())
                .with_update(ValueUpdate::new("sleep_hours", "gt8h"))
                .with_completed_domain(IntakeDomain::Sleep)
                .with_interview_complete(),
        );

        let json = serde_json::to_string(&state).unwrap();
        let restored: InterviewState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.fields()[0].key(), "sleep_hours");
        assert_eq!(restored.fields()[1].key(), "is_smoker");
    }

    #[test]
    fn test_deserialize_fills_missing_domains() {
        let restored: InterviewState = serde_json::from_value(serde_json::json!({
            "fields": [],
            "stats": { "total_turns": 3, "total_target": 30, "domain_stats": {} },
            "is_done": false
        }))
        .unwrap();
        assert_eq!(restored.stats().total_turns(), 3);
        for domain in IntakeDomain::ALL {
            assert!(restored.stats().domain(domain).is_some());
        }
    }

    #[test]
    fn test_deserialize_empty_object_is_fresh_state() {
        let restored: InterviewState = serde_json::from_str("{}").unwrap();
        assert_eq!(restored, InterviewState::new());
    }
}
