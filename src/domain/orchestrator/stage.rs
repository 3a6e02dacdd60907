//! Per-query pipeline state machine

use serde::Serialize;

use crate::domain::{Domain, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Classified,
    EvidenceGathered,
    Synthesized,
    Enhanced,
    Evaluated,
    Done,
}

impl PipelineStage {
    /// Allowed transitions. General queries skip evidence gathering and the
    /// crisis path skips synthesis entirely.
    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;

        matches!(
            (self, next),
            (Received, Classified)
                | (Classified, EvidenceGathered)
                | (Classified, Synthesized)
                | (Classified, Enhanced)
                | (EvidenceGathered, Synthesized)
                | (Synthesized, Enhanced)
                | (Enhanced, Evaluated)
                | (Evaluated, Done)
        )
    }
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::EvidenceGathered => "evidence_gathered",
            Self::Synthesized => "synthesized",
            Self::Enhanced => "enhanced",
            Self::Evaluated => "evaluated",
            Self::Done => "done",
        }
    }
}

/// Tracks the stages a query has passed through
///
/// Parallel branches are kept as forks off the stage they started from.
#[derive(Debug, Clone)]
pub struct StageTracker {
    history: Vec<PipelineStage>,
    forks: Vec<Fork>,
}

#[derive(Debug, Clone)]
struct Fork {
    /// Index in `history` of the stage the branches forked from
    at: usize,
    branches: Vec<(Domain, Vec<PipelineStage>)>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::starting_at(PipelineStage::Received)
    }
}

impl StageTracker {
    /// Tracker for a branch that forks off an already classified query
    pub fn starting_at(stage: PipelineStage) -> Self {
        Self {
            history: vec![stage],
            forks: Vec::new(),
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineStage::Received)
    }

    pub fn advance(&mut self, next: PipelineStage) -> Result<(), DomainError> {
        let current = self.current();
        if !current.can_advance_to(next) {
            return Err(DomainError::internal(format!(
                "Invalid pipeline transition {:?} -> {:?}",
                current, next
            )));
        }
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    /// Merge branch trackers that started from the current stage
    ///
    /// A single branch is spliced into the history. Several branches are
    /// recorded as a fork and must all end on the same stage.
    pub fn join(&mut self, branches: &[(Domain, &StageTracker)]) -> Result<(), DomainError> {
        let current = self.current();
        let mut end = None;
        for (domain, branch) in branches {
            if branch.history.first() != Some(&current) {
                return Err(DomainError::internal(format!(
                    "{} branch did not start at {:?}",
                    domain, current
                )));
            }
            let last = branch.current();
            if end.is_some_and(|e| e != last) {
                return Err(DomainError::internal(format!(
                    "{} branch ended at {:?}, expected {:?}",
                    domain, last, end
                )));
            }
            end = Some(last);
        }

        match branches {
            [] => Ok(()),
            [(_, branch)] => {
                self.history.extend_from_slice(&branch.history[1..]);
                Ok(())
            }
            _ => {
                let Some(end) = end else {
                    return Ok(());
                };
                self.forks.push(Fork {
                    at: self.history.len() - 1,
                    branches: branches
                        .iter()
                        .map(|(domain, branch)| (*domain, branch.history[1..].to_vec()))
                        .collect(),
                });
                self.history.push(end);
                Ok(())
            }
        }
    }

    /// Readable path, e.g. `received > classified > [finance: ... | medical: ...] > evaluated`
    pub fn describe(&self) -> String {
        let mut parts = Vec::with_capacity(self.history.len());
        for (i, stage) in self.history.iter().enumerate() {
            let forked_into = self
                .forks
                .iter()
                .find(|f| f.at + 1 == i)
                .map(|f| &f.branches);
            match forked_into {
                Some(branches) => {
                    let branches: Vec<String> = branches
                        .iter()
                        .map(|(domain, stages)| {
                            let stages: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
                            format!("{}: {}", domain, stages.join(" > "))
                        })
                        .collect();
                    parts.push(format!("[{}]", branches.join(" | ")));
                }
                None => parts.push(stage.as_str().to_string()),
            }
        }
        parts.join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineStage::*;

    #[test]
    fn test_full_specialized_path() {
        let mut tracker = StageTracker::default();
        for stage in [Classified, EvidenceGathered, Synthesized, Enhanced, Evaluated, Done] {
            tracker.advance(stage).unwrap();
        }
        assert_eq!(tracker.current(), Done);
        assert_eq!(tracker.history().len(), 7);
    }

    #[test]
    fn test_general_and_crisis_shortcuts() {
        assert!(Classified.can_advance_to(Synthesized));
        assert!(Classified.can_advance_to(Enhanced));
    }

    fn branch() -> StageTracker {
        let mut branch = StageTracker::starting_at(Classified);
        for stage in [EvidenceGathered, Synthesized, Enhanced] {
            branch.advance(stage).unwrap();
        }
        branch
    }

    fn classified() -> StageTracker {
        let mut tracker = StageTracker::default();
        tracker.advance(Classified).unwrap();
        tracker
    }

    #[test]
    fn test_single_branch_spliced_into_history() {
        let mut tracker = classified();
        tracker.join(&[(Domain::Medical, &branch())]).unwrap();
        tracker.advance(Evaluated).unwrap();

        assert_eq!(
            tracker.history(),
            &[Received, Classified, EvidenceGathered, Synthesized, Enhanced, Evaluated]
        );
        assert_eq!(
            tracker.describe(),
            "received > classified > evidence_gathered > synthesized > enhanced > evaluated"
        );
    }

    #[test]
    fn test_parallel_branches_recorded_as_fork() {
        let mut tracker = classified();
        let (finance, medical) = (branch(), branch());
        tracker
            .join(&[(Domain::Finance, &finance), (Domain::Medical, &medical)])
            .unwrap();
        tracker.advance(Evaluated).unwrap();
        tracker.advance(Done).unwrap();

        assert_eq!(tracker.current(), Done);
        assert_eq!(
            tracker.describe(),
            "received > classified > [finance: evidence_gathered > synthesized > enhanced | \
             medical: evidence_gathered > synthesized > enhanced] > evaluated > done"
        );
    }

    #[test]
    fn test_join_rejects_mismatched_branches() {
        let mut tracker = StageTracker::default();
        assert!(tracker.join(&[(Domain::Finance, &branch())]).is_err());

        let mut tracker = classified();
        let mut short = StageTracker::starting_at(Classified);
        short.advance(EvidenceGathered).unwrap();
        assert!(
            tracker
                .join(&[(Domain::Finance, &branch()), (Domain::Medical, &short)])
                .is_err()
        );
        assert_eq!(tracker.current(), Classified);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut tracker = StageTracker::default();
        assert!(tracker.advance(Synthesized).is_err());
        assert_eq!(tracker.current(), Received);
        assert!(!Done.can_advance_to(Received));
    }
}
