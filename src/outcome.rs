//! Continue-on-error aggregation of per-repository steps.
//!
//! Orchestrator commands attempt every repository even when some fail. Each
//! attempt becomes a [`StepRecord`]; the command succeeds only if every
//! record does. Logging happens where the step runs, so the aggregation here
//! stays free of output concerns.

/// Folds per-item success flags into an overall result.
///
/// An empty sequence counts as success.
pub fn all_succeeded<I>(results: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    results.into_iter().fold(true, |acc, ok| acc && ok)
}

/// Result of one step for one subject (usually a repository uri).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub subject: String,
    pub outcome: Result<(), String>,
}

impl StepRecord {
    pub fn success(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            outcome: Ok(()),
        }
    }

    pub fn failure(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            outcome: Err(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Ordered records of a whole command run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    records: Vec<StepRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|r| !r.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        all_succeeded(self.records.iter().map(StepRecord::is_success))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<StepRecord> for RunReport {
    fn from_iter<T: IntoIterator<Item = StepRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<StepRecord> for RunReport {
    fn extend<T: IntoIterator<Item = StepRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}
