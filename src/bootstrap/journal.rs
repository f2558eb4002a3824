//! 阶段日志：记录实际执行过的阶段，并可与固定顺序比对

use super::phase::Phase;
use crate::errors::BootstrapError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// 单个阶段的执行记录
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub duration_us: u128,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseJournal {
    records: Vec<PhaseRecord>,
}

impl PhaseJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个阶段；同一阶段出现两次视为顺序违规
    pub fn record(
        &mut self,
        phase: Phase,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Result<(), BootstrapError> {
        if self.contains(phase) {
            return Err(BootstrapError::PhaseOrder {
                expected: format!("{} to run once", phase),
                found: format!("{} repeated", phase),
            });
        }
        self.records.push(PhaseRecord {
            phase,
            started_at,
            duration_us: duration.as_micros(),
        });
        Ok(())
    }

    pub fn records(&self) -> &[PhaseRecord] {
        &self.records
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.records.iter().map(|record| record.phase).collect()
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.records.iter().any(|record| record.phase == phase)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 校验日志与 [`Phase::ORDER`] 完全一致
    ///
    /// 被跳过的阶段（例如网络层、缓存层从未初始化）会作为顺序违规报告。
    pub fn verify_complete(&self) -> Result<(), BootstrapError> {
        for (index, expected) in Phase::ORDER.iter().enumerate() {
            match self.records.get(index) {
                Some(record) if record.phase == *expected => {}
                Some(record) => {
                    return Err(BootstrapError::PhaseOrder {
                        expected: expected.to_string(),
                        found: record.phase.to_string(),
                    });
                }
                None => {
                    return Err(BootstrapError::PhaseOrder {
                        expected: expected.to_string(),
                        found: "end of bootstrap".to_string(),
                    });
                }
            }
        }

        if let Some(extra) = self.records.get(Phase::ORDER.len()) {
            return Err(BootstrapError::PhaseOrder {
                expected: "end of bootstrap".to_string(),
                found: extra.phase.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_of(phases: &[Phase]) -> PhaseJournal {
        let mut journal = PhaseJournal::new();
        for phase in phases {
            journal.record(*phase, Utc::now(), Duration::ZERO).unwrap();
        }
        journal
    }

    #[test]
    fn test_complete_journal_verifies() {
        let journal = journal_of(&Phase::ORDER);
        assert!(journal.verify_complete().is_ok());
        assert_eq!(journal.phases(), Phase::ORDER.to_vec());
    }

    #[test]
    fn test_skipped_layers_are_detected() {
        // 组件阶段被整体替换、没有先调用基础步骤
        let journal = journal_of(&[
            Phase::ErrorManagement,
            Phase::AppComponent,
            Phase::DataComponent,
            Phase::BusinessComponent,
            Phase::DependencyManagementInitialized,
            Phase::BusinessLayer,
        ]);

        let err = journal.verify_complete().unwrap_err();
        assert!(err.is_ordering_violation());
        assert_eq!(
            err.to_string(),
            "phase order violated: expected network_layer, found business_layer"
        );
    }

    #[test]
    fn test_truncated_journal_is_detected() {
        let journal = journal_of(&Phase::ORDER[..5]);
        let err = journal.verify_complete().unwrap_err();
        assert!(err.to_string().contains("end of bootstrap"));
    }

    #[test]
    fn test_duplicate_phase_rejected() {
        let mut journal = journal_of(&[Phase::ErrorManagement]);
        let err = journal
            .record(Phase::ErrorManagement, Utc::now(), Duration::ZERO)
            .unwrap_err();
        assert!(err.is_ordering_violation());
        assert_eq!(journal.len(), 1);
    }
}
