use std::collections::HashMap;
use tracing::debug;

use crate::financials::GroupFinancials;
use crate::tiers::{compute_rebate_table, RebateTableOutput, TierTable};
use crate::types::*;

/// Tier tables keyed by session id. Each session edits its own copy;
/// nothing is shared between sessions.
///
/// The store itself is not synchronized. A host serving several threads
/// wraps it in its own lock.
#[derive(Debug, Clone, Default)]
pub struct TierSessions {
    template: TierTable,
    sessions: HashMap<String, TierTable>,
}

impl TierSessions {
    /// Sessions start from the default tier table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions start from `template` instead of the default tiers.
    pub fn with_template(template: TierTable) -> Self {
        TierSessions {
            template,
            sessions: HashMap::new(),
        }
    }

    /// The session's tier table, created from the template on first use.
    pub fn table_mut(&mut self, session_id: &str) -> &mut TierTable {
        if !self.sessions.contains_key(session_id) {
            debug!(session = session_id, "opening tier session");
        }
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| self.template.clone())
    }

    pub fn table(&self, session_id: &str) -> Option<&TierTable> {
        self.sessions.get(session_id)
    }

    /// Discard the session's edits and go back to the template.
    pub fn reset(&mut self, session_id: &str) {
        self.sessions
            .insert(session_id.to_string(), self.template.clone());
    }

    pub fn close(&mut self, session_id: &str) -> Option<TierTable> {
        self.sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Run the rebate calculation against this session's tiers.
    pub fn calculate(
        &mut self,
        session_id: &str,
        financials: &GroupFinancials,
    ) -> ComputationOutput<RebateTableOutput> {
        compute_rebate_table(self.table_mut(session_id), financials)
    }
}
