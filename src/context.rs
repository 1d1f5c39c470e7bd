//! Pass-scoped identifier tables.
//!
//! Recipients and chats are referred to inside a backup by small integers
//! assigned the first time the exporter writes them. These tables translate
//! between those ids and host row ids for the duration of one pass and are
//! dropped with it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{RecipientKind, RecipientRowId, ThreadRowId};

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub struct BackupRecipientId(pub u64);

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub struct BackupChatId(pub u64);

impl fmt::Display for BackupRecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recipient#{}", self.0)
    }
}

impl fmt::Display for BackupChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat#{}", self.0)
    }
}

/// What a backup recipient id resolves to on restore.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalParty {
    LocalAddress(RecipientRowId),
    Contact {
        row_id: RecipientRowId,
        aci: Option<Uuid>,
        e164: Option<String>,
    },
    Group(RecipientRowId),
    DistributionList(RecipientRowId),
    ReleaseNotesChannel(RecipientRowId),
}

impl LocalParty {
    pub fn from_kind(row_id: RecipientRowId, kind: &RecipientKind) -> Self {
        match kind {
            RecipientKind::LocalAccount => LocalParty::LocalAddress(row_id),
            RecipientKind::Contact { aci, e164, .. } => LocalParty::Contact {
                row_id,
                aci: *aci,
                e164: e164.clone(),
            },
            RecipientKind::Group { .. } => LocalParty::Group(row_id),
            RecipientKind::DistributionList { .. } => LocalParty::DistributionList(row_id),
            RecipientKind::ReleaseNotes => LocalParty::ReleaseNotesChannel(row_id),
        }
    }

    pub fn row_id(&self) -> RecipientRowId {
        match self {
            LocalParty::LocalAddress(id)
            | LocalParty::Group(id)
            | LocalParty::DistributionList(id)
            | LocalParty::ReleaseNotesChannel(id) => *id,
            LocalParty::Contact { row_id, .. } => *row_id,
        }
    }

    /// Row id if this party is a person (the local account or a contact),
    /// the only parties that can author messages, quotes and reactions.
    pub fn individual_row_id(&self) -> Option<RecipientRowId> {
        match self {
            LocalParty::LocalAddress(id) => Some(*id),
            LocalParty::Contact { row_id, .. } => Some(*row_id),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecipientContext {
    next_id: u64,
    by_local: HashMap<RecipientRowId, BackupRecipientId>,
    by_backup: HashMap<BackupRecipientId, LocalParty>,
}

impl RecipientContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive side: assigns the next backup id to a host recipient, or
    /// returns the id it already has.
    pub fn assign(&mut self, local: RecipientRowId) -> BackupRecipientId {
        if let Some(existing) = self.by_local.get(&local) {
            return *existing;
        }
        self.next_id += 1;
        let id = BackupRecipientId(self.next_id);
        self.by_local.insert(local, id);
        id
    }

    pub fn backup_id(&self, local: RecipientRowId) -> Option<BackupRecipientId> {
        self.by_local.get(&local).copied()
    }

    /// Restore side: records what a backup id resolved to. Returns `false`
    /// if the id was already registered.
    pub fn register(&mut self, id: BackupRecipientId, party: LocalParty) -> bool {
        if self.by_backup.contains_key(&id) {
            return false;
        }
        self.by_local.insert(party.row_id(), id);
        self.by_backup.insert(id, party);
        true
    }

    pub fn party(&self, id: BackupRecipientId) -> Option<&LocalParty> {
        self.by_backup.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_local.len().max(self.by_backup.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct ChatContext {
    next_id: u64,
    by_local: HashMap<ThreadRowId, BackupChatId>,
    by_backup: HashMap<BackupChatId, ThreadRowId>,
}

impl ChatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, local: ThreadRowId) -> BackupChatId {
        if let Some(existing) = self.by_local.get(&local) {
            return *existing;
        }
        self.next_id += 1;
        let id = BackupChatId(self.next_id);
        self.by_local.insert(local, id);
        id
    }

    pub fn backup_id(&self, local: ThreadRowId) -> Option<BackupChatId> {
        self.by_local.get(&local).copied()
    }

    pub fn register(&mut self, id: BackupChatId, local: ThreadRowId) -> bool {
        if self.by_backup.contains_key(&id) {
            return false;
        }
        self.by_local.insert(local, id);
        self.by_backup.insert(id, local);
        true
    }

    pub fn thread_id(&self, id: BackupChatId) -> Option<ThreadRowId> {
        self.by_backup.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_is_sequential_and_stable() {
        let mut ctx = RecipientContext::new();
        assert_eq!(ctx.assign(40), BackupRecipientId(1));
        assert_eq!(ctx.assign(7), BackupRecipientId(2));
        assert_eq!(ctx.assign(40), BackupRecipientId(1));
        assert_eq!(ctx.backup_id(7), Some(BackupRecipientId(2)));
        assert_eq!(ctx.backup_id(8), None);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut ctx = RecipientContext::new();
        assert!(ctx.register(BackupRecipientId(3), LocalParty::Group(10)));
        assert!(!ctx.register(BackupRecipientId(3), LocalParty::LocalAddress(11)));
        assert_eq!(ctx.party(BackupRecipientId(3)), Some(&LocalParty::Group(10)));
        assert_eq!(ctx.party(BackupRecipientId(3)).and_then(LocalParty::individual_row_id), None);
    }

    #[test]
    fn chat_context_maps_both_ways() {
        let mut ctx = ChatContext::new();
        assert!(ctx.register(BackupChatId(9), 2));
        assert_eq!(ctx.thread_id(BackupChatId(9)), Some(2));
        assert_eq!(ctx.backup_id(2), Some(BackupChatId(9)));
        assert_eq!(ctx.thread_id(BackupChatId(1)), None);
    }
}
