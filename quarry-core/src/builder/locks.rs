//! Row-locking flags. The compiler gates emission on dialect support.

use crate::ast::{LockClause, LockStrength, Query};

impl Query {
    fn set_lock(mut self, strength: LockStrength) -> Self {
        let (skip_locked, no_wait, of_tables) = self
            .lock
            .take()
            .map(|l| (l.skip_locked, l.no_wait, l.of_tables))
            .unwrap_or((false, false, vec![]));
        self.lock = Some(LockClause {
            strength,
            skip_locked,
            no_wait,
            of_tables,
        });
        self
    }

    pub fn for_update(self) -> Self {
        self.set_lock(LockStrength::Update)
    }

    /// `FOR UPDATE OF <tables>`; the table list is dropped on dialects
    /// without `supports_for_update_of_tables`.
    pub fn for_update_of<I, S>(self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_lock(LockStrength::Update).lock_of(tables)
    }

    pub fn for_share(self) -> Self {
        self.set_lock(LockStrength::Share)
    }

    pub fn for_no_key_update(self) -> Self {
        self.set_lock(LockStrength::NoKeyUpdate)
    }

    pub fn for_key_share(self) -> Self {
        self.set_lock(LockStrength::KeyShare)
    }

    /// Restrict the chosen lock to the given tables; only meaningful after
    /// a lock strength was chosen.
    pub fn lock_of<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(lock) = &mut self.lock {
            lock.of_tables
                .extend(tables.into_iter().map(|t| t.as_ref().to_string()));
        }
        self
    }

    /// Only meaningful after a lock strength was chosen.
    pub fn skip_locked(mut self) -> Self {
        if let Some(lock) = &mut self.lock {
            lock.skip_locked = true;
        }
        self
    }

    pub fn no_wait(mut self) -> Self {
        if let Some(lock) = &mut self.lock {
            lock.no_wait = true;
        }
        self
    }
}
