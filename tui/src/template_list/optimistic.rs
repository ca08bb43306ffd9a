/// A value that can be changed ahead of persistence and restored if persistence fails.
///
/// At most one change is pending at a time; [`Optimistic::apply`] refuses to stack a second
/// change on an unconfirmed one.
#[derive(Debug, Clone)]
pub struct Optimistic<T: Clone> {
    current: T,
    snapshot: Option<T>,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            snapshot: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn is_pending(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Run `change` against the current value. The prior value is kept as the rollback point
    /// only when `change` reports that it modified something.
    pub fn apply(&mut self, change: impl FnOnce(&mut T) -> bool) -> bool {
        if self.is_pending() {
            return false;
        }
        let snapshot = self.current.clone();
        if change(&mut self.current) {
            self.snapshot = Some(snapshot);
            true
        } else {
            self.current = snapshot;
            false
        }
    }

    /// Accept the pending change.
    pub fn commit(&mut self) -> bool {
        self.snapshot.take().is_some()
    }

    /// Restore the value captured before the pending change.
    pub fn rollback(&mut self) -> bool {
        match self.snapshot.take() {
            Some(snapshot) => {
                self.current = snapshot;
                true
            }
            None => false,
        }
    }

    /// Overwrite the value outright. Refused while a change is pending.
    pub fn replace(&mut self, value: T) -> bool {
        if self.is_pending() {
            return false;
        }
        self.current = value;
        true
    }
}
