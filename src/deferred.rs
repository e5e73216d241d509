/// Timestamp-scheduled actions that die with their session.
///
/// Every action is tagged with the generation that was current when it was
/// scheduled. [`DeferredQueue::invalidate`] bumps the generation instead of
/// hunting down pending entries, and [`DeferredQueue::take_due`] silently
/// drops anything whose tag no longer matches.

#[derive(Clone, Debug)]
struct Pending<A> {
    generation: u64,
    due_ms: f64,
    action: A,
}

#[derive(Clone, Debug)]
pub struct DeferredQueue<A> {
    generation: u64,
    pending: Vec<Pending<A>>,
}

impl<A> DeferredQueue<A> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            pending: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Schedule under the current generation.
    pub fn schedule(&mut self, due_ms: f64, action: A) {
        let generation = self.generation;
        self.schedule_tagged(generation, due_ms, action);
    }

    /// Schedule under an explicit generation, e.g. one captured before a reset.
    fn schedule_tagged(&mut self, generation: u64, due_ms: f64, action: A) {
        self.pending.push(Pending {
            generation,
            due_ms,
            action,
        });
    }

    /// Remove and return every live action due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<A> {
        let generation = self.generation;
        let before = self.pending.len();
        self.pending.retain(|p| p.generation == generation);
        let stale = before - self.pending.len();
        if stale > 0 {
            log::warn!("dropped {} stale deferred action(s)", stale);
        }

        let mut due: Vec<Pending<A>> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_ms <= now_ms {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|p| p.action).collect()
    }

    /// Forget everything scheduled so far.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending.clear();
    }

    /// Live actions still waiting.
    pub fn len(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| p.generation == self.generation)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}
