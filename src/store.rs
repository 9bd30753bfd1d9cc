//! In-memory counter collection and the optimistic mutation protocol.
//!
//! Every mutation runs in two phases. The local phase applies the change
//! under the board lock and hands back an undo record owned by that single
//! invocation. The remote phase awaits the gateway with no lock held. The
//! outcome is then reconciled: commit, restore the undo record, or drop the
//! result if the board was reset for another session in the meantime.

use crate::errors::{MutationOutcome, Rejection};
use crate::filter::{self, CategoryFilter};
use crate::gateway::RemoteGateway;
use crate::models::{
    Counter, CounterDetails, LocalId, NewCounter, RemoteCounter, RemoteId, normalize_category,
};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// The list call failed; the board is left empty.
    Unavailable,
    Stale,
}

#[derive(Debug, Default)]
struct Board {
    counters: Vec<Counter>,
    next_local: u64,
    epoch: u64,
}

/// What one invocation needs to take its own change back.
#[derive(Debug)]
enum Undo {
    Nothing,
    Count {
        id: LocalId,
        prior: u64,
    },
    Details {
        id: LocalId,
        prior: CounterDetails,
        prior_count: Option<u64>,
    },
    Removal {
        index: usize,
        counter: Counter,
    },
}

impl Board {
    fn allocate(&mut self) -> LocalId {
        self.next_local += 1;
        LocalId(self.next_local)
    }

    fn find(&self, id: LocalId) -> Result<(usize, &Counter), Rejection> {
        self.counters
            .iter()
            .enumerate()
            .find(|(_, counter)| counter.local_id == id)
            .ok_or(Rejection::UnknownCounter)
    }

    fn find_persisted(&self, id: LocalId) -> Result<(usize, RemoteId), Rejection> {
        let (index, counter) = self.find(id)?;
        let remote_id = counter.remote_id.ok_or(Rejection::NotPersisted)?;
        Ok((index, remote_id))
    }

    fn append(&mut self, remote: RemoteCounter) -> LocalId {
        let id = self.allocate();
        self.counters.push(remote.into_counter(id));
        id
    }

    fn restore(&mut self, undo: Undo) {
        match undo {
            Undo::Nothing => {}
            Undo::Count { id, prior } => {
                if let Some(counter) = self.counters.iter_mut().find(|c| c.local_id == id) {
                    counter.count = counter.max.map_or(prior, |max| prior.min(max));
                }
            }
            Undo::Details {
                id,
                prior,
                prior_count,
            } => {
                if let Some(counter) = self.counters.iter_mut().find(|c| c.local_id == id) {
                    counter.name = prior.name;
                    counter.max = prior.max;
                    counter.category = prior.category;
                    if let Some(count) = prior_count {
                        counter.count = count;
                    }
                    if let Some(max) = counter.max {
                        counter.count = counter.count.min(max);
                    }
                }
            }
            Undo::Removal { index, counter } => {
                if self.counters.iter().all(|c| c.local_id != counter.local_id) {
                    let index = index.min(self.counters.len());
                    self.counters.insert(index, counter);
                }
            }
        }
    }
}

pub struct CounterStore<G> {
    gateway: Arc<G>,
    board: Mutex<Board>,
}

impl<G: RemoteGateway> CounterStore<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            board: Mutex::new(Board::default()),
        }
    }

    fn with_board<R>(&self, f: impl FnOnce(&mut Board) -> R) -> R {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut board)
    }

    pub fn counters(&self) -> Vec<Counter> {
        self.with_board(|board| board.counters.clone())
    }

    pub fn get(&self, id: LocalId) -> Option<Counter> {
        self.with_board(|board| board.find(id).ok().map(|(_, counter)| counter.clone()))
    }

    pub fn len(&self) -> usize {
        self.with_board(|board| board.counters.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn filtered(&self, selection: &CategoryFilter) -> Vec<Counter> {
        self.with_board(|board| filter::filter_counters(&board.counters, selection))
    }

    pub fn categories(&self) -> Vec<String> {
        self.with_board(|board| filter::categories(&board.counters))
    }

    /// Drops every counter and invalidates all in-flight results.
    pub fn reset(&self) {
        self.with_board(|board| {
            board.counters.clear();
            board.epoch += 1;
        });
    }

    /// Replaces the board with the remote list. A failed list leaves it empty.
    pub async fn load(&self, token: &str) -> LoadOutcome {
        let epoch = self.with_board(|board| board.epoch);
        let result = self.gateway.list_counters(token).await;
        self.with_board(|board| {
            if board.epoch != epoch {
                debug!("dropping counter list fetched for a previous session");
                return LoadOutcome::Stale;
            }
            board.counters.clear();
            match result {
                Ok(remote) => {
                    for counter in remote {
                        board.append(counter);
                    }
                    LoadOutcome::Loaded(board.counters.len())
                }
                Err(_) => LoadOutcome::Unavailable,
            }
        })
    }

    /// The one place the local/remote/reconcile sequence is written down.
    async fn optimistic<P, R, Fut>(
        &self,
        label: &'static str,
        apply: impl FnOnce(&mut Board) -> Result<(Undo, P), Rejection>,
        remote: impl FnOnce(P) -> Fut,
        reconcile: impl FnOnce(&mut Board, R),
    ) -> MutationOutcome
    where
        Fut: Future<Output = Option<R>>,
    {
        let local = self.with_board(|board| {
            let epoch = board.epoch;
            apply(board).map(|(undo, payload)| (epoch, undo, payload))
        });
        let (epoch, undo, payload) = match local {
            Ok(applied) => applied,
            Err(rejection) => {
                debug!("{label} rejected locally: {rejection}");
                return MutationOutcome::Rejected(rejection);
            }
        };

        let result = remote(payload).await;

        self.with_board(|board| {
            if board.epoch != epoch {
                debug!("dropping {label} result from a previous session");
                return MutationOutcome::Stale;
            }
            match result {
                Some(value) => {
                    reconcile(board, value);
                    MutationOutcome::Committed
                }
                None => {
                    warn!("{label} failed remotely, rolling back");
                    board.restore(undo);
                    MutationOutcome::RolledBack
                }
            }
        })
    }

    /// Nothing becomes visible until the remote store has assigned an id.
    pub async fn create(
        &self,
        token: Option<&str>,
        name: &str,
        max: Option<u64>,
        category: Option<&str>,
    ) -> MutationOutcome {
        let name = name.trim();
        if name.is_empty() {
            return MutationOutcome::Rejected(Rejection::EmptyName);
        }
        let Some(token) = token else {
            return MutationOutcome::Rejected(Rejection::NotPermitted);
        };
        let draft = NewCounter {
            name: name.to_string(),
            max: max.filter(|max| *max >= 1),
            category: category.and_then(normalize_category),
        };
        let gateway = &self.gateway;

        self.optimistic(
            "create",
            |_| Ok((Undo::Nothing, draft)),
            |draft| async move { gateway.create_counter(token, &draft).await },
            |board, remote| {
                let id = board.append(remote);
                debug!("created counter {id}");
            },
        )
        .await
    }

    /// Moves the count by `delta`, clamped into `[0, max]`. A move that the clamp
    /// swallows entirely is rejected without a remote call.
    pub async fn adjust(&self, token: Option<&str>, id: LocalId, delta: i64) -> MutationOutcome {
        let Some(token) = token else {
            return MutationOutcome::Rejected(Rejection::NotPermitted);
        };
        let gateway = &self.gateway;

        self.optimistic(
            "adjust",
            |board| {
                let (index, remote_id) = board.find_persisted(id)?;
                let counter = &mut board.counters[index];
                let target = counter.clamped(delta);
                if target == counter.count {
                    return Err(Rejection::AtBound);
                }
                let prior = std::mem::replace(&mut counter.count, target);
                Ok((Undo::Count { id, prior }, (remote_id, target)))
            },
            |(remote_id, target)| async move {
                gateway
                    .update_counter_count(token, remote_id, target)
                    .await
                    .then_some(())
            },
            |_, ()| {},
        )
        .await
    }

    /// Replaces name/max/category. Lowering the bound below the count clamps the
    /// count too, and the clamped amount travels with the update.
    pub async fn update_details(
        &self,
        token: Option<&str>,
        id: LocalId,
        details: CounterDetails,
    ) -> MutationOutcome {
        let name = details.name.trim().to_string();
        if name.is_empty() {
            return MutationOutcome::Rejected(Rejection::EmptyName);
        }
        let Some(token) = token else {
            return MutationOutcome::Rejected(Rejection::NotPermitted);
        };
        let details = CounterDetails {
            name,
            max: details.max.filter(|max| *max >= 1),
            category: details.category.as_deref().and_then(normalize_category),
        };
        let gateway = &self.gateway;

        self.optimistic(
            "edit",
            |board| {
                let (index, remote_id) = board.find_persisted(id)?;
                let counter = &mut board.counters[index];
                let prior = CounterDetails {
                    name: std::mem::replace(&mut counter.name, details.name.clone()),
                    max: std::mem::replace(&mut counter.max, details.max),
                    category: std::mem::replace(&mut counter.category, details.category.clone()),
                };
                let prior_count = match details.max {
                    Some(max) if counter.count > max => {
                        Some(std::mem::replace(&mut counter.count, max))
                    }
                    _ => None,
                };
                let clamped_amount = prior_count.map(|_| counter.count);
                let undo = Undo::Details {
                    id,
                    prior,
                    prior_count,
                };
                Ok((undo, (remote_id, details, clamped_amount)))
            },
            |(remote_id, details, clamped_amount)| async move {
                gateway
                    .update_counter_details(token, remote_id, &details, clamped_amount)
                    .await
                    .then_some(())
            },
            |_, ()| {},
        )
        .await
    }

    /// Removes the counter at once; a failed delete puts it back near where it was.
    pub async fn delete(&self, token: Option<&str>, id: LocalId) -> MutationOutcome {
        let Some(token) = token else {
            return MutationOutcome::Rejected(Rejection::NotPermitted);
        };
        let gateway = &self.gateway;

        self.optimistic(
            "delete",
            |board| {
                let (index, remote_id) = board.find_persisted(id)?;
                let counter = board.counters.remove(index);
                Ok((Undo::Removal { index, counter }, remote_id))
            },
            |remote_id| async move {
                gateway
                    .delete_counter(token, remote_id)
                    .await
                    .then_some(())
            },
            |_, ()| {},
        )
        .await
    }
}
