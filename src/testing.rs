//! In-memory gateway double for unit tests.

use crate::errors::{AuthFailure, GatewayError};
use crate::gateway::{LOGIN_FAILED, REGISTRATION_FAILED, RemoteGateway};
use crate::models::{CounterDetails, NewCounter, RemoteCounter, RemoteId, Session, User};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String),
    Login(String),
    List,
    Create(NewCounter),
    UpdateDetails(RemoteId, CounterDetails, Option<u64>),
    UpdateCount(RemoteId, u64),
    Delete(RemoteId),
}

enum Step {
    Succeed,
    Fail,
    Hold(oneshot::Receiver<bool>),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    logins: HashMap<(String, String), Session>,
    counters: Vec<RemoteCounter>,
    steps: VecDeque<Step>,
    next_id: u64,
}

/// Scripted stand-in for the remote store. Non-auth calls consume queued
/// steps in order and succeed once the queue is empty.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        gateway.with_state(|state| state.next_id = 100);
        gateway
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn accept_login(&self, identifier: &str, password: &str, token: &str, user: User) {
        let session = Session {
            token: token.to_string(),
            user,
        };
        self.with_state(|state| {
            state
                .logins
                .insert((identifier.to_string(), password.to_string()), session)
        });
    }

    pub fn set_counters(&self, counters: Vec<RemoteCounter>) {
        self.with_state(|state| state.counters = counters);
    }

    pub fn fail_next(&self) {
        self.with_state(|state| state.steps.push_back(Step::Fail));
    }

    pub fn succeed_next(&self) {
        self.with_state(|state| state.steps.push_back(Step::Succeed));
    }

    /// The next call parks until the returned sender reports success or failure.
    pub fn hold_next(&self) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.with_state(|state| state.steps.push_back(Step::Hold(rx)));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|state| state.calls.clone())
    }

    pub fn remote_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, Call::Login(_) | Call::Register(_)))
            .count()
    }

    async fn step(&self, call: Call) -> bool {
        let step = self.with_state(|state| {
            state.calls.push(call);
            state.steps.pop_front()
        });
        match step {
            None | Some(Step::Succeed) => true,
            Some(Step::Fail) => false,
            Some(Step::Hold(rx)) => rx.await.unwrap_or(false),
        }
    }
}

impl RemoteGateway for FakeGateway {
    async fn register(
        &self,
        username: &str,
        email: &str,
        _password: &str,
    ) -> Result<Session, AuthFailure> {
        let taken = self.with_state(|state| {
            state.calls.push(Call::Register(username.to_string()));
            state
                .logins
                .values()
                .any(|s| s.user.username == username || s.user.email == email)
        });
        if taken {
            return Err(AuthFailure::new("Email or Username are already taken"));
        }
        if username.is_empty() {
            return Err(AuthFailure::new(REGISTRATION_FAILED));
        }
        Ok(Session {
            token: format!("jwt-{username}"),
            user: User {
                id: 1,
                username: username.to_string(),
                email: email.to_string(),
            },
        })
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<Session, AuthFailure> {
        self.with_state(|state| {
            state.calls.push(Call::Login(identifier.to_string()));
            state
                .logins
                .get(&(identifier.to_string(), password.to_string()))
                .cloned()
                .ok_or_else(|| AuthFailure::new(LOGIN_FAILED))
        })
    }

    async fn list_counters(&self, _token: &str) -> Result<Vec<RemoteCounter>, GatewayError> {
        if self.step(Call::List).await {
            Ok(self.with_state(|state| state.counters.clone()))
        } else {
            Err(GatewayError::Status {
                status: 500,
                message: None,
            })
        }
    }

    async fn create_counter(&self, _token: &str, counter: &NewCounter) -> Option<RemoteCounter> {
        if !self.step(Call::Create(counter.clone())).await {
            return None;
        }
        let id = self.with_state(|state| {
            state.next_id += 1;
            state.next_id
        });
        Some(RemoteCounter {
            id: RemoteId(id),
            name: counter.name.clone(),
            count: 0,
            max: counter.max,
            category: counter.category.clone(),
            updated_at: None,
        })
    }

    async fn update_counter_details(
        &self,
        _token: &str,
        id: RemoteId,
        details: &CounterDetails,
        clamped_amount: Option<u64>,
    ) -> bool {
        self.step(Call::UpdateDetails(id, details.clone(), clamped_amount))
            .await
    }

    async fn update_counter_count(&self, _token: &str, id: RemoteId, count: u64) -> bool {
        self.step(Call::UpdateCount(id, count)).await
    }

    async fn delete_counter(&self, _token: &str, id: RemoteId) -> bool {
        self.step(Call::Delete(id)).await
    }
}

pub fn remote(
    id: u64,
    name: &str,
    count: u64,
    max: Option<u64>,
    category: Option<&str>,
) -> RemoteCounter {
    RemoteCounter {
        id: RemoteId(id),
        name: name.to_string(),
        count,
        max,
        category: category.map(str::to_string),
        updated_at: None,
    }
}

/// Polls `future` once so its local phase runs, asserting it then parks on a held call.
pub async fn drive_until_parked<F: Future + Unpin>(future: &mut F) {
    tokio::select! {
        biased;
        _ = future => panic!("future completed instead of parking on a held call"),
        _ = std::future::ready(()) => {}
    }
}
