//! Turns user intents into session and counter store calls and keeps the
//! purely presentational state: form buffers, the row in edit mode, expanded
//! menus, the selected category and the loading/authenticating flags.

use crate::errors::{AuthFailure, MutationOutcome, Rejection};
use crate::filter::CategoryFilter;
use crate::gateway::RemoteGateway;
use crate::models::{Counter, CounterDetails, LocalId, User, normalize_category, parse_max};
use crate::session::{AuthPhase, SessionStore};
use crate::storage::KeyValueStore;
use crate::store::{CounterStore, LoadOutcome};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Text typed into the add-counter form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterDraft {
    pub name: String,
    pub max: String,
    pub category: String,
}

/// Uncommitted edits of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: LocalId,
    pub name: String,
    pub max: String,
    pub category: String,
}

impl EditBuffer {
    fn seeded(counter: &Counter) -> Self {
        Self {
            id: counter.local_id,
            name: counter.name.clone(),
            max: counter.max.map(|max| max.to_string()).unwrap_or_default(),
            category: counter.category.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
struct UiState {
    /// Bumped on every reset; work started under an older value no longer owns `loading`.
    generation: u64,
    loading: usize,
    authenticating: bool,
    auth_error: Option<String>,
    editing: Option<EditBuffer>,
    expanded: HashSet<LocalId>,
    selected: CategoryFilter,
    draft: CounterDraft,
}

pub struct ViewController<S, G> {
    gateway: Arc<G>,
    session: SessionStore<S>,
    store: CounterStore<G>,
    ui: Mutex<UiState>,
}

impl<S: KeyValueStore, G: RemoteGateway> ViewController<S, G> {
    pub fn new(gateway: Arc<G>, storage: S) -> Self {
        Self {
            store: CounterStore::new(Arc::clone(&gateway)),
            session: SessionStore::new(storage),
            gateway,
            ui: Mutex::new(UiState::default()),
        }
    }

    fn with_ui<R>(&self, f: impl FnOnce(&mut UiState) -> R) -> R {
        let mut ui = self.ui.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ui)
    }

    fn reset_ui(&self) {
        self.with_ui(|ui| {
            let generation = ui.generation.wrapping_add(1);
            *ui = UiState {
                generation,
                ..UiState::default()
            };
        });
    }

    fn begin_loading(&self) -> u64 {
        self.with_ui(|ui| {
            ui.loading += 1;
            ui.generation
        })
    }

    fn end_loading(&self, generation: u64) {
        self.with_ui(|ui| {
            if ui.generation == generation {
                ui.loading = ui.loading.saturating_sub(1);
            }
        });
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub fn store(&self) -> &CounterStore<G> {
        &self.store
    }

    pub fn phase(&self) -> AuthPhase {
        self.session.phase()
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_loading(&self) -> bool {
        self.with_ui(|ui| ui.loading > 0)
    }

    pub fn is_authenticating(&self) -> bool {
        self.with_ui(|ui| ui.authenticating)
    }

    pub fn auth_error(&self) -> Option<String> {
        self.with_ui(|ui| ui.auth_error.clone())
    }

    /// Restores the persisted session and, if there is one, loads its counters.
    pub async fn boot(&self) -> AuthPhase {
        let phase = self.session.restore().await;
        if matches!(phase, AuthPhase::SignedIn(_)) {
            self.load_counters().await;
        }
        phase
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> bool {
        self.begin_auth();
        let result = self.session.login(self.gateway.as_ref(), identifier, secret).await;
        self.finish_auth(result.map(|_| ())).await
    }

    pub async fn register(&self, username: &str, email: &str, secret: &str) -> bool {
        self.begin_auth();
        let result = self
            .session
            .register(self.gateway.as_ref(), username, email, secret)
            .await;
        self.finish_auth(result.map(|_| ())).await
    }

    fn begin_auth(&self) {
        self.with_ui(|ui| {
            ui.authenticating = true;
            ui.auth_error = None;
        });
    }

    async fn finish_auth(&self, result: Result<(), AuthFailure>) -> bool {
        match result {
            Ok(()) => {
                // a fresh session never sees the previous user's rows or form state
                self.store.reset();
                self.reset_ui();
                self.load_counters().await;
                true
            }
            Err(failure) => {
                self.with_ui(|ui| {
                    ui.authenticating = false;
                    ui.auth_error = Some(failure.message);
                });
                false
            }
        }
    }

    /// Clears the session and everything derived from it.
    pub async fn logout(&self) {
        self.store.reset();
        self.reset_ui();
        self.session.logout().await;
    }

    pub async fn load_counters(&self) -> LoadOutcome {
        let Some(token) = self.session.token() else {
            warn!("not loading counters without a session");
            return LoadOutcome::Unavailable;
        };
        let generation = self.begin_loading();
        let outcome = self.store.load(&token).await;
        self.end_loading(generation);
        if let LoadOutcome::Loaded(count) = outcome {
            info!("loaded {count} counters");
        }
        outcome
    }

    pub fn draft(&self) -> CounterDraft {
        self.with_ui(|ui| ui.draft.clone())
    }

    pub fn set_draft(&self, draft: CounterDraft) {
        self.with_ui(|ui| ui.draft = draft);
    }

    /// Submits the add form. The form is cleared only once the server has the counter.
    pub async fn add_counter(&self) -> MutationOutcome {
        let Some(draft) = self.with_ui(|ui| (ui.loading == 0).then(|| ui.draft.clone())) else {
            return MutationOutcome::Rejected(Rejection::Busy);
        };
        if draft.name.trim().is_empty() {
            return MutationOutcome::Rejected(Rejection::EmptyName);
        }
        let token = self.session.token();
        let max = parse_max(&draft.max);
        let category = normalize_category(&draft.category);

        let generation = self.begin_loading();
        let outcome = self
            .store
            .create(token.as_deref(), &draft.name, max, category.as_deref())
            .await;
        self.end_loading(generation);
        if outcome.is_committed() {
            self.with_ui(|ui| ui.draft = CounterDraft::default());
        }
        outcome
    }

    pub fn counters(&self) -> Vec<Counter> {
        self.store.counters()
    }

    /// Counters under the current category selection, in creation order.
    pub fn visible_counters(&self) -> Vec<Counter> {
        let selected = self.selected_category();
        self.store.filtered(&selected)
    }

    pub fn categories(&self) -> Vec<String> {
        self.store.categories()
    }

    pub fn selected_category(&self) -> CategoryFilter {
        self.with_ui(|ui| ui.selected.clone())
    }

    pub fn select_category(&self, selection: CategoryFilter) {
        self.with_ui(|ui| ui.selected = selection);
    }

    fn row_locked(&self, id: LocalId) -> bool {
        self.with_ui(|ui| ui.loading > 0 || ui.editing.as_ref().is_some_and(|edit| edit.id == id))
    }

    pub fn can_increment(&self, id: LocalId) -> bool {
        !self.row_locked(id) && self.store.get(id).is_some_and(|c| !c.is_completed())
    }

    pub fn can_decrement(&self, id: LocalId) -> bool {
        !self.row_locked(id) && self.store.get(id).is_some_and(|c| c.count > 0)
    }

    pub fn can_edit(&self, id: LocalId) -> bool {
        !self.is_loading() && self.store.get(id).is_some()
    }

    pub fn can_delete(&self, id: LocalId) -> bool {
        !self.row_locked(id) && self.store.get(id).is_some()
    }

    pub async fn adjust(&self, id: LocalId, delta: i64) -> MutationOutcome {
        if self.row_locked(id) {
            return MutationOutcome::Rejected(Rejection::Busy);
        }
        let token = self.session.token();
        self.store.adjust(token.as_deref(), id, delta).await
    }

    pub async fn increment(&self, id: LocalId) -> MutationOutcome {
        self.adjust(id, 1).await
    }

    pub async fn decrement(&self, id: LocalId) -> MutationOutcome {
        self.adjust(id, -1).await
    }

    pub fn editing(&self) -> Option<EditBuffer> {
        self.with_ui(|ui| ui.editing.clone())
    }

    /// Opens `id` for editing, replacing any other open buffer.
    pub fn start_edit(&self, id: LocalId) -> bool {
        let Some(counter) = self.store.get(id) else {
            return false;
        };
        self.with_ui(|ui| ui.editing = Some(EditBuffer::seeded(&counter)));
        true
    }

    fn edit_buffer(&self, f: impl FnOnce(&mut EditBuffer)) -> bool {
        self.with_ui(|ui| ui.editing.as_mut().map(f).is_some())
    }

    pub fn set_edit_name(&self, name: &str) -> bool {
        self.edit_buffer(|edit| edit.name = name.to_string())
    }

    pub fn set_edit_max(&self, max: &str) -> bool {
        self.edit_buffer(|edit| edit.max = max.to_string())
    }

    pub fn set_edit_category(&self, category: &str) -> bool {
        self.edit_buffer(|edit| edit.category = category.to_string())
    }

    pub fn cancel_edit(&self) {
        self.with_ui(|ui| ui.editing = None);
    }

    /// Commits the edit buffer optimistically. The buffer closes straight away; a
    /// failed save reverts the row without reopening it.
    pub async fn save_edit(&self) -> MutationOutcome {
        let taken = self.with_ui(|ui| match ui.editing.take() {
            Some(edit) if edit.name.trim().is_empty() => {
                ui.editing = Some(edit);
                Err(Rejection::EmptyName)
            }
            Some(edit) => Ok(edit),
            None => Err(Rejection::NothingToSave),
        });
        let edit = match taken {
            Ok(edit) => edit,
            Err(rejection) => return MutationOutcome::Rejected(rejection),
        };

        let details = CounterDetails {
            name: edit.name,
            max: parse_max(&edit.max),
            category: normalize_category(&edit.category),
        };
        let token = self.session.token();
        self.store.update_details(token.as_deref(), edit.id, details).await
    }

    pub async fn delete(&self, id: LocalId) -> MutationOutcome {
        if self.row_locked(id) {
            return MutationOutcome::Rejected(Rejection::Busy);
        }
        let token = self.session.token();
        let outcome = self.store.delete(token.as_deref(), id).await;
        if outcome.is_committed() {
            self.with_ui(|ui| ui.expanded.remove(&id));
        }
        outcome
    }

    /// Flips the row's action menu, returning whether it is now open.
    pub fn toggle_menu(&self, id: LocalId) -> bool {
        self.with_ui(|ui| {
            if ui.expanded.remove(&id) {
                false
            } else {
                ui.expanded.insert(id);
                true
            }
        })
    }

    pub fn is_menu_expanded(&self, id: LocalId) -> bool {
        self.with_ui(|ui| ui.expanded.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, TOKEN_KEY, USER_KEY};
    use crate::testing::{Call, FakeGateway, drive_until_parked, remote};

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
        }
    }

    fn gateway_with(counters: Vec<crate::models::RemoteCounter>) -> Arc<FakeGateway> {
        let gateway = Arc::new(FakeGateway::new());
        gateway.accept_login("alice@example.com", "secret", "jwt-a", alice());
        gateway.set_counters(counters);
        gateway
    }

    async fn signed_in(
        counters: Vec<crate::models::RemoteCounter>,
    ) -> (Arc<FakeGateway>, ViewController<MemoryStore, FakeGateway>) {
        let gateway = gateway_with(counters);
        let view = ViewController::new(Arc::clone(&gateway), MemoryStore::new());
        view.boot().await;
        assert!(view.login("alice@example.com", "secret").await);
        (gateway, view)
    }

    fn id_of(view: &ViewController<MemoryStore, FakeGateway>, name: &str) -> LocalId {
        view.counters()
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.local_id)
            .expect("counter present")
    }

    #[tokio::test]
    async fn boot_without_session_does_not_load() {
        let gateway = gateway_with(vec![remote(1, "Water", 0, None, None)]);
        let view = ViewController::new(Arc::clone(&gateway), MemoryStore::new());

        assert_eq!(view.phase(), AuthPhase::Undetermined);
        assert_eq!(view.boot().await, AuthPhase::SignedOut);
        assert!(view.counters().is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn boot_with_persisted_session_loads_counters() {
        let gateway = gateway_with(vec![remote(1, "Water", 2, None, None)]);
        let raw_user = serde_json::to_string(&alice()).unwrap();
        let storage =
            MemoryStore::with_entries([(TOKEN_KEY, "jwt-a"), (USER_KEY, raw_user.as_str())]);
        let view = ViewController::new(Arc::clone(&gateway), storage);

        assert_eq!(view.boot().await, AuthPhase::SignedIn(alice()));
        assert_eq!(view.counters().len(), 1);
        assert_eq!(gateway.calls(), vec![Call::List]);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn invalid_login_surfaces_error_and_keeps_storage_empty() {
        let gateway = gateway_with(vec![]);
        let view = ViewController::new(Arc::clone(&gateway), MemoryStore::new());
        view.boot().await;

        assert!(!view.login("alice@example.com", "nope").await);
        assert_eq!(view.user(), None);
        assert!(view.session().storage().snapshot().is_empty());
        assert!(view.auth_error().is_some_and(|message| !message.is_empty()));
        assert!(!view.is_authenticating());
        assert_eq!(gateway.remote_calls(), 0);
    }

    #[tokio::test]
    async fn successful_login_clears_previous_error_and_loads() {
        let gateway = gateway_with(vec![remote(1, "Water", 2, None, None)]);
        let view = ViewController::new(Arc::clone(&gateway), MemoryStore::new());
        view.boot().await;

        view.login("alice@example.com", "nope").await;
        assert!(view.login("alice@example.com", "secret").await);
        assert_eq!(view.auth_error(), None);
        assert_eq!(view.user(), Some(alice()));
        assert_eq!(view.counters().len(), 1);
    }

    #[tokio::test]
    async fn registration_conflict_is_reported() {
        let gateway = gateway_with(vec![]);
        let view = ViewController::new(Arc::clone(&gateway), MemoryStore::new());
        view.boot().await;

        assert!(!view.register("alice", "alice@example.com", "secret").await);
        assert_eq!(
            view.auth_error().as_deref(),
            Some("Email or Username are already taken")
        );

        assert!(view.register("bob", "bob@example.com", "secret").await);
        assert_eq!(view.user().map(|u| u.username), Some("bob".to_string()));
    }

    #[tokio::test]
    async fn logout_drops_counters_and_transient_state() {
        let (_gateway, view) =
            signed_in(vec![remote(1, "Water", 2, None, Some("Health"))]).await;
        let id = id_of(&view, "Water");
        view.toggle_menu(id);
        view.start_edit(id);
        view.select_category(CategoryFilter::Category("Health".into()));

        view.logout().await;
        assert_eq!(view.phase(), AuthPhase::SignedOut);
        assert!(view.counters().is_empty());
        assert_eq!(view.editing(), None);
        assert!(!view.is_menu_expanded(id));
        assert_eq!(view.selected_category(), CategoryFilter::All);
        assert!(view.session().storage().snapshot().is_empty());
    }

    #[tokio::test]
    async fn create_finishing_after_logout_is_ignored() {
        let (gateway, view) = signed_in(vec![]).await;
        view.set_draft(CounterDraft {
            name: "Books".into(),
            ..CounterDraft::default()
        });

        let release = gateway.hold_next();
        let add = view.add_counter();
        tokio::pin!(add);
        drive_until_parked(&mut add).await;
        assert!(view.is_loading());

        view.logout().await;
        release.send(true).unwrap();
        assert_eq!(add.await, MutationOutcome::Stale);
        assert!(view.counters().is_empty());
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn stale_create_keeps_next_session_loading() {
        let (gateway, view) = signed_in(vec![]).await;
        view.set_draft(CounterDraft {
            name: "Books".into(),
            ..CounterDraft::default()
        });

        let release_create = gateway.hold_next();
        let add = view.add_counter();
        tokio::pin!(add);
        drive_until_parked(&mut add).await;
        view.logout().await;

        gateway.set_counters(vec![remote(1, "Water", 2, None, None)]);
        let release_list = gateway.hold_next();
        let login = view.login("alice@example.com", "secret");
        tokio::pin!(login);
        drive_until_parked(&mut login).await;
        assert!(view.is_loading());

        release_create.send(true).unwrap();
        assert_eq!(add.await, MutationOutcome::Stale);
        assert!(view.is_loading());
        view.set_draft(CounterDraft {
            name: "Tea".into(),
            ..CounterDraft::default()
        });
        let calls_before = gateway.remote_calls();
        assert_eq!(
            view.add_counter().await,
            MutationOutcome::Rejected(Rejection::Busy)
        );
        assert_eq!(gateway.remote_calls(), calls_before);

        release_list.send(true).unwrap();
        assert!(login.await);
        assert!(!view.is_loading());
        let water = id_of(&view, "Water");
        assert!(view.can_increment(water));
        assert_eq!(view.counters().len(), 1);
    }

    #[tokio::test]
    async fn login_over_existing_session_clears_transient_state() {
        let (_gateway, view) =
            signed_in(vec![remote(1, "Water", 2, None, Some("Health"))]).await;
        let id = id_of(&view, "Water");
        view.toggle_menu(id);
        view.start_edit(id);
        view.select_category(CategoryFilter::Category("Health".into()));
        view.set_draft(CounterDraft {
            name: "Books".into(),
            ..CounterDraft::default()
        });

        assert!(view.login("alice@example.com", "secret").await);
        assert_eq!(view.editing(), None);
        assert_eq!(view.draft(), CounterDraft::default());
        assert_eq!(view.selected_category(), CategoryFilter::All);
        assert!(view.counters().iter().all(|c| !view.is_menu_expanded(c.local_id)));
        assert_eq!(view.counters().len(), 1);
    }

    #[tokio::test]
    async fn add_counter_clears_form_only_on_success() {
        let (gateway, view) = signed_in(vec![]).await;
        let draft = CounterDraft {
            name: "Books".into(),
            max: "ten".into(),
            category: "  ".into(),
        };

        view.set_draft(draft.clone());
        gateway.fail_next();
        assert_eq!(view.add_counter().await, MutationOutcome::RolledBack);
        assert_eq!(view.draft(), draft);
        assert!(view.counters().is_empty());

        gateway.succeed_next();
        assert_eq!(view.add_counter().await, MutationOutcome::Committed);
        assert_eq!(view.draft(), CounterDraft::default());
        let created = &view.counters()[0];
        assert_eq!(created.max, None);
        assert_eq!(created.category, None);
    }

    #[tokio::test]
    async fn add_counter_with_blank_name_never_calls_out() {
        let (gateway, view) = signed_in(vec![]).await;
        let calls_before = gateway.remote_calls();

        view.set_draft(CounterDraft {
            name: "   ".into(),
            max: "4".into(),
            category: String::new(),
        });
        assert_eq!(
            view.add_counter().await,
            MutationOutcome::Rejected(Rejection::EmptyName)
        );
        assert_eq!(gateway.remote_calls(), calls_before);
        assert!(view.counters().is_empty());
    }

    #[tokio::test]
    async fn signed_out_operations_are_not_permitted() {
        let gateway = gateway_with(vec![]);
        let view = ViewController::new(Arc::clone(&gateway), MemoryStore::new());
        view.boot().await;
        view.set_draft(CounterDraft {
            name: "Books".into(),
            ..CounterDraft::default()
        });

        assert_eq!(
            view.add_counter().await,
            MutationOutcome::Rejected(Rejection::NotPermitted)
        );
        assert_eq!(gateway.remote_calls(), 0);
    }

    #[tokio::test]
    async fn editing_row_blocks_its_adjust_buttons() {
        let (gateway, view) = signed_in(vec![remote(1, "Water", 2, Some(3), None)]).await;
        let id = id_of(&view, "Water");
        assert!(view.can_increment(id));
        assert!(view.can_decrement(id));

        assert!(view.start_edit(id));
        assert!(!view.can_increment(id));
        assert!(!view.can_delete(id));
        let calls_before = gateway.remote_calls();
        assert_eq!(
            view.increment(id).await,
            MutationOutcome::Rejected(Rejection::Busy)
        );
        assert_eq!(gateway.remote_calls(), calls_before);
    }

    #[tokio::test]
    async fn completed_counter_disables_increment() {
        let (_gateway, view) = signed_in(vec![remote(1, "Push-ups", 8, Some(10), None)]).await;
        let id = id_of(&view, "Push-ups");

        view.increment(id).await;
        view.increment(id).await;
        assert!(!view.can_increment(id));
        assert!(view.can_decrement(id));
        assert_eq!(
            view.increment(id).await,
            MutationOutcome::Rejected(Rejection::AtBound)
        );
        assert_eq!(view.store().get(id).unwrap().count, 10);
    }

    #[tokio::test]
    async fn edit_buffer_is_seeded_and_cancel_is_local() {
        let (gateway, view) =
            signed_in(vec![remote(1, "Books", 2, Some(12), Some("Reading"))]).await;
        let id = id_of(&view, "Books");
        let calls_before = gateway.remote_calls();

        view.start_edit(id);
        assert_eq!(
            view.editing(),
            Some(EditBuffer {
                id,
                name: "Books".into(),
                max: "12".into(),
                category: "Reading".into(),
            })
        );

        view.set_edit_name("Novels");
        view.cancel_edit();
        assert_eq!(view.editing(), None);
        assert_eq!(view.store().get(id).unwrap().name, "Books");
        assert_eq!(gateway.remote_calls(), calls_before);
    }

    #[tokio::test]
    async fn save_edit_commits_details() {
        let (gateway, view) =
            signed_in(vec![remote(5, "Books", 2, Some(12), Some("Reading"))]).await;
        let id = id_of(&view, "Books");

        view.start_edit(id);
        view.set_edit_name(" Novels ");
        view.set_edit_max("");
        view.set_edit_category("Fiction");
        assert_eq!(view.save_edit().await, MutationOutcome::Committed);

        let counter = view.store().get(id).unwrap();
        assert_eq!(counter.name, "Novels");
        assert_eq!(counter.max, None);
        assert_eq!(counter.category.as_deref(), Some("Fiction"));
        assert_eq!(counter.count, 2);
        assert_eq!(view.editing(), None);
        assert_eq!(
            gateway.calls().last(),
            Some(&Call::UpdateDetails(
                crate::models::RemoteId(5),
                CounterDetails {
                    name: "Novels".into(),
                    max: None,
                    category: Some("Fiction".into()),
                },
                None
            ))
        );
    }

    #[tokio::test]
    async fn failed_save_reverts_row() {
        let (gateway, view) =
            signed_in(vec![remote(5, "Books", 2, Some(12), Some("Reading"))]).await;
        let id = id_of(&view, "Books");

        view.start_edit(id);
        view.set_edit_name("Novels");
        view.set_edit_max("20");
        gateway.fail_next();
        assert_eq!(view.save_edit().await, MutationOutcome::RolledBack);

        let counter = view.store().get(id).unwrap();
        assert_eq!(counter.name, "Books");
        assert_eq!(counter.max, Some(12));
        assert_eq!(counter.category.as_deref(), Some("Reading"));
        assert_eq!(counter.count, 2);
    }

    #[tokio::test]
    async fn save_with_blank_name_keeps_buffer_open() {
        let (_gateway, view) = signed_in(vec![remote(5, "Books", 2, None, None)]).await;
        let id = id_of(&view, "Books");

        view.start_edit(id);
        view.set_edit_name("  ");
        assert_eq!(
            view.save_edit().await,
            MutationOutcome::Rejected(Rejection::EmptyName)
        );
        assert!(view.editing().is_some());
        assert_eq!(
            view.save_edit().await,
            MutationOutcome::Rejected(Rejection::EmptyName)
        );
        view.cancel_edit();
        assert_eq!(
            view.save_edit().await,
            MutationOutcome::Rejected(Rejection::NothingToSave)
        );
    }

    #[tokio::test]
    async fn category_selection_filters_visible_rows() {
        let (_gateway, view) = signed_in(vec![
            remote(1, "Push-ups", 0, None, Some("Sport")),
            remote(2, "Books", 0, None, Some("Reading")),
            remote(3, "Laps", 0, None, Some("Sport")),
        ])
        .await;

        assert_eq!(view.categories(), vec!["Sport".to_string(), "Reading".to_string()]);
        view.select_category(CategoryFilter::Category("Sport".into()));
        let names: Vec<String> = view.visible_counters().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Push-ups", "Laps"]);

        view.select_category(CategoryFilter::All);
        assert_eq!(view.visible_counters(), view.counters());
    }

    #[tokio::test]
    async fn menus_toggle_and_close_on_delete() {
        let (_gateway, view) = signed_in(vec![remote(1, "Water", 0, None, None)]).await;
        let id = id_of(&view, "Water");

        assert!(view.toggle_menu(id));
        assert!(view.is_menu_expanded(id));
        assert!(!view.toggle_menu(id));
        view.toggle_menu(id);

        assert_eq!(view.delete(id).await, MutationOutcome::Committed);
        assert!(!view.is_menu_expanded(id));
        assert!(view.counters().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_brings_row_back() {
        let (gateway, view) = signed_in(vec![remote(1, "Water", 0, None, None)]).await;
        let id = id_of(&view, "Water");

        gateway.fail_next();
        assert_eq!(view.delete(id).await, MutationOutcome::RolledBack);
        assert!(view.store().get(id).is_some());
    }
}
