/// In-memory registry, identity and status sink doubles with scriptable failures
use async_trait::async_trait;
use orgsync::modules::notification::ReportedError;
use orgsync::modules::registry::application::ports::{OrganisationRegistry, SystemIdentityProvider};
use orgsync::modules::registry::domain::{
    NewOrganisation, OrganisationReference, SubsidiaryLink, SystemIdentity,
};
use orgsync::shared::errors::{AppError, AppResult};
use orgsync::shared::resilience::{RetryEvent, RetryObserver};
use orgsync::{InMemoryStatusSink, RunStatus, StatusSink};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Failures are keyed by operation and subject. The subject is the value the
/// call was made with: a Companies House number, reference or name. Link
/// calls use the child organisation's name. `*` matches any subject.
#[derive(Default)]
pub struct FakeRegistry {
    organisations: Mutex<Vec<OrganisationReference>>,
    created: Mutex<Vec<NewOrganisation>>,
    links: Mutex<HashSet<(Uuid, Uuid)>>,
    linked: Mutex<Vec<SubsidiaryLink>>,
    transient: Mutex<HashMap<String, VecDeque<AppError>>>,
    permanent: Mutex<HashMap<String, AppError>>,
    cancel_hooks: Mutex<HashMap<String, CancellationToken>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an organisation that already exists in the registry
    pub fn with_organisation(
        self,
        name: &str,
        companies_house: Option<&str>,
        reference: Option<&str>,
    ) -> Self {
        self.organisations.lock().unwrap().push(OrganisationReference {
            id: Uuid::new_v4(),
            name: name.to_string(),
            companies_house_number: companies_house.map(str::to_string),
            reference_number: reference.map(str::to_string),
        });
        self
    }

    /// Seed an existing parent/child relationship between two seeded names
    pub fn with_link(self, parent: &str, child: &str) -> Self {
        let parent_id = self.find_by_name(parent).map(|r| r.id);
        let child_id = self.find_by_name(child).map(|r| r.id);
        if let (Some(parent_id), Some(child_id)) = (parent_id, child_id) {
            self.links.lock().unwrap().insert((parent_id, child_id));
        }
        self
    }

    /// Fail the next calls with `errors`, one per call, then behave normally
    pub fn fail_times(&self, operation: &str, subject: &str, errors: Vec<AppError>) {
        self.transient
            .lock()
            .unwrap()
            .insert(Self::key(operation, subject), errors.into());
    }

    /// Fail every call with `error`
    pub fn fail_always(&self, operation: &str, subject: &str, error: AppError) {
        self.permanent
            .lock()
            .unwrap()
            .insert(Self::key(operation, subject), error);
    }

    /// Number of calls made to `operation`, failed ones included
    /// Cancel `token` when the call is made. The call itself still succeeds.
    pub fn cancel_on(&self, operation: &str, subject: &str, token: CancellationToken) {
        self.cancel_hooks
            .lock()
            .unwrap()
            .insert(Self::key(operation, subject), token);
    }

    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{}:", operation);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    pub fn calls_for(&self, operation: &str, subject: &str) -> usize {
        let key = Self::key(operation, subject);
        self.calls.lock().unwrap().iter().filter(|call| **call == key).count()
    }

    pub fn created(&self) -> Vec<NewOrganisation> {
        self.created.lock().unwrap().clone()
    }

    pub fn linked(&self) -> Vec<SubsidiaryLink> {
        self.linked.lock().unwrap().clone()
    }

    pub fn find_by_name(&self, name: &str) -> Option<OrganisationReference> {
        self.organisations
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.matches_name(name))
            .cloned()
    }

    pub fn is_linked(&self, parent: &str, child: &str) -> bool {
        match (self.find_by_name(parent), self.find_by_name(child)) {
            (Some(parent), Some(child)) => {
                self.links.lock().unwrap().contains(&(parent.id, child.id))
            }
            _ => false,
        }
    }

    fn key(operation: &str, subject: &str) -> String {
        format!("{}:{}", operation, subject)
    }

    fn name_of(&self, id: Uuid) -> String {
        self.organisations
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.name.clone())
            .unwrap_or_default()
    }

    fn check(&self, operation: &str, subject: &str) -> AppResult<()> {
        let key = Self::key(operation, subject);
        self.calls.lock().unwrap().push(key.clone());
        if let Some(token) = self.cancel_hooks.lock().unwrap().get(&key) {
            token.cancel();
        }

        let wildcard = Self::key(operation, "*");
        for candidate in [key.as_str(), wildcard.as_str()] {
            if let Some(error) = self.permanent.lock().unwrap().get(candidate) {
                return Err(error.clone());
            }
            if let Some(queue) = self.transient.lock().unwrap().get_mut(candidate) {
                if let Some(error) = queue.pop_front() {
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrganisationRegistry for FakeRegistry {
    async fn lookup_by_companies_house_number(
        &self,
        number: &str,
    ) -> AppResult<Option<OrganisationReference>> {
        self.check("lookup_by_companies_house_number", number)?;
        Ok(self
            .organisations
            .lock()
            .unwrap()
            .iter()
            .find(|o| {
                o.companies_house_number
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(number))
            })
            .cloned())
    }

    async fn lookup_by_reference_number(
        &self,
        reference: &str,
    ) -> AppResult<Option<OrganisationReference>> {
        self.check("lookup_by_reference_number", reference)?;
        Ok(self
            .organisations
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.reference_number.as_deref() == Some(reference))
            .cloned())
    }

    async fn lookup_by_name(&self, name: &str) -> AppResult<Option<OrganisationReference>> {
        self.check("lookup_by_name", name)?;
        Ok(self.find_by_name(name))
    }

    async fn create_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> AppResult<OrganisationReference> {
        self.check("create_organisation", &organisation.name)?;
        let reference = OrganisationReference {
            id: Uuid::new_v4(),
            name: organisation.name.clone(),
            companies_house_number: organisation.companies_house_number.clone(),
            reference_number: organisation.reference_number.clone(),
        };
        self.organisations.lock().unwrap().push(reference.clone());
        self.created.lock().unwrap().push(organisation.clone());
        Ok(reference)
    }

    async fn link_subsidiary(&self, link: &SubsidiaryLink) -> AppResult<()> {
        self.check("link_subsidiary", &self.name_of(link.child_id))?;
        self.links
            .lock()
            .unwrap()
            .insert((link.parent_id, link.child_id));
        self.linked.lock().unwrap().push(link.clone());
        Ok(())
    }

    async fn relationship_exists(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool> {
        self.check("relationship_exists", &self.name_of(child_id))?;
        Ok(self.links.lock().unwrap().contains(&(parent_id, child_id)))
    }
}

/// Identity provider answering a fixed identity, or failing
pub struct FakeIdentity {
    result: AppResult<SystemIdentity>,
}

impl FakeIdentity {
    pub fn fixed() -> Self {
        Self {
            result: Ok(SystemIdentity {
                user_id: Uuid::new_v4(),
                organisation_id: Uuid::new_v4(),
            }),
        }
    }

    pub fn failing(error: AppError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl SystemIdentityProvider for FakeIdentity {
    async fn system_identity(&self) -> AppResult<SystemIdentity> {
        self.result.clone()
    }
}

/// Keeps every retry event it is told about
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RetryEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RetryEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RetryObserver for RecordingObserver {
    fn on_retry(&self, event: &RetryEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Status sink that fails chosen `set_status` calls, then records like the
/// in-memory sink. Call numbers start at 1.
pub struct FlakySink {
    inner: InMemoryStatusSink,
    failing_calls: Vec<usize>,
    status_calls: AtomicUsize,
}

impl FlakySink {
    pub fn failing_status_calls(failing_calls: Vec<usize>) -> Self {
        Self {
            inner: InMemoryStatusSink::new(),
            failing_calls,
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> &InMemoryStatusSink {
        &self.inner
    }
}

#[async_trait]
impl StatusSink for FlakySink {
    async fn set_status(&self, run_key: &str, status: RunStatus) -> AppResult<()> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_calls.contains(&call) {
            return Err(AppError::ExternalServiceError("503 blip".to_string()));
        }
        self.inner.set_status(run_key, status).await
    }

    async fn set_error_status(&self, run_key: &str, errors: Vec<ReportedError>) -> AppResult<()> {
        self.inner.set_error_status(run_key, errors).await
    }
}
