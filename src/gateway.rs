//! Translation between domain operations and the two REST namespaces.
//!
//! Every public function here is total: transport and decoding failures are
//! logged and folded into the declared failure value, so callers only branch
//! on success or failure and never on network primitives.

use crate::config::Config;
use crate::errors::{AuthFailure, GatewayError};
use crate::models::{CounterDetails, NewCounter, RemoteCounter, RemoteId, Session};
use crate::wire::{
    AmountField, ApiCounter, AuthResponse, CreateFields, DataBody, DetailFields, Envelope,
    LoginBody, RegisterBody, decode_counters, error_message,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, error};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

pub trait RemoteGateway: Send + Sync {
    fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, AuthFailure>> + Send;

    fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, AuthFailure>> + Send;

    fn list_counters(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<RemoteCounter>, GatewayError>> + Send;

    /// `None` when the record could not be created.
    fn create_counter(
        &self,
        token: &str,
        counter: &NewCounter,
    ) -> impl Future<Output = Option<RemoteCounter>> + Send;

    fn update_counter_details(
        &self,
        token: &str,
        id: RemoteId,
        details: &CounterDetails,
        clamped_amount: Option<u64>,
    ) -> impl Future<Output = bool> + Send;

    fn update_counter_count(
        &self,
        token: &str,
        id: RemoteId,
        count: u64,
    ) -> impl Future<Output = bool> + Send;

    fn delete_counter(&self, token: &str, id: RemoteId) -> impl Future<Output = bool> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    api_base: String,
    auth_base: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            auth_base: config.auth_base.clone(),
        }
    }

    fn record_url(&self, id: RemoteId) -> String {
        format!("{}/{id}", self.api_base)
    }

    async fn authenticate<B: Serialize>(
        &self,
        url: String,
        body: &B,
    ) -> Result<Session, GatewayError> {
        let response = send(self.client.post(url).json(body)).await?;
        let auth: AuthResponse = response.json().await?;
        Ok(Session {
            token: auth.jwt,
            user: auth.user,
        })
    }

    async fn try_list(&self, token: &str) -> Result<Vec<RemoteCounter>, GatewayError> {
        let response = send(self.client.get(&self.api_base).bearer_auth(token)).await?;
        let envelope: Envelope<Vec<Value>> = response.json().await?;
        Ok(decode_counters(envelope.data))
    }

    async fn try_create(
        &self,
        token: &str,
        counter: &NewCounter,
    ) -> Result<RemoteCounter, GatewayError> {
        let body = DataBody {
            data: CreateFields::from(counter),
        };
        let request = self.client.post(&self.api_base).bearer_auth(token).json(&body);
        let envelope: Envelope<ApiCounter> = send(request).await?.json().await?;
        RemoteCounter::try_from(envelope.data)
    }

    async fn try_put<T: Serialize>(
        &self,
        token: &str,
        id: RemoteId,
        fields: T,
    ) -> Result<(), GatewayError> {
        let request = self
            .client
            .put(self.record_url(id))
            .bearer_auth(token)
            .json(&DataBody { data: fields });
        send(request).await?;
        Ok(())
    }

    async fn try_delete(&self, token: &str, id: RemoteId) -> Result<(), GatewayError> {
        send(self.client.delete(self.record_url(id)).bearer_auth(token)).await?;
        Ok(())
    }
}

/// Sends the request and turns any non-2xx status into `GatewayError::Status`.
async fn send(request: RequestBuilder) -> Result<Response, GatewayError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn auth_failure(err: GatewayError, fallback: &str) -> AuthFailure {
    match err {
        GatewayError::Status {
            message: Some(message),
            ..
        } => AuthFailure::new(message),
        _ => AuthFailure::new(fallback),
    }
}

impl RemoteGateway for HttpGateway {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthFailure> {
        let body = RegisterBody {
            username,
            email,
            password,
        };
        let url = format!("{}/local/register", self.auth_base);
        self.authenticate(url, &body).await.map_err(|err| {
            error!("registration failed: {err}");
            auth_failure(err, REGISTRATION_FAILED)
        })
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<Session, AuthFailure> {
        let body = LoginBody {
            identifier,
            password,
        };
        let url = format!("{}/local", self.auth_base);
        self.authenticate(url, &body).await.map_err(|err| {
            error!("login failed: {err}");
            auth_failure(err, LOGIN_FAILED)
        })
    }

    async fn list_counters(&self, token: &str) -> Result<Vec<RemoteCounter>, GatewayError> {
        let result = self.try_list(token).await;
        match &result {
            Ok(counters) => debug!("fetched {} counters", counters.len()),
            Err(err) => error!("failed to fetch counters: {err}"),
        }
        result
    }

    async fn create_counter(&self, token: &str, counter: &NewCounter) -> Option<RemoteCounter> {
        self.try_create(token, counter)
            .await
            .map_err(|err| error!("failed to create counter: {err}"))
            .ok()
    }

    async fn update_counter_details(
        &self,
        token: &str,
        id: RemoteId,
        details: &CounterDetails,
        clamped_amount: Option<u64>,
    ) -> bool {
        let fields = DetailFields::new(details, clamped_amount);
        self.try_put(token, id, fields)
            .await
            .map_err(|err| error!("failed to update counter {id} details: {err}"))
            .is_ok()
    }

    async fn update_counter_count(&self, token: &str, id: RemoteId, count: u64) -> bool {
        self.try_put(token, id, AmountField { amount: count })
            .await
            .map_err(|err| error!("failed to update counter {id}: {err}"))
            .is_ok()
    }

    async fn delete_counter(&self, token: &str, id: RemoteId) -> bool {
        self.try_delete(token, id)
            .await
            .map_err(|err| error!("failed to delete counter {id}: {err}"))
            .is_ok()
    }
}
