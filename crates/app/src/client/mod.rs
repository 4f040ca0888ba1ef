use api_types::{
    budget::{Budget, BudgetForm, BudgetPatch},
    dashboard::BudgetDashboard,
    response::ApiResponse,
};
use reqwest::{Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::error::{AppError, Result};

const CREATE_FAILED: &str = "Erreur lors de la création du budget";
const FETCH_FAILED: &str = "Erreur lors de la récupération du budget";
const UPDATE_FAILED: &str = "Erreur lors de la mise à jour du budget";
const DELETE_FAILED: &str = "Erreur lors de la suppression du budget";
const DASHBOARD_FAILED: &str = "Erreur lors de la récupération du dashboard";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("session expirée ou jeton invalide")]
    Unauthorized,
    #[error("accès refusé")]
    Forbidden,
    #[error("budget introuvable")]
    NotFound,
    #[error("conflit : {0}")]
    Conflict(String),
    #[error("erreur de validation : {0}")]
    Validation(String),
    #[error("erreur serveur : {0}")]
    Server(String),
    /// `success: false`, or a success without data.
    #[error("{0}")]
    Rejected(String),
    #[error("serveur injoignable : {0}")]
    Transport(#[from] reqwest::Error),
}

/// Unwraps the `{ success, message, data }` envelope of a response body.
///
/// Error statuses map to the matching variant; the envelope message is kept
/// when present, `fallback` otherwise.
pub fn read_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    fallback: &str,
) -> std::result::Result<Option<T>, ClientError> {
    let envelope = serde_json::from_slice::<ApiResponse<T>>(body).ok();
    let message = envelope
        .as_ref()
        .map(|env| env.message.trim())
        .filter(|message| !message.is_empty())
        .unwrap_or(fallback)
        .to_string();

    if !status.is_success() {
        return Err(match status.as_u16() {
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden,
            404 => ClientError::NotFound,
            409 => ClientError::Conflict(message),
            400 | 422 => ClientError::Validation(message),
            _ => ClientError::Server(message),
        });
    }

    match envelope {
        Some(ApiResponse {
            success: true,
            data,
            ..
        }) => Ok(data),
        _ => Err(ClientError::Rejected(message)),
    }
}

fn require<T>(data: Option<T>, fallback: &str) -> std::result::Result<T, ClientError> {
    data.ok_or_else(|| ClientError::Rejected(fallback.to_string()))
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        // A trailing slash keeps `join` from dropping the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|err| AppError::InvalidInput(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            token,
            http: reqwest::Client::new(),
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        fallback: &str,
    ) -> std::result::Result<Option<T>, ClientError> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| ClientError::Server(format!("invalid base_url: {err}")))?;

        let mut request = self.http.request(method.clone(), endpoint);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let res = request.send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        tracing::debug!(%method, path, %status, "api call");
        read_envelope(status, &bytes, fallback)
    }

    pub async fn create_budget(
        &self,
        form: &BudgetForm,
    ) -> std::result::Result<Budget, ClientError> {
        let data = self
            .call(Method::POST, "budgets", Some(form), CREATE_FAILED)
            .await?;
        require(data, CREATE_FAILED)
    }

    pub async fn get_budget(&self) -> std::result::Result<Budget, ClientError> {
        let data = self
            .call::<(), _>(Method::GET, "budgets", None, FETCH_FAILED)
            .await?;
        require(data, FETCH_FAILED)
    }

    pub async fn update_budget(
        &self,
        id: i64,
        patch: &BudgetPatch,
    ) -> std::result::Result<Budget, ClientError> {
        let data = self
            .call(Method::PATCH, &format!("budgets/{id}"), Some(patch), UPDATE_FAILED)
            .await?;
        require(data, UPDATE_FAILED)
    }

    pub async fn delete_budget(&self, id: i64) -> std::result::Result<(), ClientError> {
        self.call::<(), serde_json::Value>(
            Method::DELETE,
            &format!("budgets/{id}"),
            None,
            DELETE_FAILED,
        )
        .await?;
        Ok(())
    }

    pub async fn get_dashboard(&self) -> std::result::Result<BudgetDashboard, ClientError> {
        let data = self
            .call::<(), _>(Method::GET, "budgets/dashboard", None, DASHBOARD_FAILED)
            .await?;
        require(data, DASHBOARD_FAILED)
    }
}
