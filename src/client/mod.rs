//! Typed wrappers around the planner API.
//!
//! Payloads are validated locally before they are sent. Successful reads are
//! cached by request path; successful writes invalidate the paths they touch.

pub mod cache;
pub mod error;

pub use cache::QueryCache;
pub use error::ClientError;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    ContentBody, MonthGoal, NewTask, Note, Principal, Rule, Task, TaskFilter, TaskPatch,
};
use crate::schema::{
    validate_content_body, validate_date, validate_month, validate_new_task, validate_task_patch,
};
use error::ErrorBody;

pub const TASKS_PATH: &str = "/api/tasks";
pub const RULES_PATH: &str = "/api/rules";

pub struct PlannerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    cache: QueryCache,
}

impl PlannerClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            cache: QueryCache::new(),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn current_user(&self) -> Result<Principal, ClientError> {
        let response = self.request(Method::GET, "/api/auth/user").send().await?;
        decode(response).await
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ClientError> {
        let key = match filter.bounds() {
            Some((start, end)) => {
                validate_date("start", start)?;
                validate_date("end", end)?;
                format!("{TASKS_PATH}?start={start}&end={end}")
            }
            None => TASKS_PATH.to_string(),
        };
        self.cached_get(&key).await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        let body = validate_new_task(&serde_json::to_value(task)?)?;
        let created = self.send_json(Method::POST, TASKS_PATH, &body).await?;
        self.cache.invalidate(TASKS_PATH);
        Ok(created)
    }

    pub async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Task, ClientError> {
        let body = validate_task_patch(&serde_json::to_value(patch)?)?;
        let updated = self
            .send_json(Method::PUT, &format!("{TASKS_PATH}/{id}"), &body)
            .await?;
        self.cache.invalidate(TASKS_PATH);
        Ok(updated)
    }

    /// Flip completion, keeping date and content as they are.
    pub async fn toggle_task(&self, task: &Task) -> Result<Task, ClientError> {
        let patch = TaskPatch {
            completed: Some(!task.completed),
            ..TaskPatch::default()
        };
        self.update_task(task.id, &patch).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        self.send_delete(&format!("{TASKS_PATH}/{id}")).await?;
        self.cache.invalidate(TASKS_PATH);
        Ok(())
    }

    pub async fn list_rules(&self) -> Result<Vec<Rule>, ClientError> {
        self.cached_get(RULES_PATH).await
    }

    pub async fn create_rule(&self, content: &str) -> Result<Rule, ClientError> {
        let body = content_body(content)?;
        let rule = self.send_json(Method::POST, RULES_PATH, &body).await?;
        self.cache.invalidate(RULES_PATH);
        Ok(rule)
    }

    pub async fn delete_rule(&self, id: i64) -> Result<(), ClientError> {
        self.send_delete(&format!("{RULES_PATH}/{id}")).await?;
        self.cache.invalidate(RULES_PATH);
        Ok(())
    }

    pub async fn get_note(&self, date: &str) -> Result<Option<Note>, ClientError> {
        validate_date("date", date)?;
        self.cached_get(&format!("/api/notes/{date}")).await
    }

    pub async fn save_note(&self, date: &str, content: &str) -> Result<Note, ClientError> {
        validate_date("date", date)?;
        let path = format!("/api/notes/{date}");
        let note = self
            .send_json(Method::POST, &path, &content_body(content)?)
            .await?;
        self.cache.invalidate(&path);
        Ok(note)
    }

    pub async fn get_month_goal(&self, month: &str) -> Result<Option<MonthGoal>, ClientError> {
        validate_month("month", month)?;
        self.cached_get(&format!("/api/month-goals/{month}")).await
    }

    pub async fn save_month_goal(
        &self,
        month: &str,
        content: &str,
    ) -> Result<MonthGoal, ClientError> {
        validate_month("month", month)?;
        let path = format!("/api/month-goals/{month}");
        let goal = self
            .send_json(Method::POST, &path, &content_body(content)?)
            .await?;
        self.cache.invalidate(&path);
        Ok(goal)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn cached_get<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(hit) = self.cache.get(path) {
            return Ok(hit);
        }
        let response = self.request(Method::GET, path).send().await?;
        let value: T = decode(response).await?;
        self.cache.put(path, &value);
        Ok(value)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self.request(method, path).json(body).send().await?;
        decode(response).await
    }

    async fn send_delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.request(Method::DELETE, path).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(error_for(response).await)
    }
}

fn content_body(content: &str) -> Result<ContentBody, ClientError> {
    let value = serde_json::json!({ "content": content });
    Ok(validate_content_body(&value)?)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if response.status().is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    Err(error_for(response).await)
}

async fn error_for(response: Response) -> ClientError {
    match response.status() {
        StatusCode::BAD_REQUEST => match response.json::<ErrorBody>().await {
            Ok(body) => ClientError::Validation {
                field: body.field.unwrap_or_default(),
                message: body.message,
            },
            Err(_) => ClientError::Status(400),
        },
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden,
        StatusCode::NOT_FOUND => ClientError::NotFound,
        other => ClientError::Status(other.as_u16()),
    }
}
