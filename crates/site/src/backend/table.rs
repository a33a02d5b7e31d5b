//! PostgREST client for the `restaurants` table.
//!
//! Every write asks for `Prefer: return=representation` so that an update
//! or delete that matched no row (wrong id, or a row owned by someone else)
//! comes back as an empty array and is reported as `StoreError::NotFound`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use gastro_serra_core::{Restaurant, RestaurantFields, RestaurantId, UserId};

use super::types::{NewRestaurantRow, StoreErrorBody};
use super::{ListScope, RestaurantStore, StoreError};
use crate::config::SupabaseConfig;
use crate::models::AuthSession;

const TABLE_PATH: &str = "rest/v1/restaurants";

/// Client for the hosted `restaurants` table.
#[derive(Clone)]
pub struct SupabaseTable {
    inner: Arc<SupabaseTableInner>,
}

struct SupabaseTableInner {
    client: reqwest::Client,
    config: SupabaseConfig,
}

/// Filters appended to the table URL.
enum Filter {
    Id(RestaurantId),
    Owner(UserId),
}

impl SupabaseTable {
    /// Create a new table client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseTableInner {
                client,
                config: config.clone(),
            }),
        }
    }

    /// Build the table URL with PostgREST filters.
    fn url(&self, select: bool, filters: &[Filter]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.inner.config.endpoint(TABLE_PATH)).map_err(|e| {
            StoreError::Rejected {
                message: format!("invalid table url: {e}"),
                code: None,
            }
        })?;

        {
            let mut query = url.query_pairs_mut();
            if select {
                query.append_pair("select", "*");
                query.append_pair("order", "created_at.desc");
            }
            for filter in filters {
                match filter {
                    Filter::Id(id) => query.append_pair("id", &format!("eq.{id}")),
                    Filter::Owner(owner) => query.append_pair("created_by", &format!("eq.{owner}")),
                };
            }
        }

        Ok(url)
    }

    /// Start a request authorized as `actor`, or anonymously with the anon key.
    fn request(&self, method: Method, url: Url, actor: Option<&AuthSession>) -> RequestBuilder {
        let anon_key = self.inner.config.anon_key.expose_secret();
        let bearer = actor.map_or(anon_key, |a| a.access_token().expose_secret());

        self.inner
            .client
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(bearer)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (message, code) = match serde_json::from_str::<StoreErrorBody>(&body) {
                Ok(err) => {
                    debug!(
                        status = %status,
                        code = ?err.code,
                        details = ?err.details,
                        hint = ?err.hint,
                        "store rejected request"
                    );
                    (err.message, err.code)
                }
                Err(_) => (format!("HTTP {status}"), None),
            };
            return Err(StoreError::Rejected { message, code });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a write that returns the affected rows and expect exactly one.
    async fn execute_one(&self, request: RequestBuilder) -> Result<Restaurant, StoreError> {
        let rows: Vec<Restaurant> = self
            .execute(request.header("Prefer", "return=representation"))
            .await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl RestaurantStore for SupabaseTable {
    #[instrument(skip(self, scope))]
    async fn list(&self, scope: ListScope<'_>) -> Result<Vec<Restaurant>, StoreError> {
        let (filters, actor) = match scope {
            ListScope::Everyone => (Vec::new(), None),
            ListScope::OwnedBy(actor) => (vec![Filter::Owner(actor.identity.id)], Some(actor)),
        };

        let url = self.url(true, &filters)?;
        self.execute(self.request(Method::GET, url, actor)).await
    }

    #[instrument(skip(self, actor, fields), fields(user_id = %actor.identity.id))]
    async fn insert(
        &self,
        actor: &AuthSession,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, StoreError> {
        let row = NewRestaurantRow {
            fields,
            created_by: actor.identity.id,
        };
        let url = self.url(false, &[])?;

        self.execute_one(self.request(Method::POST, url, Some(actor)).json(&[row]))
            .await
    }

    #[instrument(skip(self, actor, fields), fields(user_id = %actor.identity.id))]
    async fn update(
        &self,
        actor: &AuthSession,
        id: RestaurantId,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, StoreError> {
        let url = self.url(false, &[Filter::Id(id), Filter::Owner(actor.identity.id)])?;

        self.execute_one(self.request(Method::PATCH, url, Some(actor)).json(fields))
            .await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.identity.id))]
    async fn delete(&self, actor: &AuthSession, id: RestaurantId) -> Result<(), StoreError> {
        let url = self.url(false, &[Filter::Id(id), Filter::Owner(actor.identity.id)])?;

        self.execute_one(self.request(Method::DELETE, url, Some(actor)))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn table() -> SupabaseTable {
        SupabaseTable::new(
            reqwest::Client::new(),
            &SupabaseConfig {
                url: Url::parse("https://abcd.supabase.co").unwrap(),
                anon_key: SecretString::from("anon"),
            },
        )
    }

    #[test]
    fn test_listing_url_orders_by_recency() {
        let url = table().url(true, &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcd.supabase.co/rest/v1/restaurants?select=*&order=created_at.desc"
        );
    }

    #[test]
    fn test_scoped_write_url() {
        let id = RestaurantId::random();
        let owner = UserId::random();
        let url = table()
            .url(false, &[Filter::Id(id), Filter::Owner(owner)])
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), format!("eq.{id}")),
                ("created_by".to_string(), format!("eq.{owner}")),
            ]
        );
    }
}
