use crate::config::mongo_conf::{MongoConfig, DEFAULT_DATABASE};
use crate::model::quote_request::QuoteRequest;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::{error, info};

/// Append-only store for quote requests.
#[async_trait]
pub trait QuoteRequestRepository: Send + Sync {
    /// Insert a new document. Every call creates a new record with a fresh id.
    async fn create(&self, quote_request: QuoteRequest) -> RepositoryResult<QuoteRequest>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRequest>;
    async fn count(&self) -> RepositoryResult<u64>;
}

pub struct MongoQuoteRequestRepository {
    collection: mongodb::Collection<QuoteRequest>,
}

impl MongoQuoteRequestRepository {
    /// Create a new MongoQuoteRequestRepository using MongoConfig
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        use mongodb::{
            options::{ClientOptions, Credential, ResolverConfig},
            Client,
        };

        let mut client_options =
            ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
        client_options.app_name = Some("QuoteRequestApi".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));
        client_options.server_selection_timeout =
            Some(std::time::Duration::from_secs(config.connection_timeout_secs));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            client_options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .build(),
            );
        }

        let database_name = config
            .database
            .clone()
            .or_else(|| client_options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&database_name);
        let collection = db.collection::<QuoteRequest>(&config.quote_request_collection);
        info!(
            database = %database_name,
            collection = %config.quote_request_collection,
            "Quote request repository ready"
        );
        Ok(MongoQuoteRequestRepository { collection })
    }
}

#[async_trait]
impl QuoteRequestRepository for MongoQuoteRequestRepository {
    #[tracing::instrument(skip(self, quote_request), fields(email = %quote_request.email))]
    async fn create(&self, quote_request: QuoteRequest) -> RepositoryResult<QuoteRequest> {
        info!("Creating new quote request");
        let mut new_request = quote_request;
        new_request.id = Some(ObjectId::new());
        new_request.createdAt = Some(chrono::Utc::now().to_rfc3339());

        match self.collection.insert_one(&new_request, None).await {
            Ok(_) => {
                info!(id = ?new_request.id, "Quote request created successfully");
                Ok(new_request)
            }
            Err(e) => {
                error!("Failed to create quote request: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRequest> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(quote_request)) => Ok(quote_request),
            Ok(None) => {
                error!("Quote request not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("Quote request not found for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to fetch quote request by ID: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self) -> RepositoryResult<u64> {
        let count = self.collection.count_documents(None, None).await.map_err(|e| {
            error!("Failed to count quote requests: {}", e);
            RepositoryError::from(e)
        })?;
        info!("Total quote requests: {}", count);
        Ok(count)
    }
}
