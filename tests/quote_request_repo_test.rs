use quote_request_api::config::mongo_conf::MongoConfig;
use quote_request_api::model::quote_request::QuoteRequest;
use quote_request_api::repository::quote_request_repo::{MongoQuoteRequestRepository, QuoteRequestRepository};
use quote_request_api::repository::repository_error::{RepositoryError, RepositoryResult};
use tracing::info;

async fn setup_quote_request_repository() -> RepositoryResult<MongoQuoteRequestRepository> {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();
    let config = MongoConfig::from_env()
        .map_err(|e| RepositoryError::database(format!("Failed to load MongoConfig: {}", e)))?;
    MongoQuoteRequestRepository::new(&config)
        .await
        .map_err(|e| RepositoryError::database(format!("Failed to setup MongoQuoteRequestRepository: {}", e)))
}

fn sample_quote_request() -> QuoteRequest {
    QuoteRequest {
        id: None,
        firstName: "Amina".to_string(),
        lastName: "Benali".to_string(),
        jobTitle: "Office Manager".to_string(),
        zipCode: "16000".to_string(),
        email: "amina.benali@example.com".to_string(),
        number: "+213770000000".to_string(),
        city: "Algiers".to_string(),
        country: "Algeria".to_string(),
        message: "Please quote a full office fit-out.".to_string(),
        createdAt: None,
    }
}

#[tokio::test]
#[ignore] // Requires a running MongoDB and MONGO_URI
async fn test_quote_request_repository_workflow() {
    let repo = setup_quote_request_repository().await.expect("Failed to setup repository");
    let before = repo.count().await.expect("count before");

    let created = repo.create(sample_quote_request()).await.expect("create");
    let id = created.id.expect("created record has an id");
    assert!(created.createdAt.is_some());
    info!("Created quote request {}", id);

    let fetched = repo.get_by_id(id).await.expect("get_by_id");
    assert_eq!(fetched, created);

    let duplicate = repo.create(sample_quote_request()).await.expect("create duplicate");
    assert_ne!(duplicate.id, created.id);

    let after = repo.count().await.expect("count after");
    assert_eq!(after, before + 2);
}

#[tokio::test]
#[ignore] // Requires a running MongoDB and MONGO_URI
async fn test_get_missing_quote_request() {
    let repo = setup_quote_request_repository().await.expect("Failed to setup repository");
    let result = repo.get_by_id(bson::oid::ObjectId::new()).await;
    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
}
