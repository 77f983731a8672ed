//! Document store connector backing the cats feature.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database,
    bson::{doc, oid::ObjectId},
    error::{Error as MongoError, ErrorKind},
    options::ClientOptions,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    application::repos::{CatsRepo, HealthCheck, RepoError},
    config::Settings,
    domain::{cats::CatDraft, entities::Cat},
};

use super::{
    connector::{Connector, ConnectorKind},
    error::InfraError,
};

const CATS_COLLECTION: &str = "cats";
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

#[async_trait]
impl Connector for MongoConnector {
    type Handle = DocumentStore;

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Document
    }

    async fn connect(&self, settings: &Settings) -> Result<DocumentStore, InfraError> {
        let mut options = ClientOptions::parse(&settings.document.uri).await?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = Client::with_options(options)?;
        let database = client.default_database().ok_or_else(|| {
            InfraError::configuration("document.uri must name a default database")
        })?;

        database.run_command(doc! { "ping": 1 }).await?;

        info!(
            target = "cafe::document",
            database = %database.name(),
            "document store connected"
        );

        Ok(DocumentStore { client, database })
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    client: Client,
    database: Database,
}

impl DocumentStore {
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn cats(&self) -> Collection<CatDocument> {
        self.database.collection(CATS_COLLECTION)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    age: i32,
    breed: String,
}

impl CatDocument {
    fn into_cat(self) -> Cat {
        Cat {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: self.name,
            age: self.age,
            breed: self.breed,
        }
    }
}

fn map_mongo_error(err: MongoError) -> RepoError {
    if matches!(*err.kind, ErrorKind::ServerSelection { .. }) {
        RepoError::Unavailable(err.to_string())
    } else {
        RepoError::from_persistence(err)
    }
}

#[async_trait]
impl CatsRepo for DocumentStore {
    async fn list_cats(&self) -> Result<Vec<Cat>, RepoError> {
        let documents: Vec<CatDocument> = self
            .cats()
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)?;

        Ok(documents.into_iter().map(CatDocument::into_cat).collect())
    }

    async fn find_cat(&self, id: &str) -> Result<Option<Cat>, RepoError> {
        // Ids that are not ObjectIds cannot exist in the collection.
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let document = self
            .cats()
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(map_mongo_error)?;

        Ok(document.map(CatDocument::into_cat))
    }

    async fn create_cat(&self, draft: CatDraft) -> Result<Cat, RepoError> {
        let mut document = CatDocument {
            id: None,
            name: draft.name,
            age: draft.age,
            breed: draft.breed,
        };

        let inserted = self
            .cats()
            .insert_one(&document)
            .await
            .map_err(map_mongo_error)?;
        document.id = inserted.inserted_id.as_object_id();

        Ok(document.into_cat())
    }
}

#[async_trait]
impl HealthCheck for DocumentStore {
    fn name(&self) -> &'static str {
        ConnectorKind::Document.as_str()
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }
}
