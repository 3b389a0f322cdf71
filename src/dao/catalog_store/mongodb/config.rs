use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DB: &str = "trophyhub";
const DEFAULT_COLLECTION: &str = "games";

#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
    pub collection_name: String,
}

impl MongoConfig {
    pub async fn from_uri(
        uri: &str,
        db_name: Option<&str>,
        collection: Option<&str>,
    ) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DB).to_owned(),
            collection_name: collection.unwrap_or(DEFAULT_COLLECTION).to_owned(),
        })
    }

    /// `MONGO_URI`, `MONGO_DB` and `MONGO_GAMES_COLLECTION`, each with a local default.
    pub async fn from_env() -> MongoResult<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        let uri = var("MONGO_URI").unwrap_or_else(|| DEFAULT_URI.to_owned());
        Self::from_uri(
            &uri,
            var("MONGO_DB").as_deref(),
            var("MONGO_GAMES_COLLECTION").as_deref(),
        )
        .await
    }
}
