//! Creates the user session aggregate tables.
//!
//! The derived columns are `GENERATED ALWAYS` from the JSON payload, so their
//! expressions depend on the backend: `STORED` columns over `JSONB` on
//! PostgreSQL, `VIRTUAL` columns over `json_extract` on SQLite. The JSON keys
//! must stay in sync with the serde names in `crate::metadata`.

use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = match manager.get_database_backend() {
            DbBackend::Postgres => POSTGRES_UP,
            DbBackend::Sqlite => SQLITE_UP,
            other => {
                return Err(DbErr::Migration(format!(
                    "unsupported database backend: {other:?}"
                )))
            }
        };
        manager.get_connection().execute_unprepared(sql).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DOWN).await?;
        Ok(())
    }
}

const POSTGRES_UP: &str = r"
CREATE TABLE kc_user_session (
    id UUID PRIMARY KEY,
    version INTEGER NOT NULL DEFAULT 0,
    metadata JSONB NOT NULL,
    entity_version INTEGER GENERATED ALWAYS AS ((metadata->>'entityVersion')::INTEGER) STORED,
    realm_id TEXT GENERATED ALWAYS AS (metadata->>'realmId') STORED,
    user_id TEXT GENERATED ALWAYS AS (metadata->>'userId') STORED,
    broker_session_id TEXT GENERATED ALWAYS AS (metadata->>'brokerSessionId') STORED,
    broker_user_id TEXT GENERATED ALWAYS AS (metadata->>'brokerUserId') STORED,
    offline BOOLEAN GENERATED ALWAYS AS ((metadata->>'offline')::BOOLEAN) STORED,
    last_session_refresh BIGINT GENERATED ALWAYS AS ((metadata->>'lastSessionRefresh')::BIGINT) STORED,
    expiration BIGINT GENERATED ALWAYS AS ((metadata->>'expiration')::BIGINT) STORED
);
CREATE INDEX user_session_entity_version ON kc_user_session(entity_version);
CREATE INDEX user_session_realm_user ON kc_user_session(realm_id, user_id);
CREATE INDEX user_session_broker_session ON kc_user_session(realm_id, broker_session_id);
CREATE INDEX user_session_expiration ON kc_user_session(expiration);

CREATE TABLE kc_user_session_note (
    fk_root UUID NOT NULL REFERENCES kc_user_session(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (fk_root, name)
);

CREATE TABLE kc_client_session (
    id UUID PRIMARY KEY,
    fk_root UUID NOT NULL REFERENCES kc_user_session(id) ON DELETE CASCADE,
    metadata JSONB NOT NULL,
    entity_version INTEGER GENERATED ALWAYS AS ((metadata->>'entityVersion')::INTEGER) STORED,
    client_id TEXT GENERATED ALWAYS AS (metadata->>'clientId') STORED
);
CREATE INDEX client_session_root ON kc_client_session(fk_root);
CREATE INDEX client_session_client ON kc_client_session(client_id);

CREATE TABLE kc_client_session_note (
    fk_root UUID NOT NULL REFERENCES kc_client_session(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (fk_root, name)
);
";

// SQLite keeps UUIDs as 16-byte blobs and JSON as text.
const SQLITE_UP: &str = r"
CREATE TABLE kc_user_session (
    id BLOB PRIMARY KEY NOT NULL,
    version INTEGER NOT NULL DEFAULT 0,
    metadata TEXT NOT NULL,
    entity_version INTEGER GENERATED ALWAYS AS (json_extract(metadata, '$.entityVersion')) VIRTUAL,
    realm_id TEXT GENERATED ALWAYS AS (json_extract(metadata, '$.realmId')) VIRTUAL,
    user_id TEXT GENERATED ALWAYS AS (json_extract(metadata, '$.userId')) VIRTUAL,
    broker_session_id TEXT GENERATED ALWAYS AS (json_extract(metadata, '$.brokerSessionId')) VIRTUAL,
    broker_user_id TEXT GENERATED ALWAYS AS (json_extract(metadata, '$.brokerUserId')) VIRTUAL,
    offline BOOLEAN GENERATED ALWAYS AS (json_extract(metadata, '$.offline')) VIRTUAL,
    last_session_refresh BIGINT GENERATED ALWAYS AS (json_extract(metadata, '$.lastSessionRefresh')) VIRTUAL,
    expiration BIGINT GENERATED ALWAYS AS (json_extract(metadata, '$.expiration')) VIRTUAL
);
CREATE INDEX user_session_entity_version ON kc_user_session(entity_version);
CREATE INDEX user_session_realm_user ON kc_user_session(realm_id, user_id);
CREATE INDEX user_session_broker_session ON kc_user_session(realm_id, broker_session_id);
CREATE INDEX user_session_expiration ON kc_user_session(expiration);

CREATE TABLE kc_user_session_note (
    fk_root BLOB NOT NULL REFERENCES kc_user_session(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (fk_root, name)
);

CREATE TABLE kc_client_session (
    id BLOB PRIMARY KEY NOT NULL,
    fk_root BLOB NOT NULL REFERENCES kc_user_session(id) ON DELETE CASCADE,
    metadata TEXT NOT NULL,
    entity_version INTEGER GENERATED ALWAYS AS (json_extract(metadata, '$.entityVersion')) VIRTUAL,
    client_id TEXT GENERATED ALWAYS AS (json_extract(metadata, '$.clientId')) VIRTUAL
);
CREATE INDEX client_session_root ON kc_client_session(fk_root);
CREATE INDEX client_session_client ON kc_client_session(client_id);

CREATE TABLE kc_client_session_note (
    fk_root BLOB NOT NULL REFERENCES kc_client_session(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (fk_root, name)
);
";

const DOWN: &str = r"
DROP TABLE IF EXISTS kc_client_session_note;
DROP TABLE IF EXISTS kc_client_session;
DROP TABLE IF EXISTS kc_user_session_note;
DROP TABLE IF EXISTS kc_user_session;
";
