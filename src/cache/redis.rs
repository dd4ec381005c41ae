//! Redis cache store using bb8 connection pool.

use std::collections::HashMap;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, Script, Value};

use crate::cache::{CacheBatch, CacheCommand, CacheError, CacheStore, CacheValue, check_ttl};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

/// HSET + EXPIRE guarded by EXISTS, evaluated server side as one unit.
const HSET_EXISTING_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
  redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
  redis.call('EXPIRE', KEYS[1], ARGV[3])
  return 1
end
return 0
";

/// Redis-backed cache store with bb8 connection pool.
///
/// Batches run inside `MULTI`/`EXEC`, so other clients never observe a
/// half-applied batch.
pub struct RedisCacheStore {
    pool: RedisPool,
    hset_existing: Script,
}

impl RedisCacheStore {
    pub async fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            hset_existing: Script::new(HSET_EXISTING_SCRIPT),
        })
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

fn operation_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        CacheError::Connection(e.to_string())
    } else {
        CacheError::Operation(e.to_string())
    }
}

fn ttl_arg(ttl_seconds: u64) -> Result<i64, CacheError> {
    i64::try_from(check_ttl(ttl_seconds)?).map_err(|e| CacheError::Operation(e.to_string()))
}

fn from_redis_value(value: Value) -> CacheValue {
    match value {
        Value::BulkString(bytes) => CacheValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Value::SimpleString(text) => CacheValue::Text(text),
        Value::Int(n) => CacheValue::Integer(n),
        Value::Boolean(b) => CacheValue::Bool(b),
        other => CacheValue::Other(format!("{:?}", other)),
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<CacheValue>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let value: Option<Value> = conn_ref.hget(key, field).await.map_err(operation_error)?;
        Ok(value.map(from_redis_value))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, CacheValue>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let values: HashMap<String, Value> = conn_ref.hgetall(key).await.map_err(operation_error)?;
        Ok(values
            .into_iter()
            .map(|(field, value)| (field, from_redis_value(value)))
            .collect())
    }

    async fn hset(&self, key: &str, fields: &[(String, CacheValue)]) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let items: Vec<(&str, String)> = fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.to_wire()))
            .collect();

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let _: () = conn_ref
            .hset_multiple(key, &items)
            .await
            .map_err(operation_error)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.exists(key).await.map_err(operation_error)
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let removed: i64 = conn_ref.del(key).await.map_err(operation_error)?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        let ttl = ttl_arg(ttl_seconds)?;
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .expire(key, ttl)
            .await
            .map_err(operation_error)
    }

    async fn hset_existing(
        &self,
        key: &str,
        field: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError> {
        let ttl = ttl_arg(ttl_seconds)?;
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let updated: i64 = self
            .hset_existing
            .key(key)
            .arg(field)
            .arg(value.to_wire())
            .arg(ttl)
            .invoke_async(conn_ref)
            .await
            .map_err(operation_error)?;
        Ok(updated == 1)
    }

    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in batch.into_commands() {
            match command {
                CacheCommand::Del { key } => {
                    pipe.del(key).ignore();
                }
                CacheCommand::HSet { key, fields } => {
                    let items: Vec<(String, String)> = fields
                        .into_iter()
                        .map(|(field, value)| (field, value.to_wire()))
                        .collect();
                    pipe.hset_multiple(key, &items).ignore();
                }
                CacheCommand::Expire { key, ttl_seconds } => {
                    pipe.expire(key, ttl_arg(ttl_seconds)?).ignore();
                }
            }
        }

        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let _: () = pipe.query_async(conn_ref).await.map_err(operation_error)?;
        Ok(())
    }
}
