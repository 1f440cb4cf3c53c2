//! Redis cache store
//!
//! Values use `SET key value EX ttl`; each tag is a set of the keys
//! registered under it, expiring with the newest member.

use super::{CacheError, CacheStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError> {
        let secs = ttl.as_secs().max(1);
        let mut pipe = redis::pipe();
        pipe.cmd("SET").arg(key).arg(value).arg("EX").arg(secs).ignore();
        for tag in tags {
            pipe.cmd("SADD").arg(tag).arg(key).ignore();
            pipe.cmd("EXPIRE").arg(tag).arg(secs).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let keys = redis::cmd("SMEMBERS")
            .arg(tag)
            .query_async::<_, Vec<String>>(&mut conn)
            .await?;

        let mut del = redis::cmd("DEL");
        del.arg(tag);
        for key in &keys {
            del.arg(key);
        }
        del.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}
