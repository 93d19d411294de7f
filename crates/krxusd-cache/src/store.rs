use crate::error::{CacheError, CacheResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// Generic, typed get/set/delete/exists/expire plus sorted-set and
/// capped-list primitives over a single shared Redis connection.
///
/// Serialization is JSON; `rust_decimal::Decimal` fields are written as
/// strings (never floats) because the crate's `rust_decimal` dependency
/// is built with the `serde-with-str` feature everywhere in this
/// workspace.
#[derive(Clone)]
pub struct KVCache {
  conn: ConnectionManager,
}

impl KVCache {
  pub async fn connect(redis_url: &str) -> CacheResult<Self> {
    let client = redis::Client::open(redis_url)?;
    let conn = client.get_connection_manager().await?;
    Ok(KVCache { conn })
  }

  #[instrument(skip(self))]
  pub async fn health_check(&self) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
    if pong == "PONG" {
      Ok(())
    } else {
      Err(CacheError::Redis(redis::RedisError::from((
        redis::ErrorKind::ResponseError,
        "unexpected PING reply",
      ))))
    }
  }

  /// Absent keys return `Ok(None)`, never an error — per the cache
  /// error policy: "`get` on a missing key returns absent, never
  /// error."
  pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
    let mut conn = self.conn.clone();
    let raw: Option<String> = conn.get(key).await?;
    match raw {
      None => Ok(None),
      Some(s) => Ok(Some(serde_json::from_str(&s)?)),
    }
  }

  /// Every write that must not outlive its semantic freshness sets a
  /// TTL at write time; callers MUST NOT rely on external expiry.
  pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let raw = serde_json::to_string(value)?;
    let _: () = conn.set_ex(key, raw, ttl.as_secs().max(1)).await?;
    Ok(())
  }

  /// `MGET` across several keys in one round trip, preserving `keys`'
  /// order; a missing or undeserializable entry resolves to `None`
  /// rather than failing the whole batch.
  pub async fn get_many<T: DeserializeOwned>(&self, keys: &[&str]) -> CacheResult<Vec<Option<T>>> {
    if keys.is_empty() {
      return Ok(Vec::new());
    }
    let mut conn = self.conn.clone();
    let raws: Vec<Option<String>> = conn.mget(keys).await?;
    Ok(
      raws
        .into_iter()
        .map(|raw| raw.and_then(|s| serde_json::from_str(&s).ok()))
        .collect(),
    )
  }

  /// Pipelines `SET EX` for every `(key, value, ttl)` triple in one
  /// round trip instead of one call per key.
  pub async fn set_many<T: Serialize>(&self, items: &[(&str, &T, Duration)]) -> CacheResult<()> {
    if items.is_empty() {
      return Ok(());
    }
    let mut conn = self.conn.clone();
    let mut pipe = redis::pipe();
    pipe.atomic();
    for (key, value, ttl) in items {
      let raw = serde_json::to_string(*value)?;
      pipe.set_ex(*key, raw, ttl.as_secs().max(1));
    }
    let _: () = pipe.query_async(&mut conn).await?;
    Ok(())
  }

  pub async fn delete(&self, key: &str) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.del(key).await?;
    Ok(())
  }

  pub async fn exists(&self, key: &str) -> CacheResult<bool> {
    let mut conn = self.conn.clone();
    let exists: bool = conn.exists(key).await?;
    Ok(exists)
  }

  pub async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.expire(key, ttl.as_secs() as i64).await?;
    Ok(())
  }

  /// Scan-by-prefix, used sparingly (no routine hot path depends on
  /// it) to enumerate keys under a namespace for diagnostics/cleanup.
  pub async fn scan_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
    let mut conn = self.conn.clone();
    let pattern = format!("{prefix}*");
    let keys: Vec<String> = conn.keys(pattern).await?;
    Ok(keys)
  }

  /// `ZADD key score member`, upserting the member's score.
  pub async fn zadd(&self, key: &str, member: &str, score: f64) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.zadd(key, member, score).await?;
    Ok(())
  }

  /// `ZRANGEBYSCORE key min max`.
  pub async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> CacheResult<Vec<String>> {
    let mut conn = self.conn.clone();
    let members: Vec<String> = conn.zrangebyscore(key, min, max).await?;
    Ok(members)
  }

  /// `ZSCORE key member`.
  pub async fn zscore(&self, key: &str, member: &str) -> CacheResult<Option<f64>> {
    let mut conn = self.conn.clone();
    let score: Option<f64> = conn.zscore(key, member).await?;
    Ok(score)
  }

  /// `ZREMRANGEBYSCORE key min max`.
  pub async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> CacheResult<u64> {
    let mut conn = self.conn.clone();
    let removed: u64 = conn.zrembyscore(key, min, max).await?;
    Ok(removed)
  }

  pub async fn zrem(&self, key: &str, member: &str) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.zrem(key, member).await?;
    Ok(())
  }

  pub async fn zset_expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
    self.expire(key, ttl).await
  }

  /// `LPUSH key value` followed by `LTRIM key 0 cap-1` and a TTL
  /// refresh, used for the bounded run-history ring buffers (scheduler
  /// history cap 100, batch history cap 30).
  pub async fn push_capped<T: Serialize>(
    &self,
    key: &str,
    value: &T,
    cap: isize,
    ttl: Duration,
  ) -> CacheResult<()> {
    let mut conn = self.conn.clone();
    let raw = serde_json::to_string(value)?;
    let _: () = conn.lpush(key, raw).await?;
    let _: () = conn.ltrim(key, 0, cap - 1).await?;
    let _: () = conn.expire(key, ttl.as_secs() as i64).await?;
    Ok(())
  }

  /// The full bounded list, newest first (matches `push_capped`'s
  /// `LPUSH` ordering).
  pub async fn list_range<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Vec<T>> {
    let mut conn = self.conn.clone();
    let raws: Vec<String> = conn.lrange(key, 0, -1).await?;
    raws
      .into_iter()
      .map(|raw| serde_json::from_str(&raw).map_err(CacheError::from))
      .collect()
  }
}
