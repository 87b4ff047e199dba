/// Read-through caching over an optional [`Cache`](crate::db::Cache).
///
/// With no cache configured the block simply runs. With a cache, a hit is
/// returned directly; a miss or a failed read runs the block and queues the
/// result for a background write. Cache trouble is logged, never returned.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live of the written entry, in seconds.
/// * `$block`: future producing an `AppResult` of the value on a miss.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache.as_ref(), key, 3600, async move { fetch_page().await })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache {
            Some(cache) => {
                let hit = match cache.get_from_cache(&$key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(key = %$key, error = %e, "Cache read failed, treating as miss");
                        None
                    }
                };
                match hit {
                    Some(cached) => Ok(cached),
                    None => {
                        let value = $block.await?;
                        cache.set_in_background(&$key, &value, $ttl);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}
