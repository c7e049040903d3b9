#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::cache::memory::MemoryCache;
    use crate::cache::ResultCache;

    const TTL: Duration = Duration::from_secs(60);

    // ============================================================
    // BASIC OPERATIONS
    // ============================================================

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache.set("key-1", b"payload".to_vec(), TTL).await.unwrap();

        let value = cache.get("key-1").await.unwrap();
        assert_eq!(value, Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_a_miss_not_an_error() {
        let cache = MemoryCache::new();
        assert!(cache.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryCache::new();

        cache.set("key-1", b"first".to_vec(), TTL).await.unwrap();
        cache.set("key-1", b"second".to_vec(), TTL).await.unwrap();

        let value = cache.get("key-1").await.unwrap();
        assert_eq!(value, Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();

        cache.set("key-1", b"payload".to_vec(), TTL).await.unwrap();
        cache.delete("key-1").await.unwrap();

        assert!(cache.get("key-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_fine() {
        let cache = MemoryCache::new();
        assert!(cache.delete("absent").await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_flushes_namespace() {
        let cache = MemoryCache::new();

        cache.set("key-1", b"a".to_vec(), TTL).await.unwrap();
        cache.set("key-2", b"b".to_vec(), TTL).await.unwrap();
        cache.set("key-3", b"c".to_vec(), TTL).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.is_empty());
        assert!(cache.get("key-1").await.unwrap().is_none());
        assert!(cache.get("key-2").await.unwrap().is_none());
    }

    // ============================================================
    // TTL BEHAVIOR
    // ============================================================

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let cache = MemoryCache::new();

        cache
            .set("short-lived", b"payload".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("short-lived").await.unwrap().is_none());
        // The expired entry is dropped on read.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_within_ttl() {
        let cache = MemoryCache::new();

        cache
            .set("long-lived", b"payload".to_vec(), Duration::from_secs(300))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(cache.get("long-lived").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ping() {
        let cache = MemoryCache::new();
        assert!(cache.ping().await.is_ok());
    }
}
