use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::{Result, SubrelayError};
use super::{EngineLoader, TranslationEngine};

/// Observable lifecycle of the shared engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayState {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

/// Settled outcome guarded by the init lock. `Ready` lives outside the lock.
enum Settled {
    Unloaded,
    Failed(String),
}

/// Lazily constructs the translation engine once and shares it.
///
/// Construction is single-flight: the first caller builds the engine while
/// holding the init lock, later callers wait on that lock (bounded by
/// `init_timeout`) and observe the settled outcome. A failure is cached until
/// [`EngineGateway::retry`] is called. Once ready, the engine is read without
/// any locking.
pub struct EngineGateway {
    loader: Arc<dyn EngineLoader>,
    init_timeout: Duration,
    ready: OnceLock<Arc<dyn TranslationEngine>>,
    settled: Mutex<Settled>,
    loading: AtomicBool,
    attempts: AtomicUsize,
}

/// Clears the loading flag even if the constructing future is dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EngineGateway {
    pub fn new(loader: Arc<dyn EngineLoader>, init_timeout: Duration) -> Self {
        Self {
            loader,
            init_timeout,
            ready: OnceLock::new(),
            settled: Mutex::new(Settled::Unloaded),
            loading: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Return the shared engine, building it on first use.
    pub async fn get_or_init(&self) -> Result<Arc<dyn TranslationEngine>> {
        if let Some(engine) = self.ready.get() {
            return Ok(engine.clone());
        }

        let mut settled = tokio::time::timeout(self.init_timeout, self.settled.lock())
            .await
            .map_err(|_| {
                SubrelayError::EngineUnavailable(format!(
                    "timed out after {:?} waiting for engine construction",
                    self.init_timeout
                ))
            })?;

        // Someone else may have finished while we waited
        if let Some(engine) = self.ready.get() {
            return Ok(engine.clone());
        }

        if let Settled::Failed(cause) = &*settled {
            return Err(SubrelayError::EngineUnavailable(cause.clone()));
        }

        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Constructing translation engine (attempt {})", attempt);

        let outcome = {
            let _loading = LoadingGuard::enter(&self.loading);
            tokio::time::timeout(self.init_timeout, self.loader.load()).await
        };

        match outcome {
            Ok(Ok(engine)) => {
                let engine = self.ready.get_or_init(|| engine).clone();
                info!("Translation engine ready");
                Ok(engine)
            }
            Ok(Err(e)) => {
                error!("Translation engine construction failed: {}", e);
                let cause = e.to_string();
                *settled = Settled::Failed(cause.clone());
                Err(SubrelayError::EngineUnavailable(cause))
            }
            Err(_) => {
                let cause = format!("engine construction exceeded {:?}", self.init_timeout);
                error!("Translation engine construction failed: {}", cause);
                *settled = Settled::Failed(cause.clone());
                Err(SubrelayError::EngineUnavailable(cause))
            }
        }
    }

    /// Translate one string through the shared engine.
    pub async fn translate_one(&self, text: &str) -> Result<String> {
        let engine = self.get_or_init().await?;
        engine.translate(text).await
    }

    pub fn state(&self) -> GatewayState {
        if self.ready.get().is_some() {
            return GatewayState::Ready;
        }
        if self.loading.load(Ordering::SeqCst) {
            return GatewayState::Loading;
        }
        match self.settled.try_lock() {
            Ok(settled) => match &*settled {
                Settled::Unloaded => GatewayState::Unloaded,
                Settled::Failed(cause) => GatewayState::Failed(cause.clone()),
            },
            // Held by a constructor or a caller about to observe the outcome
            Err(_) => GatewayState::Loading,
        }
    }

    /// Allow another construction attempt after a failure.
    pub async fn retry(&self) {
        let mut settled = self.settled.lock().await;
        if let Settled::Failed(cause) = &*settled {
            warn!("Resetting failed translation engine ({}) for retry", cause);
            *settled = Settled::Unloaded;
        }
    }

    /// Number of construction attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MockEngineLoader;
    use async_trait::async_trait;

    struct Uppercase;

    #[async_trait]
    impl TranslationEngine for Uppercase {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    /// Loader that takes a while and counts how often it runs.
    struct SlowLoader {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl SlowLoader {
        fn new(delay: Duration, fail: bool) -> Self {
            Self { calls: AtomicUsize::new(0), delay, fail }
        }
    }

    #[async_trait]
    impl EngineLoader for SlowLoader {
        async fn load(&self) -> Result<Arc<dyn TranslationEngine>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(SubrelayError::ResourceMissing("saved_model/model".into()))
            } else {
                Ok(Arc::new(Uppercase))
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_construct_once() {
        let loader = Arc::new(SlowLoader::new(Duration::from_millis(200), false));
        let gateway = Arc::new(EngineGateway::new(loader.clone(), Duration::from_secs(10)));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let gateway = gateway.clone();
                tokio::spawn(async move { gateway.translate_one(&format!("line {}", i)).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap().unwrap(), format!("LINE {}", i));
        }

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.attempts(), 1);
        assert_eq!(gateway.state(), GatewayState::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failure_is_shared_and_not_retried() {
        let loader = Arc::new(SlowLoader::new(Duration::from_millis(100), true));
        let gateway = Arc::new(EngineGateway::new(loader.clone(), Duration::from_secs(10)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gateway = gateway.clone();
                tokio::spawn(async move { gateway.get_or_init().await.err() })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().expect("every caller should see the failure");
            assert!(matches!(err, SubrelayError::EngineUnavailable(msg) if msg.contains("saved_model/model")));
        }

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(gateway.state(), GatewayState::Failed(_)));
    }

    #[tokio::test]
    async fn test_state_is_loading_while_constructing() {
        let loader = Arc::new(SlowLoader::new(Duration::from_millis(300), false));
        let gateway = Arc::new(EngineGateway::new(loader, Duration::from_secs(10)));
        assert_eq!(gateway.state(), GatewayState::Unloaded);

        let background = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.get_or_init().await.is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gateway.state(), GatewayState::Loading);

        assert!(background.await.unwrap());
        assert_eq!(gateway.state(), GatewayState::Ready);
    }

    #[tokio::test]
    async fn test_failed_state_is_terminal_until_retry() {
        let mut loader = MockEngineLoader::new();
        let mut seq = mockall::Sequence::new();
        loader
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(SubrelayError::ResourceMissing("saved_model".into())));
        loader
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Arc::new(Uppercase) as Arc<dyn TranslationEngine>));

        let gateway = EngineGateway::new(Arc::new(loader), Duration::from_secs(5));

        assert!(gateway.translate_one("hi").await.is_err());
        // Cached failure: the loader must not be called again
        let err = gateway.translate_one("hi").await.unwrap_err();
        assert!(matches!(err, SubrelayError::EngineUnavailable(_)));
        assert_eq!(gateway.attempts(), 1);

        gateway.retry().await;
        assert_eq!(gateway.state(), GatewayState::Unloaded);
        assert_eq!(gateway.translate_one("hi").await.unwrap(), "HI");
        assert_eq!(gateway.attempts(), 2);
    }

    #[tokio::test]
    async fn test_hung_construction_times_out_into_failed() {
        let loader = Arc::new(SlowLoader::new(Duration::from_secs(30), false));
        let gateway = EngineGateway::new(loader, Duration::from_millis(50));

        let err = gateway.get_or_init().await.err().unwrap();
        assert!(matches!(err, SubrelayError::EngineUnavailable(msg) if msg.contains("exceeded")));
        assert!(matches!(gateway.state(), GatewayState::Failed(_)));
    }
}
