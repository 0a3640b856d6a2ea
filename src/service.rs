//! Dataset Service
//!
//! Holds the current `Dataset` and rebuilds it on demand.
//!
//! - Readers get an `Arc<Dataset>` snapshot that never changes under them
//! - `refresh` builds a complete new dataset, then swaps it in
//! - A failed refresh leaves the previous dataset serving
//! - Refreshes are serialized; two never interleave

use crate::config::{Config, ConfigError, ForecastKind, SourceKind};
use crate::data::{DataError, DataPaths, DataSource, FileDataSource, HttpDataSource};
use crate::forecast::{CsvForecaster, Forecaster, NaiveForecaster};
use crate::prepare::{Dataset, PrepareError};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Errors raised while loading or rebuilding the dataset
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Preparation error: {0}")]
    Prepare(#[from] PrepareError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of a refresh request
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    /// Whether a new dataset was published
    pub updated: bool,
    /// Last date of the data now serving
    pub data_date: NaiveDate,
    pub duration_ms: u64,
}

pub struct DashboardService {
    source: Arc<dyn DataSource>,
    forecaster: Arc<dyn Forecaster>,
    current: RwLock<Arc<Dataset>>,
    refresh_lock: Mutex<()>,
}

impl DashboardService {
    /// Load and prepare the first dataset
    pub async fn initialize(
        source: Arc<dyn DataSource>,
        forecaster: Arc<dyn Forecaster>,
    ) -> ServiceResult<Self> {
        let dataset = Self::build(source.as_ref(), forecaster.as_ref()).await?;
        Ok(Self::with_dataset(source, forecaster, dataset))
    }

    /// Start from an already prepared dataset
    pub fn with_dataset(
        source: Arc<dyn DataSource>,
        forecaster: Arc<dyn Forecaster>,
        dataset: Dataset,
    ) -> Self {
        Self {
            source,
            forecaster,
            current: RwLock::new(Arc::new(dataset)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Build the data source and forecaster named by the configuration
    pub async fn from_config(config: &Config) -> ServiceResult<Self> {
        let paths = DataPaths::in_dir(&config.data.dir);
        let local = FileDataSource::new(paths, config.data.delimiter_byte()?);

        let source: Arc<dyn DataSource> = match config.data.source {
            SourceKind::File => Arc::new(local),
            SourceKind::Http => Arc::new(HttpDataSource::new(
                config.data.url.clone(),
                local,
                config.data.http_timeout_secs,
            )?),
        };

        let forecaster: Arc<dyn Forecaster> = match config.forecast.kind {
            ForecastKind::Naive => Arc::new(NaiveForecaster::new()),
            ForecastKind::Csv => {
                let path = config.forecast.output_path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("forecast.output_path is required for csv".to_string())
                })?;
                Arc::new(CsvForecaster::new(path, config.forecast.trained_until_date()?))
            }
        };

        tracing::info!(
            source = source.name(),
            forecaster = forecaster.name(),
            data_dir = %config.data.dir,
            "Initializing dataset service"
        );

        Self::initialize(source, forecaster).await
    }

    async fn build(source: &dyn DataSource, forecaster: &dyn Forecaster) -> ServiceResult<Dataset> {
        let raw = source.load().await?;
        Ok(Dataset::build(raw, forecaster)?)
    }

    /// Current dataset snapshot
    pub async fn current(&self) -> Arc<Dataset> {
        Arc::clone(&*self.current.read().await)
    }

    /// Rebuild the dataset when the source has new data, or always with `force`
    pub async fn refresh(&self, force: bool) -> ServiceResult<RefreshOutcome> {
        let _guard = self.refresh_lock.lock().await;
        let start = std::time::Instant::now();

        if !force && !self.source.check_update().await? {
            let data_date = self.current().await.data_date;
            tracing::info!(%data_date, "Data unchanged, keeping current dataset");
            return Ok(RefreshOutcome {
                updated: false,
                data_date,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let dataset = match Self::build(self.source.as_ref(), self.forecaster.as_ref()).await {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::error!(error = %e, "Refresh failed, previous dataset still serving");
                return Err(e);
            }
        };

        let data_date = dataset.data_date;
        *self.current.write().await = Arc::new(dataset);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(%data_date, duration_ms, "Dataset refreshed");

        Ok(RefreshOutcome {
            updated: true,
            data_date,
            duration_ms,
        })
    }

    /// Spawn a task refreshing the dataset every `interval_minutes`
    pub fn start_background_refresh(self: Arc<Self>, interval_minutes: u64) {
        if interval_minutes == 0 {
            tracing::info!("Background refresh disabled");
            return;
        }

        tracing::info!(interval_minutes, "Starting background refresh");

        tokio::spawn(async move {
            let interval = std::time::Duration::from_secs(interval_minutes * 60);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh(false).await {
                    tracing::warn!(error = %e, "Scheduled refresh failed");
                }
            }
        });
    }
}


#[cfg(test)]
mod tests {
    use super::testing::service;
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_initialize_publishes_dataset() {
        let (service, source) = service().await;
        let dataset = service.current().await;

        assert_eq!(dataset.snapshot.len(), 3);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_update_keeps_dataset() {
        let (service, source) = service().await;
        let before = service.current().await;

        let outcome = service.refresh(false).await.unwrap();

        assert!(!outcome.updated);
        assert_eq!(outcome.data_date, before.data_date);
        assert!(Arc::ptr_eq(&before, &service.current().await));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_swaps_dataset() {
        let (service, source) = service().await;
        let before = service.current().await;
        source.updated.store(true, Ordering::SeqCst);

        let outcome = service.refresh(false).await.unwrap();

        assert!(outcome.updated);
        assert!(!Arc::ptr_eq(&before, &service.current().await));
        // Readers holding the old snapshot still see it
        assert_eq!(before.snapshot.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_dataset() {
        let (service, source) = service().await;
        let before = service.current().await;
        source.fail.store(true, Ordering::SeqCst);

        let err = service.refresh(true).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Prepare(PrepareError::UnknownRegion(_))
        ));
        assert!(Arc::ptr_eq(&before, &service.current().await));
    }

    #[tokio::test]
    async fn test_from_config_with_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::in_dir(dir.path());

        let mut regional = String::from("dep;jour;P;T;cl_age90\n");
        let start = NaiveDate::from_ymd_opt(2020, 9, 1).unwrap();
        for day in 0..30 {
            let date = start + chrono::Duration::days(day);
            regional.push_str(&format!("75;{};10;100;0\n", date));
            regional.push_str(&format!("75;{};3;30;9\n", date));
        }
        std::fs::write(&paths.regional, regional).unwrap();
        std::fs::write(&paths.names, "code,name\n75,Paris\n").unwrap();
        std::fs::write(
            &paths.geography,
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.data.dir = dir.path().to_string_lossy().to_string();

        let service = DashboardService::from_config(&config).await.unwrap();
        let dataset = service.current().await;

        assert_eq!(dataset.snapshot.by_code("75").unwrap().positive, 140.0);
        assert_eq!(dataset.snapshot.by_code("75").unwrap().rt, Some(1.0));
    }

    #[tokio::test]
    async fn test_from_config_csv_forecast_requires_path() {
        let mut config = Config::default();
        config.forecast.kind = ForecastKind::Csv;

        let result = DashboardService::from_config(&config).await;
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }
}
