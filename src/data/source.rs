//! Data Sources
//!
//! The refresh boundary between the dashboard and its inputs. A source
//! reports whether new data is available and loads a complete `RawData`.
//!
//! - `FileDataSource`: reads the inputs from a data directory
//! - `HttpDataSource`: downloads the regional file, then reads from disk

use super::error::{DataError, DataResult};
use super::loader::{parse_geography, parse_national_csv, parse_region_names, parse_regional_csv};
use super::types::{NationalFeatures, RawData};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Common trait for all data sources
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Whether new data is available since the last successful load
    async fn check_update(&self) -> DataResult<bool>;

    /// Load every input
    async fn load(&self) -> DataResult<RawData>;
}

/// Locations of the input files
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Regional daily tests (`dep;jour;P;T;cl_age90`)
    pub regional: PathBuf,
    /// National features; derived from the regional file when absent
    pub national: PathBuf,
    /// Department boundaries (GeoJSON)
    pub geography: PathBuf,
    /// Department code/name lookup
    pub names: PathBuf,
}

impl DataPaths {
    /// Standard file names inside a data directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            regional: dir.join("sp-pos-quot-dep.csv"),
            national: dir.join("features_fr.csv"),
            geography: dir.join("departements.geojson"),
            names: dir.join("departements.csv"),
        }
    }

    fn all(&self) -> [&Path; 4] {
        [
            self.regional.as_path(),
            self.national.as_path(),
            self.geography.as_path(),
            self.names.as_path(),
        ]
    }
}

/// Reads inputs from local files
pub struct FileDataSource {
    paths: DataPaths,
    delimiter: u8,
    /// Modification times seen at the last successful load
    last_seen: Mutex<Option<Vec<Option<SystemTime>>>>,
}

impl FileDataSource {
    pub fn new(paths: DataPaths, delimiter: u8) -> Self {
        Self {
            paths,
            delimiter,
            last_seen: Mutex::new(None),
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    async fn modification_times(&self) -> Vec<Option<SystemTime>> {
        let mut times = Vec::with_capacity(4);
        for path in self.paths.all() {
            let modified = tokio::fs::metadata(path)
                .await
                .and_then(|m| m.modified())
                .ok();
            times.push(modified);
        }
        times
    }

    fn last_seen(&self) -> Option<Vec<Option<SystemTime>>> {
        self.last_seen
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn set_last_seen(&self, times: Vec<Option<SystemTime>>) {
        match self.last_seen.lock() {
            Ok(mut guard) => *guard = Some(times),
            Err(poisoned) => *poisoned.into_inner() = Some(times),
        }
    }
}

async fn read_file(path: &Path) -> DataResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataError::io(path, e))
}

#[async_trait]
impl DataSource for FileDataSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn check_update(&self) -> DataResult<bool> {
        let current = self.modification_times().await;
        let updated = match self.last_seen() {
            Some(seen) => seen != current,
            None => true,
        };
        tracing::debug!(updated, "Checked local data files");
        Ok(updated)
    }

    async fn load(&self) -> DataResult<RawData> {
        let times = self.modification_times().await;

        tracing::info!(path = ?self.paths.regional, "Loading regional data");
        let regional = parse_regional_csv(&read_file(&self.paths.regional).await?, self.delimiter)?;

        let national = if tokio::fs::try_exists(&self.paths.national)
            .await
            .unwrap_or(false)
        {
            parse_national_csv(&read_file(&self.paths.national).await?)?
        } else {
            tracing::info!(
                path = ?self.paths.national,
                "National feature file absent, deriving from regional data"
            );
            NationalFeatures::from_regional(&regional)
        };

        let geography = parse_geography(&read_file(&self.paths.geography).await?)?;
        let names = parse_region_names(&read_file(&self.paths.names).await?)?;

        tracing::info!(
            regions = regional.region_count(),
            days = regional.days(),
            national_days = national.len(),
            names = names.len(),
            "Data loaded"
        );

        self.set_last_seen(times);

        Ok(RawData {
            regional,
            national,
            geography,
            names,
        })
    }
}

/// Downloads the regional file from a remote URL before reading locally.
///
/// Updates are detected with the `Last-Modified` header of a HEAD request.
pub struct HttpDataSource {
    client: reqwest::Client,
    url: String,
    local: FileDataSource,
    last_modified: tokio::sync::Mutex<Option<String>>,
}

impl HttpDataSource {
    pub fn new(url: impl Into<String>, local: FileDataSource, timeout_secs: u64) -> DataResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            local,
            last_modified: tokio::sync::Mutex::new(None),
        })
    }

    async fn remote_last_modified(&self) -> DataResult<Option<String>> {
        let response = self.client.head(&self.url).send().await?.error_for_status()?;
        Ok(response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    async fn download(&self) -> DataResult<()> {
        tracing::info!(url = %self.url, "Downloading regional data");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        let path = &self.local.paths().regional;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DataError::io(parent, e))?;
        }
        tokio::fs::write(path, &body)
            .await
            .map_err(|e| DataError::io(path, e))?;

        tracing::info!(bytes = body.len(), path = ?path, "Regional data saved");
        *self.last_modified.lock().await = last_modified;
        Ok(())
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn check_update(&self) -> DataResult<bool> {
        let remote = self.remote_last_modified().await?;
        let seen = self.last_modified.lock().await.clone();
        let updated = match (remote, seen) {
            (Some(remote), Some(seen)) => remote != seen,
            _ => true,
        };
        tracing::debug!(updated, url = %self.url, "Checked remote data");
        Ok(updated)
    }

    async fn load(&self) -> DataResult<RawData> {
        let have_local = tokio::fs::try_exists(&self.local.paths().regional)
            .await
            .unwrap_or(false);
        if !have_local || self.check_update().await? {
            self.download().await?;
        }
        self.local.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{header, Method},
        routing::get,
        Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    const REGIONAL: &str = "dep;jour;P;T;cl_age90
75;2020-06-01;10;100;0
75;2020-06-02;12;110;0";

    const NAMES: &str = "code,name
75,Paris";

    const GEO: &str = r#"{"type": "FeatureCollection", "features": []}"#;

    /// Names and geography only; the regional file comes from the source
    fn write_static_inputs(dir: &Path) -> DataPaths {
        let paths = DataPaths::in_dir(dir);
        std::fs::write(&paths.names, NAMES).unwrap();
        std::fs::write(&paths.geography, GEO).unwrap();
        paths
    }

    fn write_inputs(dir: &Path) -> DataPaths {
        let paths = write_static_inputs(dir);
        std::fs::write(&paths.regional, REGIONAL).unwrap();
        paths
    }

    /// Local HTTP server publishing the regional file
    #[derive(Clone)]
    struct Remote {
        last_modified: Arc<std::sync::Mutex<String>>,
        downloads: Arc<AtomicUsize>,
    }

    impl Remote {
        fn new(last_modified: &str) -> Self {
            Self {
                last_modified: Arc::new(std::sync::Mutex::new(last_modified.to_string())),
                downloads: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn set_last_modified(&self, value: &str) {
            *self.last_modified.lock().unwrap() = value.to_string();
        }

        fn downloads(&self) -> usize {
            self.downloads.load(Ordering::SeqCst)
        }

        /// Start serving and return the file URL
        async fn start(&self) -> String {
            async fn regional(
                State(remote): State<Remote>,
                method: Method,
            ) -> ([(header::HeaderName, String); 1], &'static str) {
                if method == Method::GET {
                    remote.downloads.fetch_add(1, Ordering::SeqCst);
                }
                let last_modified = remote.last_modified.lock().unwrap().clone();
                ([(header::LAST_MODIFIED, last_modified)], REGIONAL)
            }

            let app = Router::new()
                .route("/sp-pos-quot-dep.csv", get(regional))
                .with_state(self.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}", addr)
        }
    }

    #[tokio::test]
    async fn test_file_source_loads_and_derives_national() {
        let dir = tempdir().unwrap();
        let source = FileDataSource::new(write_inputs(dir.path()), b';');

        let raw = source.load().await.unwrap();

        assert_eq!(raw.regional.region_count(), 1);
        assert_eq!(raw.national.len(), 2);
        assert_eq!(raw.national.rows()[1].positive, Some(12.0));
        assert_eq!(raw.names.name("75"), Some("Paris"));
    }

    #[tokio::test]
    async fn test_file_source_update_detection() {
        let dir = tempdir().unwrap();
        let source = FileDataSource::new(write_inputs(dir.path()), b';');

        assert!(source.check_update().await.unwrap());
        source.load().await.unwrap();
        assert!(!source.check_update().await.unwrap());
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let dir = tempdir().unwrap();
        let source = FileDataSource::new(DataPaths::in_dir(dir.path()), b';');

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[tokio::test]
    async fn test_http_source_follows_last_modified() {
        let remote = Remote::new("Mon, 02 Nov 2020 10:00:00 GMT");
        let base = remote.start().await;
        let dir = tempdir().unwrap();
        let paths = write_static_inputs(dir.path());

        let source = HttpDataSource::new(
            format!("{}/sp-pos-quot-dep.csv", base),
            FileDataSource::new(paths.clone(), b';'),
            5,
        )
        .unwrap();

        // Nothing downloaded yet
        assert!(source.check_update().await.unwrap());

        let raw = source.load().await.unwrap();
        assert_eq!(std::fs::read_to_string(&paths.regional).unwrap(), REGIONAL);
        assert_eq!(raw.regional.region_count(), 1);
        assert_eq!(remote.downloads(), 1);

        assert!(!source.check_update().await.unwrap());
        source.load().await.unwrap();
        assert_eq!(remote.downloads(), 1);

        remote.set_last_modified("Tue, 03 Nov 2020 10:00:00 GMT");
        assert!(source.check_update().await.unwrap());
        source.load().await.unwrap();
        assert_eq!(remote.downloads(), 2);
        assert!(!source.check_update().await.unwrap());
    }

    #[tokio::test]
    async fn test_http_source_error_status() {
        let remote = Remote::new("Mon, 02 Nov 2020 10:00:00 GMT");
        let base = remote.start().await;
        let dir = tempdir().unwrap();

        let source = HttpDataSource::new(
            format!("{}/missing.csv", base),
            FileDataSource::new(write_static_inputs(dir.path()), b';'),
            5,
        )
        .unwrap();

        assert!(matches!(source.check_update().await, Err(DataError::Http(_))));
        assert!(matches!(source.load().await, Err(DataError::Http(_))));
        assert_eq!(remote.downloads(), 0);
    }
}
