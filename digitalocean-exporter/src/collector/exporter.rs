//! Build information and start time of the exporter itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Collector;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "exporter";

static BUILD_INFO: Descriptor = Descriptor::gauge(
    "digitalocean_exporter_build_info",
    "A metric with a constant '1' value labeled by version, revision and build date",
    &["version", "revision", "build_date"],
);
static START_TIME: Descriptor = Descriptor::gauge(
    "digitalocean_exporter_start_time",
    "The unix time the exporter was started",
    &[],
);

/// Version metadata baked in at compile time.
///
/// `DIGITALOCEAN_EXPORTER_REVISION` and `DIGITALOCEAN_EXPORTER_BUILD_DATE`
/// are read from the build environment when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub revision: String,
    pub build_date: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            revision: option_env!("DIGITALOCEAN_EXPORTER_REVISION")
                .unwrap_or("unknown")
                .to_string(),
            build_date: option_env!("DIGITALOCEAN_EXPORTER_BUILD_DATE")
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

/// Static exporter metadata; never fails.
pub struct ExporterCollector {
    build: BuildInfo,
    start_time: DateTime<Utc>,
}

impl ExporterCollector {
    pub fn new(build: BuildInfo, start_time: DateTime<Utc>) -> Self {
        Self { build, start_time }
    }
}

#[async_trait]
impl Collector for ExporterCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&BUILD_INFO, &START_TIME]
    }

    async fn collect(&self) -> Vec<Sample> {
        vec![
            Sample::new(
                &BUILD_INFO,
                1.0,
                vec![
                    self.build.version.clone(),
                    self.build.revision.clone(),
                    self.build.build_date.clone(),
                ],
            ),
            Sample::unlabeled(&START_TIME, self.start_time.timestamp() as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_info_has_package_version() {
        let build = BuildInfo::current();
        assert_eq!(build.version, env!("CARGO_PKG_VERSION"));
        assert!(!build.revision.is_empty());
    }

    #[tokio::test]
    async fn test_collect() {
        let build = BuildInfo {
            version: "1.2.3".to_string(),
            revision: "abc123".to_string(),
            build_date: "2024-05-01".to_string(),
        };
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().unwrap();
        let samples = ExporterCollector::new(build, started).collect().await;

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label("version"), Some("1.2.3"));
        assert_eq!(samples[0].label("revision"), Some("abc123"));
        assert_eq!(samples[0].value, 1.0);
        assert_eq!(samples[1].value, 1714521600.0);
    }
}
