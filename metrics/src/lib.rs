use std::{env, sync::LazyLock};

use strum_macros::EnumIter;

static CONNECTION_URI: LazyLock<String> = LazyLock::new(|| {
    let host = env::var("PROMETHEUS_HOST").unwrap_or("localhost".into());
    let port = env::var("PROMETHEUS_PORT").unwrap_or("9090".into());

    format!("http://{host}:{port}/api/v1/otlp/v1/metrics")
});

const SERVICE_NAME: &str = "catalog-crawler";

#[derive(Debug, EnumIter, Hash, Eq, PartialEq)]
pub enum Metrics {
    /// Counter for categories enumerated (an ID batch was emitted for them).
    CategoriesEnumerated,
    /// Counter for ID batches emitted by the Enumerator.
    IdBatchesEmitted,
    /// Counter for cards successfully fetched from the card-detail endpoint.
    CardsFetched,
    /// Counter for cards persisted to the catalog store.
    CardsPersisted,
    /// Counter for cards or categories dropped by schema validation.
    ValidationFailures,
    /// Counter for fatal aborts that cancelled a crawl.
    FatalAborts,
}

impl Metrics {
    fn to_string(&self) -> String {
        match self {
            Metrics::CategoriesEnumerated => "CATEGORIES_ENUMERATED".to_string(),
            Metrics::IdBatchesEmitted => "ID_BATCHES_EMITTED".to_string(),
            Metrics::CardsFetched => "CARDS_FETCHED".to_string(),
            Metrics::CardsPersisted => "CARDS_PERSISTED".to_string(),
            Metrics::ValidationFailures => "VALIDATION_FAILURES".to_string(),
            Metrics::FatalAborts => "FATAL_ABORTS".to_string(),
        }
    }
}

pub mod _private {
    pub use opentelemetry::KeyValue;

    use std::{collections::HashMap, sync::LazyLock, time::Duration};

    use opentelemetry::{
        global,
        metrics::{Counter, Meter},
    };
    use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig};
    use opentelemetry_sdk::{
        Resource,
        metrics::{PeriodicReader, SdkMeterProvider},
    };
    use strum::IntoEnumIterator;

    use crate::{CONNECTION_URI, Metrics, SERVICE_NAME};

    static OTEL_METER: LazyLock<Meter> = LazyLock::new(|| {
        global::set_meter_provider(PROVIDER.clone());
        global::meter(SERVICE_NAME)
    });

    pub static PROVIDER: LazyLock<SdkMeterProvider> = LazyLock::new(|| {
        let exporter = MetricExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(CONNECTION_URI.to_string())
            .build()
            .expect("Expect Prometheus exporter to build");

        let reader = PeriodicReader::builder(exporter)
            .with_interval(Duration::from_secs(1))
            .build();

        let resource = Resource::builder().with_service_name(SERVICE_NAME).build();

        SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build()
    });

    pub static COUNTERS: LazyLock<HashMap<Metrics, Counter<u64>>> = LazyLock::new(|| {
        let mut mapping: HashMap<Metrics, Counter<u64>> = HashMap::new();

        for metric in crate::Metrics::iter() {
            let metric_meter = OTEL_METER.u64_counter(metric.to_string()).build();

            mapping.insert(metric, metric_meter);
        }

        mapping
    });
}

#[macro_export]
macro_rules! put_metric {
    ($metric_name:expr, $added_value:expr $(, $key:literal => $value:expr)* $(,)?) => {
        use $crate::_private::{KeyValue, COUNTERS};
        use $crate::Metrics;

        let metric_name: Metrics = $metric_name;
        let added_value: u64 = $added_value;

        let attributes: &[KeyValue] = &[
            $(KeyValue::new($key, $value),)*
        ];

        COUNTERS
            .get(&metric_name)
            .unwrap()
            .add(added_value, attributes);
    };
}
