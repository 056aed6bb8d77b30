use anyhow::Result;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the tracer provider alive; flush it before handing the process off.
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
}

impl TelemetryGuard {
    pub fn flush(&self) {
        if let Err(e) = self.provider.force_flush() {
            eprintln!("failed to flush spans: {}", e);
        }
    }
}

pub fn init_telemetry(service_name: &'static str) -> TelemetryGuard {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let otlp_enabled = env::var("OTEL_TRACES_EXPORTER")
        .map(|v| v == "otlp")
        .unwrap_or(false);

    let provider = if otlp_enabled {
        let otlp_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4318/v1/traces".to_string());

        match create_otlp_provider(&otlp_endpoint) {
            Ok(provider) => provider,
            Err(e) => {
                eprintln!(
                    "Failed to initialize OTLP tracer for {}: {}",
                    service_name, e
                );
                eprintln!("Falling back to stdout exporter");
                stdout_provider()
            }
        }
    } else {
        stdout_provider()
    };

    let otel = OpenTelemetryLayer::new(provider.tracer(service_name));
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info,common=info", service_name)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_target(false))
        .with(otel)
        .init();

    TelemetryGuard { provider }
}

fn create_otlp_provider(endpoint: &str) -> Result<SdkTracerProvider> {
    use opentelemetry_otlp::WithExportConfig;

    // Only the HTTP transport is wired up; 4317 is the gRPC default.
    if endpoint.contains("4317") {
        return Err(anyhow::anyhow!(
            "gRPC OTLP not supported, use the HTTP endpoint (port 4318)"
        ));
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_simple_exporter(exporter)
        .build())
}

fn stdout_provider() -> SdkTracerProvider {
    SdkTracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .build()
}
