use opentelemetry_sdk::trace::{BatchConfig, RandomIdGenerator, Sampler};
use tracing_subscriber::{
    filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Initializes tracing and logging configuration.
/// To export traces, set up the Opentelemetry tracing environment variables:
///
/// ```sh
/// export OTEL_SERVICE_NAME=campus
/// export OTEL_EXPORTER_OTLP_PROTOCOL="http/protobuf"
/// export OTEL_EXPORTER_OTLP_ENDPOINT="https://otlp.example.com/otlp"
/// export OTEL_EXPORTER_OTLP_HEADERS="Authorization=Basic <basic auth>"
/// ```
///
/// Will also respect the `RUST_LOG` environment variable for log filters.
pub fn init_tracing() {
    let log_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,campus=trace,serenity=info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let remove_presence_update_filter = FilterFn::new(|m| {
        !(m.target() == "serenity::gateway::shard"
            && m.name() == "handle_gateway_dispatch"
            && m.fields()
                .field("event")
                .map_or(false, |event| event.as_ref().starts_with("PresenceUpdate")))
    });

    let traces_extra_filter =
        EnvFilter::try_from_env("RUST_LOG_TRACES").unwrap_or_else(|_| EnvFilter::new("trace"));

    let logfmt_builder = tracing_logfmt_otel::builder()
        .with_level(true)
        .with_target(true)
        .with_span_name(true)
        .with_span_path(true)
        .with_otel_data(true)
        .with_file(true)
        .with_line(true)
        .with_module(true);
    let sub = tracing_subscriber::registry().with(log_filter).with(remove_presence_update_filter);

    if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_err() {
        println!("No OTEL_EXPORTER_OTLP_ENDPOINT is set, only initializing logging");
        sub.with(logfmt_builder.layer()).init();
        return;
    }

    opentelemetry::global::set_text_map_propagator(
        opentelemetry_sdk::propagation::TraceContextPropagator::new(),
    );
    let trace_config = opentelemetry_sdk::trace::config()
        .with_id_generator(RandomIdGenerator::default())
        .with_sampler(Sampler::AlwaysOn);
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(trace_config)
        .with_exporter(opentelemetry_otlp::new_exporter().http())
        .with_batch_config(BatchConfig::default())
        .install_batch(opentelemetry_sdk::runtime::Tokio);

    match tracer {
        Ok(tracer) => {
            let telemetry = tracing_opentelemetry::layer()
                .with_location(true)
                .with_threads(true)
                .with_tracked_inactivity(true)
                .with_tracer(tracer)
                .with_filter(traces_extra_filter);
            println!("OTEL_EXPORTER_OTLP_ENDPOINT is set, initializing tracing layer");
            sub.with(telemetry).with(logfmt_builder.layer()).init();
        }
        Err(err) => {
            eprintln!("failed to initialize otel tracing: {err}");
            sub.with(logfmt_builder.layer()).init();
        }
    }
}
