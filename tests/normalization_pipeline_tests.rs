use std::sync::{Arc, Mutex};

use series_parity::core::{FieldValue, RawObservation};
use series_parity::extensions::{CreationEvent, CreationObserver, ObserverRegistry};
use series_parity::normalize::{
    CanonicalOrderStage, DropNonFiniteStage, ExecutionContext, FieldSeriesAssembler,
    FilterStage, NormalizationPipeline, NormalizationStage, RenameFieldStage,
};
use series_parity::{ParityError, ParityResult};

fn observation(source: &str, time: &str, kg: f64) -> RawObservation {
    RawObservation::new(source)
        .with_raw_timestamp(time)
        .with_field("kg", kg)
        .with_provenance("file", "export.csv")
}

/// Appends its name to a shared trace, to observe execution order.
struct TraceStage {
    name: &'static str,
    trace: Arc<Mutex<Vec<&'static str>>>,
}

impl NormalizationStage for TraceStage {
    fn name(&self) -> &str {
        self.name
    }

    fn process(
        &self,
        observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>> {
        self.trace.lock().unwrap().push(self.name);
        Ok(observations)
    }
}

struct FailingStage;

impl NormalizationStage for FailingStage {
    fn name(&self) -> &str {
        "failing"
    }

    fn process(
        &self,
        _observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>> {
        Err(ParityError::Stage {
            stage: "failing".to_owned(),
            message: "boom".to_owned(),
        })
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<CreationEvent>>,
}

impl CreationObserver for RecordingObserver {
    fn id(&self) -> &str {
        "recording"
    }

    fn on_event(&self, event: &CreationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[test]
fn pipeline_without_assembler_produces_zero_series() {
    let pipeline = NormalizationPipeline::default().with_stage(CanonicalOrderStage);
    let series = pipeline
        .normalize(vec![observation("scale", "2024-01-01T00:00:00Z", 70.0)])
        .expect("normalize");
    assert!(series.is_empty());
}

#[test]
fn absent_observation_collection_fails_fast() {
    let pipeline = NormalizationPipeline::default();
    assert_eq!(
        pipeline.try_normalize(None),
        Err(ParityError::MissingInput("observations"))
    );
    assert_eq!(pipeline.try_normalize(Some(Vec::new())), Ok(Vec::new()));
}

#[test]
fn stages_run_in_configured_order() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let pipeline = NormalizationPipeline::default()
        .with_stage(TraceStage {
            name: "first",
            trace: Arc::clone(&trace),
        })
        .with_stage(TraceStage {
            name: "second",
            trace: Arc::clone(&trace),
        })
        .with_stage(TraceStage {
            name: "third",
            trace: Arc::clone(&trace),
        });
    pipeline.normalize(Vec::new()).expect("normalize");
    assert_eq!(*trace.lock().unwrap(), vec!["first", "second", "third"]);
    assert_eq!(pipeline.stage_names(), vec!["first", "second", "third"]);
}

#[test]
fn stage_errors_propagate_unchanged() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let pipeline = NormalizationPipeline::default()
        .with_stage(FailingStage)
        .with_stage(TraceStage {
            name: "after",
            trace: Arc::clone(&trace),
        });
    let result = pipeline.normalize(vec![observation("scale", "2024-01-01T00:00:00Z", 1.0)]);
    assert_eq!(
        result,
        Err(ParityError::Stage {
            stage: "failing".to_owned(),
            message: "boom".to_owned(),
        })
    );
    assert!(trace.lock().unwrap().is_empty());
}

#[test]
fn full_pipeline_builds_one_series_per_source_and_group() {
    let context = ExecutionContext::new().with_param("resolution_ms", "86400000");
    let pipeline = NormalizationPipeline::new(context)
        .with_stage(FilterStage::new("drop_test_sources", |o: &RawObservation| {
            o.source_id() != "test"
        }))
        .with_stage(RenameFieldStage::new("kg", "weight"))
        .with_stage(DropNonFiniteStage::new("weight"))
        .with_stage(CanonicalOrderStage)
        .with_assembler(FieldSeriesAssembler::new("weight"));

    let observations = vec![
        observation("scale", "2024-01-02T00:00:00Z", 71.0),
        observation("scale", "2024-01-01T00:00:00Z", 70.0),
        observation("scale", "2024-01-03T00:00:00Z", f64::NAN),
        observation("test", "2024-01-01T00:00:00Z", 1.0),
        observation("scale", "2024-01-01T00:00:00Z", 70.5).with_group("morning"),
    ];
    let series = pipeline.normalize(observations).expect("normalize");

    assert_eq!(series.len(), 2);
    let plain = series
        .iter()
        .find(|s| s.id().as_str() == "scale")
        .expect("plain series");
    assert_eq!(plain.values(), &[Some(70.0), Some(71.0)]);
    assert!(plain.timestamps()[0] < plain.timestamps()[1]);
    assert_eq!(
        plain.provenance().get("source_id").map(String::as_str),
        Some("scale")
    );
    assert_eq!(
        plain.provenance().get("file").map(String::as_str),
        Some("export.csv")
    );

    let grouped = series
        .iter()
        .find(|s| s.id().as_str() == "scale/morning")
        .expect("grouped series");
    assert_eq!(grouped.dimensions().get("group").map(String::as_str), Some("morning"));
    assert_eq!(grouped.time_axis().resolution_ms(), 86_400_000);
    assert_eq!(
        grouped.provenance().get("file").map(String::as_str),
        Some("export.csv")
    );
}

#[test]
fn assembler_keeps_first_provenance_value_per_key() {
    let context = ExecutionContext::new().with_param("resolution_ms", "86400000");
    let pipeline = NormalizationPipeline::new(context)
        .with_assembler(FieldSeriesAssembler::new("kg"));
    let observations = vec![
        observation("scale", "2024-01-01T00:00:00Z", 70.0).with_provenance("batch", "a"),
        observation("scale", "2024-01-02T00:00:00Z", 71.0)
            .with_provenance("batch", "b")
            .with_provenance("source_id", "spoofed"),
    ];
    let series = pipeline.normalize(observations).expect("normalize");

    let provenance = series[0].provenance();
    assert_eq!(provenance.get("batch").map(String::as_str), Some("a"));
    assert_eq!(provenance.get("source_id").map(String::as_str), Some("scale"));
    assert_eq!(provenance.get("file").map(String::as_str), Some("export.csv"));
}

#[test]
fn assembler_rejects_invalid_resolution_parameter() {
    let context = ExecutionContext::new().with_param("resolution_ms", "0");
    let pipeline = NormalizationPipeline::new(context)
        .with_assembler(FieldSeriesAssembler::new("kg"));
    let result = pipeline.normalize(vec![observation("scale", "2024-01-01T00:00:00Z", 1.0)]);
    assert_eq!(result, Err(ParityError::InvalidResolution { resolution_ms: 0 }));
}

#[test]
fn assembler_reads_times_from_field_and_turns_text_values_into_gaps() {
    let pipeline = NormalizationPipeline::default().with_assembler(
        FieldSeriesAssembler::new("reading").with_time_field("at"),
    );
    let observations = vec![
        RawObservation::new("sensor")
            .with_field("at", "2024-05-01T10:00:00Z")
            .with_field("reading", 3_i64),
        RawObservation::new("sensor")
            .with_field("at", "2024-05-01T11:00:00Z")
            .with_field("reading", FieldValue::Text("n/a".to_owned())),
    ];
    let series = pipeline.normalize(observations).expect("normalize");
    assert_eq!(series[0].values(), &[Some(3.0), None]);
}

#[test]
fn assembler_fails_when_sample_time_is_missing() {
    let pipeline =
        NormalizationPipeline::default().with_assembler(FieldSeriesAssembler::new("kg"));
    let result = pipeline.normalize(vec![RawObservation::new("scale").with_field("kg", 1.0)]);
    assert!(matches!(result, Err(ParityError::Stage { .. })));
}

#[test]
fn observers_see_every_created_series() {
    let observer = Arc::new(RecordingObserver::default());
    let mut registry = ObserverRegistry::new();
    registry
        .register(Arc::clone(&observer) as Arc<dyn CreationObserver>)
        .expect("register");
    assert!(
        registry
            .register(Arc::clone(&observer) as Arc<dyn CreationObserver>)
            .is_err()
    );

    let pipeline = NormalizationPipeline::default()
        .with_stage(CanonicalOrderStage)
        .with_assembler(FieldSeriesAssembler::new("kg"))
        .with_observers(registry);
    pipeline
        .normalize(vec![
            observation("a", "2024-01-01T00:00:00Z", 1.0),
            observation("b", "2024-01-01T00:00:00Z", 2.0),
        ])
        .expect("normalize");

    let events = observer.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            CreationEvent::SeriesCreated {
                series_id: "a".to_owned(),
                points: 1
            },
            CreationEvent::SeriesCreated {
                series_id: "b".to_owned(),
                points: 1
            },
        ]
    );
}
