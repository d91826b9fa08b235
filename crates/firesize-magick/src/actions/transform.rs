//! Run the requested transform.

use std::path::{Path, PathBuf};
use std::time::Duration;

use firesize_core::Result;

use crate::command::ToolCommand;
use crate::descriptor::TransformDescriptor;
use crate::events::PipelineEvents;
use crate::tools::{ToolRegistry, CONVERT};

/// Transform `input` as `descriptor` asks, writing next to `output_stem`.
///
/// The descriptor decides the full argument vector and the final output path
/// (usually `output_stem` plus a format extension). On failure, including a
/// `convert` that cannot be found, the tool, arguments and captured output
/// are reported before the error is returned.
pub async fn transform<D>(
    tools: &ToolRegistry,
    input: &Path,
    output_stem: &Path,
    descriptor: &D,
    timeout: Duration,
    events: &dyn PipelineEvents,
) -> Result<PathBuf>
where
    D: TransformDescriptor + ?Sized,
{
    let (args, output) = descriptor.command_args(input, output_stem);

    let convert = match tools.require(CONVERT) {
        Ok(path) => path,
        Err(e) => {
            events.transform_failed(CONVERT, &args, &e, None);
            return Err(e);
        }
    };

    let mut cmd = ToolCommand::new(convert.to_path_buf());
    cmd.args(args).timeout(timeout);

    let tool = cmd.program_name();
    events.transform_started(&tool, cmd.arguments());

    if let Err(e) = cmd.execute().await {
        events.transform_failed(&tool, cmd.arguments(), &e, e.tool_output());
        return Err(e);
    }

    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testutil::{
        fake_convert, read_calls, registry, write_script, Record, RecordingEvents, StubDescriptor,
    };
    use firesize_core::Error;

    const BUDGET: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn returns_descriptor_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let (convert, calls) = fake_convert(dir.path());
        let input = dir.path().join("in");
        std::fs::write(&input, b"PNG").unwrap();
        let descriptor = StubDescriptor::new("http://example.com/a.png", Some("jpg"), "100x50");
        let events = RecordingEvents::default();

        let output = transform(
            &registry(None, Some(&convert)),
            &input,
            &dir.path().join("out"),
            &descriptor,
            BUDGET,
            &events,
        )
        .await
        .unwrap();

        assert_eq!(output, dir.path().join("out.jpg"));
        assert_eq!(std::fs::read(&output).unwrap(), b"PNG");

        let expected_args = vec![
            input.display().to_string(),
            "-resize".to_string(),
            "100x50".to_string(),
            output.display().to_string(),
        ];
        assert_eq!(read_calls(&calls), vec![expected_args.join(" ")]);
        assert_eq!(
            events.records(),
            vec![Record::Transform {
                tool: "convert".into(),
                args: expected_args
            }]
        );
    }

    #[tokio::test]
    async fn failure_reports_output_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let convert = write_script(
            dir.path(),
            "convert",
            "echo 'no decode delegate' >&2; exit 1",
        );
        let descriptor = StubDescriptor::new("http://example.com/a.png", None, "10x10");
        let events = RecordingEvents::default();

        let err = transform(
            &registry(None, Some(&convert)),
            &dir.path().join("in"),
            &dir.path().join("out"),
            &descriptor,
            BUDGET,
            &events,
        )
        .await
        .unwrap_err();

        assert!(!err.is_timeout());
        let records = events.records();
        assert_eq!(records.len(), 2);
        match &records[1] {
            Record::TransformFailed { tool, output, .. } => {
                assert_eq!(tool, "convert");
                assert_eq!(output.as_deref(), Some("no decode delegate\n"));
            }
            other => panic!("expected TransformFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_convert_is_reported_with_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let descriptor = StubDescriptor::new("http://example.com/a.png", Some("png"), "10x10");
        let events = RecordingEvents::default();

        let err = transform(
            &registry(None, None),
            &input,
            &dir.path().join("out"),
            &descriptor,
            BUDGET,
            &events,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Tool { .. }));
        match events.records().as_slice() {
            [Record::TransformFailed {
                tool, args, output, ..
            }] => {
                assert_eq!(tool, "convert");
                assert_eq!(args[0], input.display().to_string());
                assert!(args[3].ends_with("out.png"));
                assert!(output.is_none());
            }
            other => panic!("expected a single TransformFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_transform_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let convert = write_script(dir.path(), "convert", "exec sleep 10");
        let descriptor = StubDescriptor::new("http://example.com/a.png", None, "10x10");
        let events = RecordingEvents::default();

        let err = transform(
            &registry(None, Some(&convert)),
            &dir.path().join("in"),
            &dir.path().join("out"),
            &descriptor,
            Duration::from_millis(200),
            &events,
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(
            events.records().last(),
            Some(Record::TransformFailed { output: None, .. })
        ));
    }
}
