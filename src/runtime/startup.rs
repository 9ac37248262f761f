use crate::config;
use crate::service::{JobStatus, ProcessRequest, SeparationClient, ServiceError, wait_for_job};

pub const USAGE: &str = "\
usage: stemdeck <source-id> [title] [--process] [--duration <ISO-8601>]
       stemdeck --list

  --process     submit the track for separation and wait for its stems
  --duration    duration sent with --process (default PT0S)
  --list        list tracks whose stems are ready";

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchArgs {
    pub source_id: String,
    pub title: String,
    pub process: bool,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Launch {
    Play(LaunchArgs),
    List,
    Help,
}

/// Parse command-line arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<Launch, String>
where
    I: IntoIterator<Item = String>,
{
    let mut positional = Vec::new();
    let mut process = false;
    let mut duration = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Launch::Help),
            "--list" => return Ok(Launch::List),
            "--process" => process = true,
            "--duration" => {
                duration = Some(args.next().ok_or("--duration needs a value")?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let source_id = positional.next().ok_or("missing <source-id>")?;
    let title = positional.next().unwrap_or_else(|| source_id.clone());
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }

    Ok(Launch::Play(LaunchArgs {
        source_id,
        title,
        process,
        duration: duration.unwrap_or_else(|| "PT0S".to_string()),
    }))
}

/// Submit `args` for separation and block until its stems are ready,
/// printing each status change.
pub fn process_job(
    client: &SeparationClient,
    args: &LaunchArgs,
    settings: &config::ServiceSettings,
) -> Result<(), ServiceError> {
    client.submit(&ProcessRequest {
        video_id: args.source_id.clone(),
        video_title: args.title.clone(),
        duration: args.duration.clone(),
    })?;

    let mut last = None;
    wait_for_job(
        client,
        &args.source_id,
        settings.poll_interval(),
        settings.job_timeout(),
        |status: JobStatus| {
            if last != Some(status) {
                println!("{}: {status}", args.source_id);
                last = Some(status);
            }
        },
    )
}

pub fn list_processed(client: &SeparationClient) -> Result<(), ServiceError> {
    let tracks = client.processed_tracks()?;
    if tracks.is_empty() {
        println!("no processed tracks");
    }
    for t in tracks {
        println!("{}\t{}", t.video_id, t.video_title);
    }
    Ok(())
}
