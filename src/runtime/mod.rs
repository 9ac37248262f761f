use std::env;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{HttpFetcher, RodioOutput, StemFetcher, spawn_loader};
use crate::engine::{EngineOptions, PlaybackEngine, TrackSession};
use crate::service::SeparationClient;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    logging::init(&settings.logging, settings.log_path().as_deref());

    let args = match startup::parse_args(env::args().skip(1)) {
        Ok(startup::Launch::Play(args)) => args,
        Ok(startup::Launch::Help) => {
            println!("{}", startup::USAGE);
            return Ok(());
        }
        Ok(startup::Launch::List) => {
            let client = SeparationClient::new(&settings.service)?;
            startup::list_processed(&client)?;
            return Ok(());
        }
        Err(msg) => {
            eprintln!("stemdeck: {msg}\n{}", startup::USAGE);
            return Err(msg.into());
        }
    };

    let client = SeparationClient::new(&settings.service)?;
    if args.process {
        startup::process_job(&client, &args, &settings.service)?;
    }

    let output = RodioOutput::open_default()?;
    let mut engine = PlaybackEngine::new(
        output,
        EngineOptions {
            schedule_lead: settings.playback.schedule_lead(),
            default_volume: settings.playback.default_volume,
        },
    );

    let session = TrackSession::new(
        args.source_id.clone(),
        args.title.clone(),
        settings.stems.names.clone(),
    );
    let request = engine.open_session(session, |stem| client.stem_url(&args.source_id, stem));
    let fetcher: Arc<dyn StemFetcher> = Arc::new(HttpFetcher::new(settings.service.request_timeout()));
    let loads = spawn_loader(request, fetcher);

    let mut app = App::new();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut engine, loads);

    engine.close_session();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    log::info!("stemdeck exiting");
    run_result
}
