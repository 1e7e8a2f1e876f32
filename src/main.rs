use clap::Parser;
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use flowdash::{fragment, App, AppConfig, AppEvent, Args, FlowBackend, HttpBackend};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    args: &Args,
    config: AppConfig,
    backend: Arc<dyn FlowBackend>,
) -> Result<()> {
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new(tx.clone(), config, backend)?;
    if args.debug {
        app.enable_debug();
    }
    render(&mut terminal, &mut app)?;
    tx.send(app.start(args.location.as_deref().unwrap_or_default()))?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Mouse(mouse) => tx.send(AppEvent::Mouse(mouse))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let mut updated = false;
        // Drain everything queued, including results from fetch threads
        loop {
            match rx.recv_timeout(Duration::from_millis(0)) {
                Ok(AppEvent::Exit) => return Ok(()),
                Ok(AppEvent::Crash(msg)) => return Err(color_eyre::eyre::eyre!(msg)),
                Ok(event) => {
                    if let Some(event) = app.event(&event) {
                        tx.send(event)?;
                    }
                    updated = true;
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => break,
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match flowdash::CacheManager::new(flowdash::APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.generate_config {
        let manager = flowdash::ConfigManager::new(flowdash::APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.print_fragment {
        let location = args.location.as_deref().unwrap_or_default();
        let state = fragment::decode(fragment::fragment_from_location(location));
        println!("#{}", fragment::encode(&state));
        return Ok(Some(()));
    }

    Ok(None)
}

/// Config file, then command-line overrides.
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(flowdash::APP_NAME)?;
    if let Some(endpoint) = &args.endpoint {
        config.backend.base_url = endpoint.clone();
    }
    if let Some(level) = &args.log_level {
        config.debug.log_level = level.clone();
    }
    if args.debug {
        config.debug.enabled = true;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = load_config(&args)?;

    // Logging is best effort; the dashboard works without a log file
    if let Ok(cache) = flowdash::CacheManager::new(flowdash::APP_NAME) {
        if let Err(e) = flowdash::logging::init(&cache, &config.debug.log_level) {
            eprintln!("Warning: {}", e);
        }
    }

    let backend: Arc<dyn FlowBackend> = Arc::new(HttpBackend::from_config(&config.backend));

    if let Some(path) = &args.export {
        let location = args.location.as_deref().unwrap_or_default();
        flowdash::export_chart(
            backend.as_ref(),
            fragment::fragment_from_location(location),
            path,
            &config,
        )?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
    let result = run(terminal, &args, config, backend);
    let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
