use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use blueprint_core::{
    hackathon_folder, update, AppState, AppViewModel, LoadPhase, Msg, Outcome, RequestPhase,
    StreamKind,
};
use blueprint_engine::{
    export_breakdown, export_similarity_report, ApiClient, AtomicFileWriter, EngineHandle,
    ReqwestApiClient,
};
use chrono::{SecondsFormat, Utc};
use engine_logging::{engine_info, engine_warn};

use super::effects::EffectRunner;
use super::persistence::{load_memory, save_memory};
use super::ui::render::{
    render_breakdown, render_ideas, render_stream_summary, render_stream_updates, StreamCursor,
};
use crate::cli::{Cli, Command};

const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command.clone() {
        Command::Generate { hackathon_url } => run_generate(&cli, hackathon_url),
        Command::Check { devpost_url, save } => run_check(&cli, devpost_url, save),
        Command::Ideas { ideas_file } => run_ideas(&cli, ideas_file),
        Command::Breakdown {
            number,
            ideas_file,
            save,
        } => run_breakdown(&cli, number, ideas_file, save),
        Command::Health => run_health(&cli),
    }
}

/// Owns the state machine and drives it from one thread: messages in,
/// effects out to the engine, rendered lines to stdout.
struct Session {
    state: AppState,
    runner: EffectRunner,
    msg_tx: mpsc::Sender<Msg>,
    msg_rx: mpsc::Receiver<Msg>,
    cursor: Option<(StreamKind, StreamCursor)>,
}

impl Session {
    fn new(cli: &Cli) -> Result<Self> {
        let engine = EngineHandle::new(cli.client_settings())
            .map_err(|err| anyhow!("cannot use API at {}: {err}", cli.api_url))?;
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(engine, msg_tx.clone());
        Ok(Self {
            state: AppState::new(),
            runner,
            msg_tx,
            msg_rx,
            cursor: None,
        })
    }

    /// Prints incremental progress for `kind` after every state change.
    fn follow_stream(&mut self, kind: StreamKind) {
        self.cursor = Some((kind, StreamCursor::default()));
    }

    /// Cancels the `kind` stream on Ctrl-C instead of killing the process.
    fn cancel_on_interrupt(&self, kind: StreamKind) {
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_warn!("Ctrl-C handler unavailable: {}", err);
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    engine_info!("Interrupted; cancelling {:?}", kind);
                    let _ = msg_tx.send(Msg::CancelClicked(kind));
                }
            });
        });
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);

        if self.state.consume_dirty() {
            self.render();
        }
    }

    fn render(&mut self) {
        if let Some((kind, cursor)) = self.cursor.as_mut() {
            let view = self.state.view();
            for line in render_stream_updates(cursor, view.stream(*kind)) {
                println!("{line}");
            }
        }
    }

    /// Dispatches `msg`, then keeps dispatching until `settled` holds.
    fn run_until(&mut self, msg: Msg, settled: impl Fn(&AppViewModel) -> bool) -> AppViewModel {
        self.dispatch(msg);
        loop {
            let view = self.state.view();
            if settled(&view) {
                return view;
            }
            match self.msg_rx.recv_timeout(TICK_INTERVAL) {
                Ok(msg) => self.dispatch(msg),
                Err(mpsc::RecvTimeoutError::Timeout) => self.dispatch(Msg::Tick),
                Err(mpsc::RecvTimeoutError::Disconnected) => return view,
            }
        }
    }

    fn run_stream(&mut self, kind: StreamKind, msg: Msg) -> AppViewModel {
        self.follow_stream(kind);
        self.cancel_on_interrupt(kind);
        self.run_until(msg, |view| stream_settled(view, kind))
    }

    fn load_ideas(&mut self, ideas_file: String) -> AppViewModel {
        self.run_until(Msg::IdeasRequested(ideas_file), |view| {
            matches!(view.ideas.phase, LoadPhase::Ready | LoadPhase::Failed)
        })
    }
}

fn stream_settled(view: &AppViewModel, kind: StreamKind) -> bool {
    let stream = view.stream(kind);
    stream.phase.is_settled()
        || (stream.phase == RequestPhase::Idle && stream.input_error.is_some())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

fn run_generate(cli: &Cli, hackathon_url: Option<String>) -> Result<ExitCode> {
    let hackathon_url = resolve_hackathon_url(cli, hackathon_url)?;
    let mut session = Session::new(cli)?;
    let view = session.run_stream(
        StreamKind::IdeaGeneration,
        Msg::GenerateSubmitted(hackathon_url),
    );
    let generation = &view.generation;
    print_lines(render_stream_summary(generation));

    if let Some(Outcome::Ideas(result)) = &generation.outcome {
        let mut memory = load_memory(&cli.output_dir);
        memory.last_hackathon_url = generation.target_url.clone();
        memory.last_ideas_file = Some(result.ideas_file.clone());
        save_memory(&cli.output_dir, &memory);
    }
    Ok(exit_code(generation.phase == RequestPhase::Completed))
}

fn run_check(cli: &Cli, devpost_url: String, save: bool) -> Result<ExitCode> {
    let mut session = Session::new(cli)?;
    let view = session.run_stream(
        StreamKind::SimilarityCheck,
        Msg::SimilaritySubmitted(devpost_url),
    );
    let similarity = &view.similarity;
    print_lines(render_stream_summary(similarity));

    if save {
        match (&similarity.outcome, &similarity.target_url) {
            (Some(Outcome::Similarity(report)), Some(target_url)) => {
                let writer = AtomicFileWriter::new(&cli.output_dir);
                let generated_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
                let candidates = similarity.candidates.iter().map(|row| &row.candidate).collect();
                let path = export_similarity_report(
                    &writer,
                    target_url,
                    report,
                    candidates,
                    &generated_utc,
                )
                .context("failed to save similarity report")?;
                println!("Report saved to {}", path.display());
            }
            _ => println!("No finished report to save."),
        }
    }
    Ok(exit_code(similarity.phase == RequestPhase::Completed))
}

fn resolve_hackathon_url(cli: &Cli, hackathon_url: Option<String>) -> Result<String> {
    if let Some(url) = hackathon_url {
        return Ok(url);
    }
    match load_memory(&cli.output_dir).last_hackathon_url {
        Some(url) => {
            println!("Using last hackathon: {url}");
            Ok(url)
        }
        None => bail!("no hackathon url given and none remembered"),
    }
}

fn resolve_ideas_file(cli: &Cli, ideas_file: Option<String>) -> Result<String> {
    if let Some(file) = ideas_file {
        return Ok(file);
    }
    match load_memory(&cli.output_dir).last_ideas_file {
        Some(file) => Ok(file),
        None => bail!("no ideas file given and none remembered; run `blueprint generate` first"),
    }
}

fn run_ideas(cli: &Cli, ideas_file: Option<String>) -> Result<ExitCode> {
    let ideas_file = resolve_ideas_file(cli, ideas_file)?;
    let mut session = Session::new(cli)?;
    let view = session.load_ideas(ideas_file.clone());
    print_lines(render_ideas(&view.ideas));

    let loaded = view.ideas.phase == LoadPhase::Ready;
    if loaded {
        let mut memory = load_memory(&cli.output_dir);
        memory.last_ideas_file = Some(ideas_file);
        save_memory(&cli.output_dir, &memory);
    }
    Ok(exit_code(loaded))
}

fn run_breakdown(
    cli: &Cli,
    number: u32,
    ideas_file: Option<String>,
    save: bool,
) -> Result<ExitCode> {
    let ideas_file = resolve_ideas_file(cli, ideas_file)?;
    let mut session = Session::new(cli)?;
    let view = session.load_ideas(ideas_file.clone());
    if view.ideas.phase != LoadPhase::Ready {
        print_lines(render_ideas(&view.ideas));
        return Ok(ExitCode::FAILURE);
    }

    println!("Generating implementation guide for idea {number}...");
    let view = session.run_until(Msg::IdeaSelected(number), |view| {
        matches!(view.breakdown.phase, LoadPhase::Ready | LoadPhase::Failed)
    });
    let breakdown = &view.breakdown;
    print_lines(render_breakdown(breakdown));

    if save {
        if let (Some(idea), Some(markdown)) = (&breakdown.idea, &breakdown.markdown) {
            let writer = AtomicFileWriter::new(&cli.output_dir);
            let path = export_breakdown(&writer, &hackathon_folder(&ideas_file), idea, markdown)
                .context("failed to save implementation guide")?;
            println!("Guide saved to {}", path.display());
        }
    }
    Ok(exit_code(breakdown.phase == LoadPhase::Ready))
}

fn run_health(cli: &Cli) -> Result<ExitCode> {
    let client = ReqwestApiClient::new(cli.client_settings())
        .map_err(|err| anyhow!("cannot use API at {}: {err}", cli.api_url))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    match runtime.block_on(client.health()) {
        Ok(health) => {
            println!("{}: {}", health.status, health.message);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("API at {} is unreachable: {err}", cli.api_url);
            Ok(ExitCode::FAILURE)
        }
    }
}
