use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use log::error;

use sdof_io::load_json;
use sdof_worker::{
    BilinearMaterial, ExecutionContext, LockFiles, ProgressMessage, WorkItem, progress_channel,
    run_batch, run_item,
};

fn usage() {
    eprintln!("usage: sdof-worker run <item.json>");
    eprintln!("       sdof-worker batch <items.json> [threads]");
}

enum Command {
    Run(String),
    Batch(String, Option<usize>),
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args {
        [_, cmd, path] if cmd == "run" => Some(Command::Run(path.clone())),
        [_, cmd, path] if cmd == "batch" => Some(Command::Batch(path.clone(), None)),
        [_, cmd, path, threads] if cmd == "batch" => threads
            .parse()
            .ok()
            .map(|threads| Command::Batch(path.clone(), Some(threads))),
        _ => None,
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = parse_args(&args) else {
        usage();
        return ExitCode::from(2);
    };

    let (progress, messages) = progress_channel();
    // Progress goes to stdout as JSON lines; logs go to stderr
    let printer = thread::spawn(move || {
        let mut fatal_seen = false;
        let stdout = io::stdout();
        for message in messages {
            fatal_seen |= matches!(message, ProgressMessage::Fatal { .. });
            match message.to_json_line() {
                Ok(line) => {
                    let mut out = stdout.lock();
                    if writeln!(out, "{line}").and_then(|()| out.flush()).is_err() {
                        break;
                    }
                }
                Err(err) => error!("could not encode progress message: {err}"),
            }
        }
        fatal_seen
    });

    let ctx = ExecutionContext::builder(progress, Arc::new(BilinearMaterial))
        .lock(Arc::new(LockFiles::default()))
        .build();

    let loaded = match &command {
        Command::Run(path) => load_json::<WorkItem>(path).map(|item| {
            run_item(&item, &ctx);
        }),
        Command::Batch(path, threads) => load_json::<Vec<WorkItem>>(path).map(|items| {
            if let Err(err) = run_batch(&items, &ctx, *threads) {
                ctx.progress.send(ProgressMessage::Fatal {
                    error: err.to_string(),
                    trace: sdof_worker::format_trace(&err),
                });
            }
        }),
    };
    drop(ctx);

    let fatal_seen = printer.join().unwrap_or(true);
    match loaded {
        Err(err) => {
            eprintln!("could not read work items: {err}");
            ExitCode::from(1)
        }
        Ok(()) if fatal_seen => ExitCode::from(1),
        Ok(()) => ExitCode::SUCCESS,
    }
}
