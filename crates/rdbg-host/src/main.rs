//
// main.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// Demonstration host: an in-process application that embeds the engine
// the way a real host would call `DebugServerExports.cpp::InitDebugger`,
// except the "application" here is just a synthetic script (`demo.rs`)
// instead of a real scripting runtime. Command-line handling follows the
// teacher's hand-rolled argv loop rather than a CLI-parsing crate, since
// the surface is this small.
//

mod config;
mod demo;

use std::sync::Arc;

use config::AdapterConfig;
use log::{error, info};
use rdbg_core::Engine;
use rdbg_testkit::ScriptedRuntime;

fn print_usage() {
    println!("rdbg-host {}, a demonstration host for the rdbg debug engine.", env!("CARGO_PKG_VERSION"));
    println!(
        r#"
Usage: rdbg-host [OPTIONS]

Available options:

--config CONFIG          Adapter config string, e.g. "rdip port=1234 wait"
                         or "console". Defaults to "rdip port=1234".
--help                   Print this help message
"#
    );
}

/// Mirrors the engine's one external configuration surface: parses
/// `config` and starts the matching adapter against `runtime`.
/// The caller is responsible for keeping the returned `Engine` alive for
/// as long as the adapter should keep running -- a real host would hand
/// it to whatever registry owns embedded subsystems; here, `main` just
/// holds onto it until the process exits.
fn init_debugger(config: &str, runtime: Arc<dyn rdbg_core::ScriptRuntime>) -> Option<Arc<Engine>> {
    let parsed = config::parse(config).or_else(|| {
        error!("unrecognized debugger config string: {config:?}");
        None
    })?;

    match parsed {
        AdapterConfig::Console => {
            let settings_path = rdbg_console::default_settings_path();
            info!("starting console adapter (settings at {})", settings_path.display());
            Some(rdbg_console::start(runtime, Some(settings_path)))
        },
        AdapterConfig::Rdip { port, wait } => match rdbg_rdip::start(port, runtime, None, wait) {
            Ok(engine) => {
                info!("rdip adapter listening on port {port}");
                Some(engine)
            },
            Err(err) => {
                error!("failed to start rdip adapter on port {port}: {err}");
                None
            },
        },
    }
}

fn main() {
    env_logger::init();

    let mut argv = std::env::args();
    argv.next();

    let mut config_string = format!("rdip port={}", config::DEFAULT_RDIP_PORT);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--config" => match argv.next() {
                Some(value) => config_string = value,
                None => {
                    eprintln!("A config string must be specified with the --config argument.");
                    return;
                },
            },
            "--help" => {
                print_usage();
                return;
            },
            other => {
                eprintln!("Argument '{other}' unknown");
                print_usage();
                return;
            },
        }
    }

    let runtime = ScriptedRuntime::new();
    let demo_thread = demo::spawn(runtime.clone());

    let Some(engine) = init_debugger(&config_string, runtime) else {
        std::process::exit(1);
    };

    // The demo script runs forever; joining it keeps both this process
    // and `engine` (which the join keeps in scope) alive for the life of
    // the adapter.
    let _ = demo_thread.join();
    drop(engine);
}
