use myshell::cli::{Args, Invocation};
use myshell::{Interpreter, error};
use std::io;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("MYSHELL_LOG", "off")).init();
    std::process::exit(run());
}

/// Bootstrap the interpreter and return the process exit status.
fn run() -> i32 {
    let mut stdout = io::stdout();
    let argv: Vec<String> = std::env::args().collect();
    let command_name = argv.first().map(String::as_str).unwrap_or("myshell");
    let rest: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();

    let args = match Args::parse(command_name, &rest) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Help(text)) => {
            println!("{text}");
            return 0;
        }
        Err(e) => {
            let _ = error::report(&mut stdout, &e);
            return 1;
        }
    };

    let source = match args.open_source() {
        Ok(source) => source,
        Err(e) => {
            let _ = error::report(&mut stdout, &e);
            return 1;
        }
    };

    let mut sh = Interpreter::with_batch_mode(args.batch_mode());
    match sh.run(source, &mut stdout) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("interpreter stopped: {e:#}");
            1
        }
    }
}
