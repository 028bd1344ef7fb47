// crepl: an incremental C REPL driving the system toolchain

use std::process;

use crepl::opts::{self, Parsed};
use crepl::repl::{self, Session};

fn main() {
    let mut args = std::env::args();
    let _argv0 = args.next();

    let cfg = match opts::parse_args(args) {
        Ok(Parsed::Help) => {
            print!("{}", opts::USAGE);
            return;
        }
        Ok(Parsed::Version) => {
            println!("{}", opts::VERSION);
            return;
        }
        Ok(Parsed::Run(cfg)) => cfg,
        Err(msg) => {
            eprintln!("crepl: {}", msg);
            eprintln!();
            eprint!("{}", opts::USAGE);
            process::exit(1);
        }
    };

    if let Some(expr) = cfg.eval_expr.clone() {
        if let Err(e) = repl::eval_once(&expr, &cfg) {
            eprintln!("crepl: {}", e);
            process::exit(1);
        }
        return;
    }

    let mut session = match Session::new(cfg) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("crepl: {}", e);
            process::exit(1);
        }
    };

    match session.run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("crepl: {}", e);
            process::exit(1);
        }
    }
}
