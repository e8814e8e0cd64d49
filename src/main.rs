// main.rs - interactive Forth REPL

use bellows::{Vm, VmState};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();
    println!("bellows forth v{}", env!("CARGO_PKG_VERSION"));
    println!("Type WORDS for the dictionary, BYE to exit");
    println!();

    let mut vm = Vm::new();
    vm.set_loader(|path| fs::read_to_string(path).ok());

    // Scripts named on the command line run before the prompt comes up.
    let args: Vec<String> = env::args().collect();
    for path in args.iter().skip(1) {
        run_line(&mut vm, &format!("s\" {path}\" INCLUDED"));
        if vm.bye() {
            return Ok(());
        }
    }

    let mut rl = DefaultEditor::new()?;
    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".bellows_history");
        p
    });
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if vm.compiling() { "... " } else { "" };
        match rl.readline(prompt) {
            Ok(line) => {
                let input = line.trim_end();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);
                run_line(&mut vm, input);
                if vm.bye() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
    Ok(())
}

/// Feed one line to the VM and service its yields: re-enter on a time
/// slice, read a single character on a KEY request.
fn run_line(vm: &mut Vm, line: &str) {
    let mut hook = |_chan: i32, text: &str| {
        print!("{text}");
        let _ = io::stdout().flush();
    };
    let mut yielded = vm.forth_vm(Some(line), &mut hook);
    while yielded {
        if vm.state() == VmState::Io {
            if let Some(c) = read_key() {
                let _ = vm.feed_key(c);
            }
        }
        yielded = vm.forth_vm(None, &mut hook);
    }
}

fn read_key() -> Option<char> {
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf).ok()?;
    buf.chars().next()
}
