
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

pub mod assembler;
pub mod language;
pub mod output;
pub mod syntax;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use output::Format;
use syntax::cursor::Diagnostic;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tLanguage: {}\n\tFormat: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            3 | _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("language"),
        args.value_of("format").unwrap_or("binary"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("None")
    );

    // INPUT is required, clap has already exited if it is missing.
    let ifile = args.value_of("INPUT").unwrap_or_default();
    let ipath = Path::new(ifile);

    let source = match fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(source) => source,
    };

    if args.is_present("language") {
        let parsed = language::parser::Parser::new(&source).run();
        // The tree holds whatever parsed before the first failure.
        if args.is_present("print-debug") {
            println!("{:#?}", parsed.program);
        }
        report(&parsed.diagnostics, "parsing");
        return;
    }

    let program = assembler::parser::Assembler::new(&source).run();
    report(&program.diagnostics, "assembly");

    let words = match program.words() {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(words) => words,
    };
    info!("assembled {} instruction(s)", words.len());

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        for (idx, (command, word)) in program.commands.iter().zip(words.iter()).enumerate() {
            grid.add(Cell::from(format!("0x{:02X}:", idx)));
            grid.add(Cell::from(format!("{}", command.operation)));
            grid.add(Cell::from("=>".to_string()));
            grid.add(Cell::from(format!("{:012b}", word)));
        }

        println!("{}", grid.fit_into_columns(4));
    }

    // clap only admits the known format names.
    let format = args.value_of("format")
        .and_then(|name| name.parse::<Format>().ok())
        .unwrap_or(Format::Binary);

    let opath = match args.value_of("output") {
        Some(filename) => Path::new(filename).to_path_buf(),
        None => Path::new(ipath.file_stem().unwrap_or_default()).to_path_buf(),
    };

    let mut ofile = match File::create(&opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    if let Err(err) = ofile.write_all(&output::render(format, &program.commands, &words)) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
}

/// Logs every diagnostic and exits if there were any.
fn report(diagnostics: &[Diagnostic], stage: &str) {
    for diagnostic in diagnostics {
        error!("{}", diagnostic);
    }
    if !diagnostics.is_empty() {
        error!("Stopped {} due to {} error(s).", stage, diagnostics.len());
        std::process::exit(1);
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("blockasm"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile"))
        .arg(Arg::with_name("format")
            .short("f")
            .takes_value(true)
            .possible_values(&Format::NAMES)
            .default_value("binary")
            .help("the output format"))
        .arg(Arg::with_name("language")
            .short("l")
            .long("language")
            .takes_value(false)
            .help("parse the input as the high-level language instead of assembly"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the debug information alongside the assembly to STDOUT"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 | _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stderr())
        .apply().ok();
}
